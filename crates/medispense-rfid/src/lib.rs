//! RFID card scanning over a serial link.
//!
//! The kiosk and the doctor portal both identify patients by presenting a
//! card to a reader on a serial line. This crate runs one scan at a time
//! over a shared transport and reports the card identifier, a cancellation,
//! or an error.
//!
//! - [`frame`]: sentinel-based identifier extraction from a byte stream
//! - [`profile`]: trigger, frame format and timeout per front-end
//! - [`session`]: the exclusive, cancellable scan session
//!
//! # Example
//!
//! ```
//! use medispense_hardware::{SerialConfig, SharedTransport};
//! use medispense_hardware::mock::MockTransport;
//! use medispense_rfid::{ScanError, ScanProfile, ScanResult, Scanner};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (transport, _device) = MockTransport::new();
//! let scanner = Scanner::new(
//!     SharedTransport::new(transport, SerialConfig::default()),
//!     ScanProfile::portal(),
//! );
//!
//! let first = scanner.start().await.unwrap();
//! assert!(matches!(scanner.start().await, Err(ScanError::TransportBusy(_))));
//!
//! first.cancel();
//! assert_eq!(first.wait().await, ScanResult::Cancelled);
//! # }
//! ```

pub mod error;
pub mod frame;
pub mod profile;
pub mod session;

pub use error::{Result, ScanError};
pub use frame::{FrameExtractor, FrameFormat};
pub use profile::ScanProfile;
pub use session::{ScanCanceller, ScanHandle, ScanResult, Scanner, SessionState};
