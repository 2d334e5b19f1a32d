//! Serial transport layer for the Medispense card reader and dispenser.
//!
//! This crate provides a trait-based abstraction over the serial link that
//! connects the kiosk host to the RFID reader and the dispenser controller,
//! along with a real implementation (the `serialport` crate) and an
//! in-memory mock for development and tests.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous; blocking port
//!   calls run on Tokio's blocking pool.
//! - **Bounded reads**: A read returns after at most the configured read
//!   timeout, so sessions can check for cancellation between reads.
//! - **Exclusive binding**: [`SharedTransport`] lets exactly one session use
//!   the link at a time and frees it when the session's guard drops.
//! - **Error-aware**: All operations return `Result<T>` with
//!   [`HardwareError`] describing the failure.
//!
//! # Example
//!
//! ```no_run
//! use medispense_hardware::{SerialConfig, SharedTransport, SerialTransport};
//! use medispense_hardware::devices::AnyTransport;
//! use medispense_hardware::serial::SerialPortTransport;
//!
//! # async fn example() -> medispense_hardware::Result<()> {
//! let config = SerialConfig::new("/dev/ttyUSB0");
//! let port = AnyTransport::Serial(SerialPortTransport::new(&config.port));
//! let shared = SharedTransport::new(port, config);
//!
//! let mut guard = shared.try_acquire()?;
//! guard.ensure_open().await?;
//! guard.write_all(b"S").await?;
//! # Ok(())
//! # }
//! ```

pub mod devices;
pub mod error;
pub mod mock;
#[cfg(feature = "hardware-serial")]
pub mod serial;
pub mod shared;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::AnyTransport;
pub use error::{HardwareError, Result};
#[cfg(feature = "hardware-serial")]
pub use serial::SerialPortTransport;
pub use shared::{SharedTransport, TransportGuard};
pub use traits::SerialTransport;
pub use types::{PortInfo, SerialConfig};
