//! Medispense kiosk backend.
//!
//! Ties the card scanner, the dispenser controller and the document store
//! together behind the three kiosk API calls.
//!
//! - [`service`]: `scan_id`, `get_prescription_details` and `dispense`
//! - [`dispense`]: the `MED:` / `DONE` / `STK:` exchange with the controller
//! - [`store`]: the document store seam and an in-memory implementation
//! - [`monitor`]: refill alerts from stock sensor updates
//!
//! # Example
//!
//! ```
//! use medispense_hardware::{SerialConfig, SharedTransport};
//! use medispense_hardware::mock::MockTransport;
//! use medispense_kiosk::{InMemoryStore, KioskConfig, KioskService};
//! use medispense_protocol::{DispenseResponse, VisitRequest};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (transport, _device) = MockTransport::new();
//! let service = KioskService::new(
//!     InMemoryStore::new(),
//!     SharedTransport::new(transport, SerialConfig::default()),
//!     KioskConfig::default(),
//! );
//!
//! let response = service.dispense(&VisitRequest::new("ACC0176D", "2025-12-01")).await;
//! assert_eq!(
//!     response,
//!     DispenseResponse::Error { message: "Prescription not found.".into() }
//! );
//! # }
//! ```

pub mod dispense;
pub mod error;
pub mod messages;
pub mod monitor;
pub mod service;
pub mod store;

pub use dispense::{DispenseConfig, DispenseOutcome, Dispenser};
pub use error::{KioskError, KioskResult};
pub use messages::StatusMessages;
pub use monitor::StockMonitor;
pub use service::{KioskConfig, KioskService, MachineOverview};
pub use store::{DocumentStore, InMemoryStore, PatientSeed, StoreSeed};
