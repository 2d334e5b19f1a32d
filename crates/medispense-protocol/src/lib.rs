//! Wire protocol of the Medispense dispenser controller.
//!
//! - [`command`]: `START`, `MED:` and `END` host commands
//! - [`response`]: classification of controller lines
//! - [`stock`]: the `STK:` sensor bitmap and stock snapshots
//! - [`codec`]: line codec tying both directions together
//! - [`api`]: JSON contracts of the kiosk REST API

pub mod api;
pub mod codec;
pub mod command;
pub mod response;
pub mod stock;

pub use api::{DispenseResponse, PrescriptionResponse, ScanErrorKind, ScanResponse, VisitRequest};
pub use codec::DispenserCodec;
pub use command::{DispenseCommand, HostCommand};
pub use response::DeviceLine;
pub use stock::{BITMAP_ORDER, StockReport, StockSnapshot};
