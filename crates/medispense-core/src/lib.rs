pub mod constants;
pub mod error;
pub mod medicine;
pub mod records;
pub mod types;

pub use error::{Error, Result};
pub use medicine::{Medicine, Slot, StockLevel};
pub use records::{DispensingLogEntry, Medication, PatientProfile, Visit};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
