use medispense_hardware::HardwareError;
use medispense_rfid::ScanError;
use thiserror::Error;

/// Errors raised by kiosk operations.
#[derive(Debug, Error)]
pub enum KioskError {
    /// Document store read or write failed
    #[error("Store error: {0}")]
    Store(String),

    /// Requested document does not exist
    #[error("Not found: {entity} {key}")]
    NotFound { entity: &'static str, key: String },

    /// Request is missing a required argument
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    /// Controller answered `ERR`
    #[error("Dispenser rejected command: {0}")]
    Rejected(String),

    /// Controller never confirmed the dispense
    #[error("Dispenser did not confirm within {timeout_ms}ms")]
    DispenseTimeout { timeout_ms: u64 },

    /// Serial link failure
    #[error(transparent)]
    Hardware(#[from] HardwareError),

    /// Card scan failure
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Malformed seed or record
    #[error(transparent)]
    Core(#[from] medispense_core::Error),

    /// JSON seed could not be parsed
    #[error("Invalid seed data: {0}")]
    Seed(#[from] serde_json::Error),
}

impl KioskError {
    /// Not-found error for a patient.
    pub fn patient_not_found(patient_id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "patient",
            key: patient_id.into(),
        }
    }

    /// Not-found error for a visit.
    pub fn visit_not_found(patient_id: &str, visit_date: &str) -> Self {
        Self::NotFound {
            entity: "visit",
            key: format!("{patient_id}/{visit_date}"),
        }
    }
}

/// Specialized result type for kiosk operations
pub type KioskResult<T> = Result<T, KioskError>;
