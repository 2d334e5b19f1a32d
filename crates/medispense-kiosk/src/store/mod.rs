//! Document store seam.
//!
//! Patient records, prescriptions, machine status and dispensing logs live
//! in an external document database. The kiosk only needs the handful of
//! reads and writes below.
//!
//! ```text
//! consultations/{patientId}                 PatientProfile
//! consultations/{patientId}/visits/{date}   Visit
//! machines/{machineId}                      { status }
//! sensor/status                             { A..E: 0 | 1 }
//! logs/{date}                               { entries: [DispensingLogEntry] }
//! ```

#![allow(async_fn_in_trait)]

mod memory;

pub use memory::{InMemoryStore, PatientSeed, StoreSeed};

use medispense_core::{DispensingLogEntry, PatientProfile, Visit};
use medispense_protocol::{StockReport, StockSnapshot};

use crate::error::KioskResult;

/// Visit status written after a successful dispense.
pub const VISIT_DISPENSED: &str = "dispensed";

/// Access to the backend document store.
///
/// # Implementation Note
///
/// Uses native async trait methods (Edition 2024).
pub trait DocumentStore: Send + Sync {
    /// Static patient data, `None` if the patient is not registered.
    async fn patient_profile(&self, patient_id: &str) -> KioskResult<Option<PatientProfile>>;

    /// Dates of every recorded visit of a patient.
    async fn visit_dates(&self, patient_id: &str) -> KioskResult<Vec<String>>;

    /// One visit's prescription.
    async fn visit(&self, patient_id: &str, visit_date: &str) -> KioskResult<Option<Visit>>;

    /// Set a visit's status to `dispensed`. Returns `false` if the visit does not exist.
    async fn mark_visit_dispensed(&self, patient_id: &str, visit_date: &str) -> KioskResult<bool>;

    /// Append an entry to the log document of `log_date`, creating it if needed.
    async fn append_dispensing_log(
        &self,
        log_date: &str,
        entry: DispensingLogEntry,
    ) -> KioskResult<()>;

    /// Merge a sensor report into `sensor/status`. Returns the merged state.
    async fn update_sensor_status(&self, report: &StockReport) -> KioskResult<StockSnapshot>;

    /// Current `sensor/status`.
    async fn sensor_status(&self) -> KioskResult<StockSnapshot>;

    /// Reported status of a machine, `None` if unknown.
    async fn machine_status(&self, machine_id: &str) -> KioskResult<Option<String>>;

    /// Dispensing log entries of one day.
    async fn logs_for(&self, log_date: &str) -> KioskResult<Vec<DispensingLogEntry>>;
}
