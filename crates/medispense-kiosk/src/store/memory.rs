//! In-memory document store.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use medispense_core::{DispensingLogEntry, PatientProfile, Visit};
use medispense_protocol::{StockReport, StockSnapshot};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::{DocumentStore, VISIT_DISPENSED};
use crate::error::KioskResult;

/// One patient document with its visits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientSeed {
    #[serde(flatten)]
    pub profile: PatientProfile,

    /// Visits keyed by date.
    #[serde(default)]
    pub visits: BTreeMap<String, Visit>,
}

/// Initial contents of an [`InMemoryStore`].
///
/// # Example
///
/// ```
/// use medispense_kiosk::store::StoreSeed;
///
/// let seed: StoreSeed = serde_json::from_str(r#"{
///     "consultations": {
///         "ACC0176D": {
///             "patientName": "Juan Dela Cruz",
///             "visits": {
///                 "2025-12-01": {
///                     "medications": [
///                         {"medicineName": "Paracetamol", "dosage": "500mg",
///                          "quantity": "2", "frequency": "3x daily"}
///                     ]
///                 }
///             }
///         }
///     },
///     "machines": {"MED-001": "online"}
/// }"#).unwrap();
///
/// assert_eq!(seed.consultations["ACC0176D"].visits.len(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSeed {
    /// Patients keyed by card identifier.
    pub consultations: HashMap<String, PatientSeed>,

    /// Machine status keyed by machine id.
    pub machines: HashMap<String, String>,

    /// Stock sensor state.
    pub sensor: StockSnapshot,

    /// Dispensing logs keyed by date.
    pub logs: BTreeMap<String, Vec<DispensingLogEntry>>,
}

/// Document store kept in process memory.
///
/// Used by tests and by the CLI's offline mode.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<StoreSeed>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the given contents.
    pub fn with_seed(seed: StoreSeed) -> Self {
        Self {
            data: RwLock::new(seed),
        }
    }

    /// Load a JSON seed file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid [`StoreSeed`].
    pub fn from_json_file(path: impl AsRef<Path>) -> KioskResult<Self> {
        let text = std::fs::read_to_string(path).map_err(medispense_core::Error::from)?;
        let seed: StoreSeed = serde_json::from_str(&text)?;
        debug!(patients = seed.consultations.len(), "Loaded store seed");
        Ok(Self::with_seed(seed))
    }

    /// Register a patient.
    pub async fn insert_patient(&self, patient_id: impl Into<String>, profile: PatientProfile) {
        let mut data = self.data.write().await;
        data.consultations.entry(patient_id.into()).or_default().profile = profile;
    }

    /// Record a visit, registering the patient if needed.
    pub async fn insert_visit(
        &self,
        patient_id: impl Into<String>,
        visit_date: impl Into<String>,
        visit: Visit,
    ) {
        let mut data = self.data.write().await;
        data.consultations
            .entry(patient_id.into())
            .or_default()
            .visits
            .insert(visit_date.into(), visit);
    }

    /// Set a machine's status.
    pub async fn set_machine_status(&self, machine_id: impl Into<String>, status: impl Into<String>) {
        let mut data = self.data.write().await;
        data.machines.insert(machine_id.into(), status.into());
    }

    /// Copy of the current contents.
    pub async fn snapshot(&self) -> StoreSeed {
        self.data.read().await.clone()
    }
}

impl DocumentStore for InMemoryStore {
    async fn patient_profile(&self, patient_id: &str) -> KioskResult<Option<PatientProfile>> {
        let data = self.data.read().await;
        Ok(data
            .consultations
            .get(patient_id)
            .map(|patient| patient.profile.clone()))
    }

    async fn visit_dates(&self, patient_id: &str) -> KioskResult<Vec<String>> {
        let data = self.data.read().await;
        Ok(data
            .consultations
            .get(patient_id)
            .map(|patient| patient.visits.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn visit(&self, patient_id: &str, visit_date: &str) -> KioskResult<Option<Visit>> {
        let data = self.data.read().await;
        Ok(data
            .consultations
            .get(patient_id)
            .and_then(|patient| patient.visits.get(visit_date))
            .cloned())
    }

    async fn mark_visit_dispensed(&self, patient_id: &str, visit_date: &str) -> KioskResult<bool> {
        let mut data = self.data.write().await;
        let visit = data
            .consultations
            .get_mut(patient_id)
            .and_then(|patient| patient.visits.get_mut(visit_date));

        Ok(match visit {
            Some(visit) => {
                visit.status = Some(VISIT_DISPENSED.to_string());
                true
            }
            None => false,
        })
    }

    async fn append_dispensing_log(
        &self,
        log_date: &str,
        entry: DispensingLogEntry,
    ) -> KioskResult<()> {
        let mut data = self.data.write().await;
        data.logs.entry(log_date.to_string()).or_default().push(entry);
        Ok(())
    }

    async fn update_sensor_status(&self, report: &StockReport) -> KioskResult<StockSnapshot> {
        let mut data = self.data.write().await;
        data.sensor.apply(report);
        Ok(data.sensor)
    }

    async fn sensor_status(&self) -> KioskResult<StockSnapshot> {
        Ok(self.data.read().await.sensor)
    }

    async fn machine_status(&self, machine_id: &str) -> KioskResult<Option<String>> {
        Ok(self.data.read().await.machines.get(machine_id).cloned())
    }

    async fn logs_for(&self, log_date: &str) -> KioskResult<Vec<DispensingLogEntry>> {
        Ok(self
            .data
            .read()
            .await
            .logs
            .get(log_date)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medispense_core::{Medication, Medicine, Slot};

    #[tokio::test]
    async fn test_patient_and_visits() {
        let store = InMemoryStore::new();
        assert!(store.patient_profile("ACC0176D").await.unwrap().is_none());

        store
            .insert_visit(
                "ACC0176D",
                "2025-12-02",
                Visit {
                    medications: vec![Medication::new(Medicine::Loperamide, 1, "as needed")],
                    ..Visit::default()
                },
            )
            .await;
        store.insert_visit("ACC0176D", "2025-12-01", Visit::default()).await;

        assert!(store.patient_profile("ACC0176D").await.unwrap().is_some());
        assert_eq!(
            store.visit_dates("ACC0176D").await.unwrap(),
            vec!["2025-12-01", "2025-12-02"]
        );
        let visit = store.visit("ACC0176D", "2025-12-02").await.unwrap().unwrap();
        assert_eq!(visit.medications.len(), 1);
        assert!(store.visit("ACC0176D", "2025-12-03").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_visit_dispensed() {
        let store = InMemoryStore::new();
        store.insert_visit("ACC0176D", "2025-12-01", Visit::default()).await;

        assert!(store.mark_visit_dispensed("ACC0176D", "2025-12-01").await.unwrap());
        assert!(!store.mark_visit_dispensed("ACC0176D", "2025-12-09").await.unwrap());

        let visit = store.visit("ACC0176D", "2025-12-01").await.unwrap().unwrap();
        assert_eq!(visit.status.as_deref(), Some("dispensed"));
    }

    #[tokio::test]
    async fn test_logs_append() {
        let store = InMemoryStore::new();
        let entry = DispensingLogEntry {
            patient_id: "ACC0176D".into(),
            timestamp: "10:15:00".into(),
            source_visit: "2025-12-01".into(),
        };
        store.append_dispensing_log("2025-12-05", entry.clone()).await.unwrap();
        store.append_dispensing_log("2025-12-05", entry.clone()).await.unwrap();

        assert_eq!(store.logs_for("2025-12-05").await.unwrap().len(), 2);
        assert!(store.logs_for("2025-12-06").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sensor_status_merges_partial_reports() {
        let store = InMemoryStore::new();
        store
            .update_sensor_status(&StockReport::parse("00001").unwrap())
            .await
            .unwrap();
        let merged = store
            .update_sensor_status(&StockReport::parse("1").unwrap())
            .await
            .unwrap();

        assert_eq!(merged.refill_needed(), vec![Slot::A, Slot::E]);
        assert_eq!(store.sensor_status().await.unwrap(), merged);
    }

    #[tokio::test]
    async fn test_machine_status() {
        let store = InMemoryStore::new();
        store.set_machine_status("MED-001", "online").await;
        assert_eq!(
            store.machine_status("MED-001").await.unwrap().as_deref(),
            Some("online")
        );
        assert!(store.machine_status("MED-002").await.unwrap().is_none());
    }

    #[test]
    fn test_seed_profile_is_flattened() {
        let seed: StoreSeed = serde_json::from_str(
            r#"{"consultations": {"ACC0176D": {"patientName": "Ana", "age": 41}}}"#,
        )
        .unwrap();
        let patient = &seed.consultations["ACC0176D"];
        assert_eq!(patient.profile.patient_name.as_deref(), Some("Ana"));
        assert_eq!(patient.profile.age, Some(41));
        assert!(patient.visits.is_empty());
    }
}
