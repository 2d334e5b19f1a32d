//! Document shapes exchanged with the backend document store.
//!
//! Field names follow the stored documents exactly, which is why some
//! records are camelCase and the dispensing log is snake_case.

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};

use crate::medicine::Medicine;

/// Static patient data stored on `consultations/{patientId}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PatientProfile {
    #[serde(rename = "patientID", default)]
    pub patient_id: Option<String>,

    #[serde(rename = "patientName", default)]
    pub patient_name: Option<String>,

    #[serde(default)]
    pub age: Option<u32>,

    #[serde(default)]
    pub gender: Option<String>,
}

/// One prescribed medication within a visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub medicine_name: String,

    #[serde(default)]
    pub dosage: String,

    /// Units to dispense. Stored documents carry either a number or a
    /// numeric string; anything unparseable counts as zero.
    #[serde(default, deserialize_with = "quantity_from_any")]
    pub quantity: u32,

    #[serde(default)]
    pub frequency: String,
}

impl Medication {
    /// Create a medication entry with the catalog's default dosage.
    pub fn new(medicine: Medicine, quantity: u32, frequency: impl Into<String>) -> Self {
        Self {
            medicine_name: medicine.name().to_string(),
            dosage: medicine.default_dosage().to_string(),
            quantity,
            frequency: frequency.into(),
        }
    }

    /// Resolve the catalog entry, if the name is a stocked medicine.
    #[must_use]
    pub fn medicine(&self) -> Option<Medicine> {
        Medicine::from_name(&self.medicine_name)
    }
}

fn quantity_from_any<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quantity {
        Number(u64),
        Float(f64),
        Text(String),
    }

    Ok(match Quantity::deserialize(deserializer)? {
        Quantity::Number(n) => u32::try_from(n).unwrap_or(u32::MAX),
        Quantity::Float(f) if f.is_finite() && f >= 0.0 => f.trunc().min(u32::MAX as f64) as u32,
        Quantity::Float(_) => 0,
        Quantity::Text(s) => s.trim().parse().unwrap_or(0),
    })
}

/// Prescription written during one visit, stored on
/// `consultations/{patientId}/visits/{date}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    #[serde(default)]
    pub medications: Vec<Medication>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,

    /// Set to `dispensed` once the kiosk has handed out the medication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Entry appended to `logs/{date}.entries` after a dispense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispensingLogEntry {
    pub patient_id: String,

    /// Local wall-clock time, `HH:MM:SS`.
    pub timestamp: String,

    /// Visit date the medication was prescribed on.
    pub source_visit: String,
}

impl DispensingLogEntry {
    /// Build an entry stamped with the given local time.
    pub fn at(
        patient_id: impl Into<String>,
        source_visit: impl Into<String>,
        at: DateTime<Local>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            timestamp: at.format("%H:%M:%S").to_string(),
            source_visit: source_visit.into(),
        }
    }

    /// Log document id (`YYYY-MM-DD`) for the given local time.
    #[must_use]
    pub fn log_date(at: DateTime<Local>) -> String {
        at.format("%Y-%m-%d").to_string()
    }
}
