//! JSON contracts of the kiosk REST API.
//!
//! | Endpoint | Request | Response |
//! |---|---|---|
//! | `POST /api/scan_id` | none | [`ScanResponse`] |
//! | `GET /api/get_prescription_details` | [`VisitRequest`] (query) | [`PrescriptionResponse`] |
//! | `POST /api/dispense` | [`VisitRequest`] (body) | [`DispenseResponse`] |
//!
//! Every response carries a `status` discriminator.

use medispense_core::{PatientProfile, Visit};
use serde::{Deserialize, Serialize};

/// Why a scan did not yield a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanErrorKind {
    /// No card presented in time.
    Timeout,
    /// Card not linked to a patient.
    Unregistered,
    /// Patient has no visits on record.
    NoPrescriptions,
}

/// Response of `POST /api/scan_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanResponse {
    /// Patient identified.
    Success {
        patient_id: String,
        visit_dates: Vec<String>,
    },
    /// Administrator card.
    AdminSuccess { message: String },
    /// Scan or lookup failed.
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_type: Option<ScanErrorKind>,
    },
}

impl ScanResponse {
    /// Error response with a classified cause.
    pub fn error(kind: ScanErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            error_type: Some(kind),
        }
    }

    /// Error response without a classified cause.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            error_type: None,
        }
    }
}

/// Patient and visit date, sent as query string or JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VisitRequest {
    #[serde(default)]
    pub patient_id: Option<String>,

    #[serde(default)]
    pub visit_date: Option<String>,
}

impl VisitRequest {
    /// Request for the given patient and visit.
    pub fn new(patient_id: impl Into<String>, visit_date: impl Into<String>) -> Self {
        Self {
            patient_id: Some(patient_id.into()),
            visit_date: Some(visit_date.into()),
        }
    }

    /// Both fields, if present and non-blank.
    pub fn parts(&self) -> Option<(&str, &str)> {
        let patient_id = self.patient_id.as_deref().filter(|s| !s.trim().is_empty())?;
        let visit_date = self.visit_date.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((patient_id, visit_date))
    }
}

/// Response of `GET /api/get_prescription_details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PrescriptionResponse {
    /// Patient profile plus the requested visit.
    Success {
        patient_info: PatientProfile,
        data: Visit,
    },
    /// Missing arguments or no such record.
    Error { message: String },
}

/// Response of `POST /api/dispense`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispenseResponse {
    /// Medicine handed out.
    DispenseSuccess {
        message: String,
        fpga_command: String,
    },
    /// Dispense did not happen.
    Error { message: String },
}
