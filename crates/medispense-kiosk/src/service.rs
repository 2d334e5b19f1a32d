//! Kiosk request handling.
//!
//! [`KioskService`] implements the three kiosk API calls on top of the card
//! scanner, the dispenser and the document store. Every call answers with a
//! `status`-tagged response; failures are reported in the response, never
//! as an `Err`.
//!
//! # Scan Classification
//!
//! 1. **Card read**: no card before the controller timeout → `error/timeout`
//! 2. **Admin**: configured admin card → `admin_success`
//! 3. **Patient lookup**: not registered → `error/unregistered`
//! 4. **Visits**: none on record → `error/no_prescriptions`
//! 5. **Success**: patient id plus visit dates
//!
//! # Dispense Flow
//!
//! Visit lookup, command built from the medications, controller exchange,
//! then bookkeeping: a dispensing log entry under today's date, the visit
//! marked `dispensed`, and the stock report merged into the sensor status.
//! Bookkeeping failures are logged and do not turn a completed dispense into
//! an error.

use chrono::Local;
use medispense_core::constants::{DEFAULT_ADMIN_ID, DEFAULT_MACHINE_ID};
use medispense_core::{CardId, DispensingLogEntry, Medicine};
use medispense_hardware::{SerialTransport, SharedTransport};
use medispense_protocol::{
    DispenseCommand, DispenseResponse, PrescriptionResponse, ScanErrorKind, ScanResponse,
    StockSnapshot, VisitRequest,
};
use medispense_rfid::{ScanError, ScanProfile, ScanResult, Scanner};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::dispense::{DispenseConfig, DispenseOutcome, Dispenser};
use crate::error::{KioskError, KioskResult};
use crate::messages::StatusMessages;
use crate::monitor::StockMonitor;
use crate::store::DocumentStore;

/// Kiosk settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// Cards that open the admin dashboard.
    pub admin_ids: Vec<CardId>,

    /// Machine this kiosk drives, as known to the document store.
    pub machine_id: String,

    /// Card scan settings.
    pub scan: ScanProfile,

    /// Dispense exchange settings.
    pub dispense: DispenseConfig,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            admin_ids: CardId::new(DEFAULT_ADMIN_ID).into_iter().collect(),
            machine_id: DEFAULT_MACHINE_ID.to_string(),
            scan: ScanProfile::kiosk(),
            dispense: DispenseConfig::default(),
        }
    }
}

impl KioskConfig {
    /// Check whether a card belongs to an administrator.
    pub fn is_admin(&self, id: &CardId) -> bool {
        self.admin_ids.iter().any(|admin| admin == id)
    }
}

/// Machine state for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineOverview {
    /// Machine id.
    pub machine_id: String,

    /// Reported status, `offline` if the machine never reported.
    pub status: String,

    /// Stock sensor state.
    pub stock: StockSnapshot,

    /// Medicines whose slot needs a refill.
    pub refill_needed: Vec<Medicine>,

    /// Dispensing log of the requested day.
    pub logs: Vec<DispensingLogEntry>,
}

/// Kiosk API implementation.
pub struct KioskService<S, T> {
    store: S,
    scanner: Scanner<T>,
    dispenser: Dispenser<T>,
    config: KioskConfig,
}

impl<S, T> KioskService<S, T>
where
    S: DocumentStore,
    T: SerialTransport + 'static,
{
    /// Create a service. Scans and dispenses share the controller link.
    pub fn new(store: S, transport: SharedTransport<T>, config: KioskConfig) -> Self {
        Self {
            scanner: Scanner::new(transport.clone(), config.scan.clone()),
            dispenser: Dispenser::new(transport, config.dispense.clone()),
            store,
            config,
        }
    }

    /// Document store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Kiosk settings.
    pub fn config(&self) -> &KioskConfig {
        &self.config
    }

    /// `POST /api/scan_id`: read a card and classify it.
    pub async fn scan_id(&self) -> ScanResponse {
        let id = match self.scanner.scan().await {
            ScanResult::Identifier(id) => id,
            ScanResult::Error(ScanError::FrameTimeout(_)) | ScanResult::Cancelled => {
                return ScanResponse::error(ScanErrorKind::Timeout, StatusMessages::SCAN_TIMEOUT);
            }
            ScanResult::Error(err) => {
                warn!(error = %err, "Card scan failed");
                return ScanResponse::failure(format!("Scan error: {err}"));
            }
        };

        match self.classify(&id).await {
            Ok(response) => response,
            Err(err) => {
                error!(card = %id, error = %err, "Patient lookup failed");
                ScanResponse::failure(format!("Scan error: {err}"))
            }
        }
    }

    async fn classify(&self, id: &CardId) -> KioskResult<ScanResponse> {
        if self.config.is_admin(id) {
            info!("Admin card scanned");
            return Ok(ScanResponse::AdminSuccess {
                message: StatusMessages::ADMIN_GRANTED.to_string(),
            });
        }

        if self.store.patient_profile(id.as_str()).await?.is_none() {
            info!(card = %id, "Unregistered card");
            return Ok(ScanResponse::error(
                ScanErrorKind::Unregistered,
                StatusMessages::UNREGISTERED,
            ));
        }

        let visit_dates = self.store.visit_dates(id.as_str()).await?;
        if visit_dates.is_empty() {
            return Ok(ScanResponse::error(
                ScanErrorKind::NoPrescriptions,
                StatusMessages::NO_PRESCRIPTIONS,
            ));
        }

        info!(patient_id = %id, visits = visit_dates.len(), "Patient identified");
        Ok(ScanResponse::Success {
            patient_id: id.to_string(),
            visit_dates,
        })
    }

    /// `GET /api/get_prescription_details`: patient profile and one visit.
    pub async fn prescription_details(&self, request: &VisitRequest) -> PrescriptionResponse {
        let Some((patient_id, visit_date)) = request.parts() else {
            return PrescriptionResponse::Error {
                message: StatusMessages::MISSING_VISIT_ARGS.to_string(),
            };
        };
        let visit_date = visit_date.trim();

        let lookup = async {
            let profile = self.store.patient_profile(patient_id).await?;
            let visit = self.store.visit(patient_id, visit_date).await?;
            KioskResult::Ok(profile.zip(visit))
        };

        match lookup.await {
            Ok(Some((patient_info, data))) => PrescriptionResponse::Success { patient_info, data },
            Ok(None) => PrescriptionResponse::Error {
                message: format!("Data not found for Patient {patient_id} on {visit_date}."),
            },
            Err(err) => {
                error!(patient_id, visit_date, error = %err, "Prescription lookup failed");
                PrescriptionResponse::Error {
                    message: "Internal server error fetching details.".to_string(),
                }
            }
        }
    }

    /// `POST /api/dispense`: dispense a visit's medication.
    pub async fn dispense(&self, request: &VisitRequest) -> DispenseResponse {
        let Some((patient_id, visit_date)) = request.parts() else {
            return DispenseResponse::Error {
                message: StatusMessages::MISSING_DISPENSE_ARGS.to_string(),
            };
        };
        let visit_date = visit_date.trim();

        match self.dispense_visit(patient_id, visit_date).await {
            Ok(outcome) => {
                self.record_dispense(patient_id, visit_date, &outcome).await;
                DispenseResponse::DispenseSuccess {
                    message: StatusMessages::DISPENSE_SUCCESS.to_string(),
                    fpga_command: outcome.command.to_string(),
                }
            }
            Err(err) => DispenseResponse::Error {
                message: dispense_error_message(&err),
            },
        }
    }

    async fn dispense_visit(&self, patient_id: &str, visit_date: &str) -> KioskResult<DispenseOutcome> {
        let visit = self
            .store
            .visit(patient_id, visit_date)
            .await?
            .ok_or_else(|| KioskError::visit_not_found(patient_id, visit_date))?;

        let command = DispenseCommand::from_medications(&visit.medications);
        debug!(patient_id, visit_date, command = %command, "Dispense command built");
        self.dispenser.dispense(command).await
    }

    async fn record_dispense(&self, patient_id: &str, visit_date: &str, outcome: &DispenseOutcome) {
        let now = Local::now();
        let entry = DispensingLogEntry::at(patient_id, visit_date, now);
        let log_date = DispensingLogEntry::log_date(now);

        if let Err(err) = self.store.append_dispensing_log(&log_date, entry).await {
            error!(patient_id, error = %err, "Dispensing log failed");
        }

        match self.store.mark_visit_dispensed(patient_id, visit_date).await {
            Ok(true) => {}
            Ok(false) => warn!(patient_id, visit_date, "Visit vanished before status update"),
            Err(err) => error!(patient_id, visit_date, error = %err, "Visit status update failed"),
        }

        if let Some(report) = &outcome.stock {
            match self.store.update_sensor_status(report).await {
                Ok(snapshot) => debug!(stock = %snapshot.to_bitmap(), "Sensor status updated"),
                Err(err) => error!(error = %err, "Sensor update failed"),
            }
        }
    }

    /// Machine status, stock and the dispensing log of `log_date`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn machine_overview(&self, log_date: &str) -> KioskResult<MachineOverview> {
        let status = self
            .store
            .machine_status(&self.config.machine_id)
            .await?
            .unwrap_or_else(|| "offline".to_string());
        let stock = self.store.sensor_status().await?;
        let logs = self.store.logs_for(log_date).await?;

        Ok(MachineOverview {
            machine_id: self.config.machine_id.clone(),
            status,
            refill_needed: stock
                .refill_needed()
                .into_iter()
                .map(|slot| slot.medicine())
                .collect(),
            stock,
            logs,
        })
    }

    /// Feed the stored stock state to `monitor`, returning new refill alerts.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn check_stock(&self, monitor: &mut StockMonitor) -> KioskResult<Vec<Medicine>> {
        let snapshot = self.store.sensor_status().await?;
        Ok(monitor.observe(snapshot))
    }
}

fn dispense_error_message(err: &KioskError) -> String {
    match err {
        KioskError::NotFound { .. } => StatusMessages::PRESCRIPTION_NOT_FOUND.to_string(),
        KioskError::Rejected(_) => StatusMessages::DISPENSER_REJECTED.to_string(),
        KioskError::DispenseTimeout { .. } => StatusMessages::DISPENSER_TIMEOUT.to_string(),
        KioskError::Hardware(err) => format!("UART Failure: {err}"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medispense_hardware::HardwareError;

    #[test]
    fn test_default_config() {
        let config = KioskConfig::default();
        assert!(config.is_admin(&CardId::new("e2fa4206").unwrap()));
        assert!(!config.is_admin(&CardId::new("ACC0176D").unwrap()));
        assert_eq!(config.machine_id, "MED-001");
        assert_eq!(config.scan, ScanProfile::kiosk());
    }

    #[test]
    fn test_config_from_json() {
        let config: KioskConfig =
            serde_json::from_str(r#"{"admin_ids": ["11111111", "22222222"]}"#).unwrap();
        assert_eq!(config.admin_ids.len(), 2);
        assert!(config.is_admin(&CardId::new("22222222").unwrap()));
        assert_eq!(config.dispense, DispenseConfig::default());
    }

    #[test]
    fn test_config_rejects_short_admin_id() {
        assert!(serde_json::from_str::<KioskConfig>(r#"{"admin_ids": ["123"]}"#).is_err());
    }

    #[test]
    fn test_dispense_error_messages() {
        assert_eq!(
            dispense_error_message(&KioskError::Rejected("ERR".into())),
            "FPGA returned ERR: Command rejected."
        );
        assert_eq!(
            dispense_error_message(&KioskError::DispenseTimeout { timeout_ms: 30_000 }),
            "Hardware Timeout: 'DONE' not received."
        );
        assert!(
            dispense_error_message(&KioskError::Hardware(HardwareError::busy("/dev/serial0")))
                .starts_with("UART Failure")
        );
    }
}
