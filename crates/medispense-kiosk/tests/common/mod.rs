//! Shared fixtures for kiosk service tests.

#![allow(dead_code)]

use std::time::Duration;

use medispense_core::{Medication, Medicine, PatientProfile, Visit};
use medispense_hardware::mock::{MockTransport, MockTransportHandle};
use medispense_hardware::{SerialConfig, SharedTransport};
use medispense_kiosk::{DispenseConfig, InMemoryStore, KioskConfig, KioskService};
use medispense_rfid::ScanProfile;

pub const PATIENT_ID: &str = "ACC0176D";
pub const VISIT_DATE: &str = "2025-12-01";

/// `PID:` frame carrying [`PATIENT_ID`].
pub const PATIENT_FRAME: &[u8] = b"PID:\xAC\xC0\x17\x6D";

/// `PID:` frame carrying the default admin card.
pub const ADMIN_FRAME: &[u8] = b"PID:\xE2\xFA\x42\x06";

/// Upper bound for anything a test waits on.
pub const TEST_DEADLINE: Duration = Duration::from_secs(5);

pub type TestService = KioskService<InMemoryStore, MockTransport>;

/// Config with timeouts short enough for tests that run into them.
pub fn test_config() -> KioskConfig {
    KioskConfig {
        scan: ScanProfile::kiosk().with_frame_timeout(Some(Duration::from_millis(100))),
        dispense: DispenseConfig {
            response_timeout_ms: 200,
        },
        ..KioskConfig::default()
    }
}

/// Visit prescribing two Paracetamol and one Ceterizine.
pub fn sample_visit() -> Visit {
    Visit {
        medications: vec![
            Medication::new(Medicine::Paracetamol, 2, "3x daily"),
            Medication::new(Medicine::Ceterizine, 1, "once at night"),
        ],
        ..Visit::default()
    }
}

pub fn sample_profile() -> PatientProfile {
    PatientProfile {
        patient_id: Some(PATIENT_ID.to_string()),
        patient_name: Some("Juan Dela Cruz".to_string()),
        ..PatientProfile::default()
    }
}

/// Service over a mock controller link and the given store.
pub fn service(store: InMemoryStore) -> (TestService, MockTransportHandle) {
    let (transport, device) = MockTransport::with_name("/dev/ttyKIOSK0");
    let config = SerialConfig {
        read_timeout_ms: 10,
        ..SerialConfig::new("/dev/ttyKIOSK0")
    };
    let service = KioskService::new(store, SharedTransport::new(transport, config), test_config());
    (service, device)
}

/// Store holding one patient with [`sample_visit`] on [`VISIT_DATE`].
pub async fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.insert_patient(PATIENT_ID, sample_profile()).await;
    store.insert_visit(PATIENT_ID, VISIT_DATE, sample_visit()).await;
    store
}

/// Wait for the next write from the kiosk, failing the test on timeout.
pub async fn expect_write(device: &mut MockTransportHandle) -> Vec<u8> {
    tokio::time::timeout(TEST_DEADLINE, device.next_write())
        .await
        .expect("timed out waiting for a write")
        .expect("transport dropped")
}
