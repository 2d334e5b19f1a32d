//! Shared fixtures for scan session tests.

#![allow(dead_code)]

use std::time::Duration;

use medispense_hardware::mock::{MockTransport, MockTransportHandle};
use medispense_hardware::{SerialConfig, SharedTransport};
use medispense_rfid::{ScanProfile, Scanner};

/// Read poll used by test transports. Short so cancellation is observed quickly.
pub const TEST_POLL_MS: u64 = 10;

/// Upper bound for anything a test waits on.
pub const TEST_DEADLINE: Duration = Duration::from_secs(5);

/// Serial config with a short read poll.
pub fn test_config() -> SerialConfig {
    SerialConfig {
        read_timeout_ms: TEST_POLL_MS,
        ..SerialConfig::new("/dev/ttyTEST0")
    }
}

/// Scanner over a fresh mock transport, plus the device-side handle.
pub fn scanner(profile: ScanProfile) -> (Scanner<MockTransport>, MockTransportHandle) {
    let (transport, device) = MockTransport::with_name("/dev/ttyTEST0");
    let shared = SharedTransport::new(transport, test_config());
    (Scanner::new(shared, profile), device)
}

/// Wait for the next write from the session, failing the test on timeout.
pub async fn expect_write(device: &mut MockTransportHandle) -> Vec<u8> {
    tokio::time::timeout(TEST_DEADLINE, device.next_write())
        .await
        .expect("timed out waiting for a write")
        .expect("transport dropped")
}
