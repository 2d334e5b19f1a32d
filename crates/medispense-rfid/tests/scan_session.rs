//! Integration tests for scan sessions over the mock transport.
//!
//! Covers the session lifecycle end to end:
//! 1. start → trigger → frame → identifier
//! 2. cancellation, busy rejection, open failures and link errors
//! 3. transport binding released on every terminal path

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{TEST_DEADLINE, expect_write, scanner};
use medispense_hardware::mock::OpenFailure;
use medispense_rfid::{ScanError, ScanProfile, ScanResult, SessionState};
use rstest::rstest;
use tokio::time::timeout;

// ============================================================================
// Successful scans
// ============================================================================

#[rstest]
#[case::junk_prefix("junkID: A1B2C3D4\r\n", "A1B2C3D4")]
#[case::lowercase("ID:deadbeef\n", "DEADBEEF")]
#[case::padded("ID:    0123456789abcdef   \r", "0123456789ABCDEF")]
#[case::short_token_first("ID: 123\nID: CAFEBABE\n", "CAFEBABE")]
#[tokio::test]
async fn test_portal_scan_emits_identifier(#[case] stream: &str, #[case] expected: &str) {
    let (scanner, mut device) = scanner(ScanProfile::portal());

    let handle = scanner.start().await.unwrap();
    assert_eq!(expect_write(&mut device).await, b"S");

    device.push_str(stream).unwrap();

    let result = timeout(TEST_DEADLINE, handle.wait()).await.unwrap();
    assert_eq!(result.identifier().map(|id| id.as_str()), Some(expected));
    assert!(!scanner.transport().is_busy());
}

#[tokio::test]
async fn test_frame_split_across_reads() {
    let (scanner, mut device) = scanner(ScanProfile::portal());

    let handle = scanner.start().await.unwrap();
    expect_write(&mut device).await;

    for chunk in ["boot ", "I", "D", ": a1b2", "c3d4", "\r\n"] {
        device.push_str(chunk).unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let result = timeout(TEST_DEADLINE, handle.wait()).await.unwrap();
    assert_eq!(result.identifier().unwrap().as_str(), "A1B2C3D4");
}

#[tokio::test]
async fn test_short_token_keeps_reading() {
    let (scanner, mut device) = scanner(ScanProfile::portal());

    let handle = scanner.start().await.unwrap();
    expect_write(&mut device).await;
    device.push_str("ID: 123\n").unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(handle.state(), SessionState::Reading);

    handle.cancel();
    let result = timeout(TEST_DEADLINE, handle.wait()).await.unwrap();
    assert_eq!(result, ScanResult::Cancelled);
}

#[tokio::test]
async fn test_transport_opened_once_across_sessions() {
    let (scanner, mut device) = scanner(ScanProfile::portal());

    for card in ["11111111", "22222222", "33333333"] {
        let handle = scanner.start().await.unwrap();
        expect_write(&mut device).await;
        device.push_str(&format!("ID: {card}\n")).unwrap();

        let result = timeout(TEST_DEADLINE, handle.wait()).await.unwrap();
        assert_eq!(result.identifier().unwrap().as_str(), card);
    }

    assert_eq!(device.open_count(), 1);
    assert!(device.is_open());
    assert_eq!(device.last_config().unwrap().baud_rate, 115_200);
}

#[tokio::test]
async fn test_state_progression() {
    let (scanner, mut device) = scanner(ScanProfile::portal());

    let handle = scanner.start().await.unwrap();
    let mut states = handle.subscribe();
    expect_write(&mut device).await;

    timeout(TEST_DEADLINE, states.wait_for(|s| *s == SessionState::Reading))
        .await
        .unwrap()
        .unwrap();

    device.push_str("ID: A1B2C3D4\n").unwrap();

    timeout(TEST_DEADLINE, states.wait_for(|s| s.is_terminal()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(*states.borrow(), SessionState::Completed);
    assert!(handle.wait().await.identifier().is_some());
}

#[tokio::test]
async fn test_on_result_callback() {
    let (scanner, mut device) = scanner(ScanProfile::portal());
    let (tx, rx) = tokio::sync::oneshot::channel();

    let handle = scanner.start().await.unwrap();
    let task = handle.on_result(move |result| {
        let _ = tx.send(result);
    });

    expect_write(&mut device).await;
    device.push_str("ID: FEEDFACE\n").unwrap();

    let result = timeout(TEST_DEADLINE, rx).await.unwrap().unwrap();
    assert_eq!(result.identifier().unwrap().as_str(), "FEEDFACE");
    task.await.unwrap();
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancel_without_frame_then_restart() {
    let (scanner, mut device) = scanner(ScanProfile::portal());

    let handle = scanner.start().await.unwrap();
    expect_write(&mut device).await;
    device.push_str("noise without a sentinel\n").unwrap();

    handle.cancel();
    let result = timeout(TEST_DEADLINE, handle.wait()).await.unwrap();
    assert_eq!(result, ScanResult::Cancelled);

    // Binding released: the next session starts immediately.
    let next = scanner.start().await.unwrap();
    expect_write(&mut device).await;
    device.push_str("ID: 87654321\n").unwrap();
    let result = timeout(TEST_DEADLINE, next.wait()).await.unwrap();
    assert_eq!(result.identifier().unwrap().as_str(), "87654321");
}

#[tokio::test]
async fn test_canceller_from_another_task() {
    let (scanner, mut device) = scanner(ScanProfile::portal());

    let handle = scanner.start().await.unwrap();
    let canceller = handle.canceller();
    expect_write(&mut device).await;

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let result = timeout(TEST_DEADLINE, handle.wait()).await.unwrap();
    assert_eq!(result, ScanResult::Cancelled);
}

#[tokio::test]
async fn test_dropping_handle_releases_transport() {
    let (scanner, mut device) = scanner(ScanProfile::portal());

    let handle = scanner.start().await.unwrap();
    expect_write(&mut device).await;
    drop(handle);

    timeout(TEST_DEADLINE, async {
        while scanner.transport().is_busy() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    assert!(scanner.start().await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_cancel_and_complete_emit_one_result() {
    for _ in 0..20 {
        let (scanner, mut device) = scanner(ScanProfile::portal());

        let handle = scanner.start().await.unwrap();
        let mut states = handle.subscribe();
        expect_write(&mut device).await;

        let canceller = handle.canceller();
        let device_side = tokio::spawn(async move {
            device.push_str("ID: A1B2C3D4\n").unwrap();
            device
        });
        canceller.cancel();

        let result = timeout(TEST_DEADLINE, handle.wait()).await.unwrap();
        match &result {
            ScanResult::Identifier(id) => assert_eq!(id.as_str(), "A1B2C3D4"),
            ScanResult::Cancelled => {}
            other => panic!("unexpected result: {other:?}"),
        }

        let terminal = *states.borrow_and_update();
        assert!(terminal.is_terminal());
        assert_eq!(
            terminal == SessionState::Completed,
            result.identifier().is_some()
        );
        assert!(!scanner.transport().is_busy());
        device_side.await.unwrap();
    }
}

// ============================================================================
// Start failures
// ============================================================================

#[tokio::test]
async fn test_start_while_active_is_busy() {
    let (scanner, mut device) = scanner(ScanProfile::portal());

    let active = scanner.start().await.unwrap();
    let mut states = active.subscribe();
    expect_write(&mut device).await;
    timeout(TEST_DEADLINE, states.wait_for(|s| *s == SessionState::Reading))
        .await
        .unwrap()
        .unwrap();

    let err = scanner.start().await.unwrap_err();
    assert!(matches!(err, ScanError::TransportBusy(ref port) if port == "/dev/ttyTEST0"));

    // The active session is untouched and still completes.
    assert_eq!(active.state(), SessionState::Reading);
    device.push_str("ID: A1B2C3D4\n").unwrap();
    let result = timeout(TEST_DEADLINE, active.wait()).await.unwrap();
    assert!(result.identifier().is_some());
}

#[tokio::test]
async fn test_scan_folds_busy_into_error() {
    let (scanner, mut device) = scanner(ScanProfile::portal());

    let _active = scanner.start().await.unwrap();
    expect_write(&mut device).await;

    let result = scanner.scan().await;
    assert!(matches!(
        result,
        ScanResult::Error(ScanError::TransportBusy(_))
    ));
}

#[rstest]
#[case(OpenFailure::PermissionDenied)]
#[case(OpenFailure::NotFound)]
#[tokio::test]
async fn test_open_failure_is_unavailable(#[case] failure: OpenFailure) {
    let (scanner, mut device) = scanner(ScanProfile::portal());
    device.fail_open(failure);

    let err = scanner.start().await.unwrap_err();
    assert!(matches!(err, ScanError::TransportUnavailable(_)));
    assert!(!err.is_recoverable());

    // No trigger written, no read loop entered, binding free.
    assert!(
        timeout(Duration::from_millis(50), device.next_write())
            .await
            .is_err()
    );
    assert!(!scanner.transport().is_busy());

    device.allow_open();
    let handle = scanner.start().await.unwrap();
    assert_eq!(expect_write(&mut device).await, b"S");
    handle.cancel();
}

// ============================================================================
// Link errors
// ============================================================================

#[tokio::test]
async fn test_read_error_fails_session() {
    let (scanner, mut device) = scanner(ScanProfile::portal());

    let handle = scanner.start().await.unwrap();
    let mut states = handle.subscribe();
    expect_write(&mut device).await;
    device.push_error("framing error").unwrap();

    let result = timeout(TEST_DEADLINE, handle.wait()).await.unwrap();
    match result {
        ScanResult::Error(ScanError::Transport(message)) => {
            assert!(message.contains("framing error"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(*states.borrow_and_update(), SessionState::Failed);
    assert!(!scanner.transport().is_busy());
}

#[tokio::test]
async fn test_disconnect_fails_session() {
    let (scanner, mut device) = scanner(ScanProfile::portal());

    let handle = scanner.start().await.unwrap();
    expect_write(&mut device).await;
    drop(device);

    let result = timeout(TEST_DEADLINE, handle.wait()).await.unwrap();
    assert!(matches!(result, ScanResult::Error(ScanError::Transport(_))));
    assert!(!scanner.transport().is_busy());
}

#[tokio::test]
async fn test_unplugged_reader_is_reopened_by_next_session() {
    let (scanner, mut device) = scanner(ScanProfile::portal());

    let handle = scanner.start().await.unwrap();
    expect_write(&mut device).await;
    device.disconnect().unwrap();

    let result = timeout(TEST_DEADLINE, handle.wait()).await.unwrap();
    assert!(matches!(result, ScanResult::Error(ScanError::Transport(_))));
    assert!(!device.is_open());

    let next = scanner.start().await.unwrap();
    assert_eq!(device.open_count(), 2);
    assert_eq!(expect_write(&mut device).await, b"S");
    device.push_str("ID: 0BADF00D\n").unwrap();

    let result = timeout(TEST_DEADLINE, next.wait()).await.unwrap();
    assert_eq!(result.identifier().unwrap().as_str(), "0BADF00D");
}

// ============================================================================
// Kiosk controller profile
// ============================================================================

#[tokio::test]
async fn test_kiosk_scan_reads_binary_uid() {
    let (scanner, mut device) = scanner(ScanProfile::kiosk());

    let handle = scanner.start().await.unwrap();
    assert_eq!(expect_write(&mut device).await, b"START\n");
    assert_eq!(device.clear_count(), 1);

    device.push(b"\x00ready\nPID:\xE2\xFA\x42\x06".to_vec()).unwrap();

    let result = timeout(TEST_DEADLINE, handle.wait()).await.unwrap();
    assert_eq!(result.identifier().unwrap().as_str(), "E2FA4206");
}

#[tokio::test(start_paused = true)]
async fn test_kiosk_timeout_writes_end() {
    let (scanner, mut device) = scanner(ScanProfile::kiosk());

    let result = scanner.scan().await;
    assert_eq!(result, ScanResult::Error(ScanError::FrameTimeout(10_000)));
    assert!(result.message().contains("10000ms"));

    assert_eq!(device.next_write().await.unwrap(), b"START\n");
    assert_eq!(device.next_write().await.unwrap(), b"END\n");
    assert!(!scanner.transport().is_busy());
}

#[tokio::test]
async fn test_kiosk_cancel_writes_end() {
    let (scanner, mut device) = scanner(ScanProfile::kiosk());

    let handle = scanner.start().await.unwrap();
    expect_write(&mut device).await;
    handle.cancel();

    let result = timeout(TEST_DEADLINE, handle.wait()).await.unwrap();
    assert_eq!(result, ScanResult::Cancelled);
    assert_eq!(expect_write(&mut device).await, b"END\n");
}

#[tokio::test]
async fn test_results_are_counted_once() {
    let (scanner, mut device) = scanner(ScanProfile::portal());
    let delivered = Arc::new(AtomicUsize::new(0));

    let handle = scanner.start().await.unwrap();
    let counter = Arc::clone(&delivered);
    let task = handle.on_result(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    expect_write(&mut device).await;
    device.push_str("ID: A1B2C3D4\nID: 11111111\n").unwrap();
    task.await.unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(delivered.load(Ordering::SeqCst), 1);
}
