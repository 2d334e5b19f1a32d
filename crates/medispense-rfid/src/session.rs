//! Exclusive, cancellable card scan sessions.
//!
//! A [`Scanner`] starts one [`ScanHandle`] per scan. The session binds the
//! shared transport, writes the profile's trigger, then reads until a frame
//! arrives, the scan is cancelled, the frame timeout elapses, or the link
//! fails. Exactly one [`ScanResult`] is delivered per session.
//!
//! # State Machine
//!
//! ```text
//! Idle ──> Acquiring ──> Writing ──> Reading ──┬──> Completed
//!              │            │           │      ├──> Cancelled
//!              └─ (busy)    └───────────┴──────┴──> Failed
//! ```
//!
//! The transport binding is released on every terminal transition, before
//! the result is delivered. A caller that sees a result can start the next
//! session immediately.
//!
//! # Example
//!
//! ```
//! use medispense_hardware::{SerialConfig, SharedTransport};
//! use medispense_hardware::mock::MockTransport;
//! use medispense_rfid::{ScanProfile, ScanResult, Scanner};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (transport, mut device) = MockTransport::new();
//! let scanner = Scanner::new(
//!     SharedTransport::new(transport, SerialConfig::default()),
//!     ScanProfile::portal(),
//! );
//!
//! let handle = scanner.start().await?;
//! assert_eq!(device.next_write().await.as_deref(), Some(&b"S"[..]));
//! device.push_str("ID: a1b2c3d4\r\n")?;
//!
//! match handle.wait().await {
//!     ScanResult::Identifier(id) => assert_eq!(id.as_str(), "A1B2C3D4"),
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use medispense_core::CardId;
use medispense_hardware::{HardwareError, SerialTransport, SharedTransport, TransportGuard};
use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, ScanError};
use crate::frame::FrameExtractor;
use crate::profile::ScanProfile;

/// Bytes requested per transport read.
const READ_CHUNK_SIZE: usize = 256;

/// Lifecycle state of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, not started.
    Idle,
    /// Binding and opening the transport.
    Acquiring,
    /// Sending the trigger.
    Writing,
    /// Waiting for a frame.
    Reading,
    /// A frame was extracted.
    Completed,
    /// Cancelled by the caller.
    Cancelled,
    /// Transport failure or frame timeout.
    Failed,
}

impl SessionState {
    /// Check whether the session has finished.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Check whether `next` is a legal successor of this state.
    pub fn can_transition_to(self, next: Self) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Acquiring)
                | (Acquiring, Writing | Failed)
                | (Writing, Reading | Cancelled | Failed)
                | (Reading, Completed | Cancelled | Failed)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Acquiring => "acquiring",
            Self::Writing => "writing",
            Self::Reading => "reading",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a scan session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResult {
    /// A card was read.
    Identifier(CardId),
    /// The caller cancelled the scan.
    Cancelled,
    /// The scan failed.
    Error(ScanError),
}

impl ScanResult {
    /// Identifier, if the scan succeeded.
    pub fn identifier(&self) -> Option<&CardId> {
        match self {
            Self::Identifier(id) => Some(id),
            _ => None,
        }
    }

    /// Status line suitable for display.
    pub fn message(&self) -> String {
        match self {
            Self::Identifier(id) => format!("Card detected: {id}"),
            Self::Cancelled => "Scan cancelled".to_string(),
            Self::Error(err) => err.to_string(),
        }
    }

    fn terminal_state(&self) -> SessionState {
        match self {
            Self::Identifier(_) => SessionState::Completed,
            Self::Cancelled => SessionState::Cancelled,
            Self::Error(_) => SessionState::Failed,
        }
    }
}

/// Starts scan sessions over a shared transport.
#[derive(Debug)]
pub struct Scanner<T> {
    transport: SharedTransport<T>,
    profile: Arc<ScanProfile>,
}

impl<T> Clone for Scanner<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            profile: Arc::clone(&self.profile),
        }
    }
}

impl<T: SerialTransport + 'static> Scanner<T> {
    /// Create a scanner.
    pub fn new(transport: SharedTransport<T>, profile: ScanProfile) -> Self {
        Self {
            transport,
            profile: Arc::new(profile),
        }
    }

    /// Start a scan session.
    ///
    /// Binds the transport, opening it on first use, and spawns the session
    /// onto the Tokio runtime. Returns once the session is running.
    ///
    /// # Errors
    ///
    /// - [`ScanError::TransportBusy`] if another session holds the transport.
    ///   The active session is not affected.
    /// - [`ScanError::TransportUnavailable`] if the link cannot be opened.
    ///   No trigger is written and the binding is released.
    pub async fn start(&self) -> Result<ScanHandle> {
        let id = Uuid::new_v4();
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        state_tx.send_replace(SessionState::Acquiring);

        let mut guard = self.transport.try_acquire().map_err(|err| {
            debug!(session_id = %id, error = %err, "Scan rejected");
            ScanError::from(err)
        })?;

        if let Err(err) = guard.ensure_open().await {
            warn!(session_id = %id, port = %self.transport.name(), error = %err, "Failed to open transport");
            return Err(ScanError::TransportUnavailable(err.to_string()));
        }

        let cancel = CancellationToken::new();
        let (result_tx, result_rx) = oneshot::channel();

        let session = ScanSession {
            id,
            guard,
            profile: Arc::clone(&self.profile),
            extractor: FrameExtractor::new(self.profile.frame.clone()),
            cancel: cancel.clone(),
            state: state_tx,
        };

        info!(session_id = %id, port = %self.transport.name(), "Scan session started");
        tokio::spawn(session.run(result_tx));

        Ok(ScanHandle {
            id,
            cancel,
            state: state_rx,
            result: Some(result_rx),
        })
    }

    /// Run one scan to completion.
    ///
    /// Start failures are folded into [`ScanResult::Error`].
    pub async fn scan(&self) -> ScanResult {
        match self.start().await {
            Ok(handle) => handle.wait().await,
            Err(err) => ScanResult::Error(err),
        }
    }

    /// Underlying shared transport.
    pub fn transport(&self) -> &SharedTransport<T> {
        &self.transport
    }

    /// Profile used for new sessions.
    pub fn profile(&self) -> &ScanProfile {
        &self.profile
    }
}

/// Caller side of a running scan session.
///
/// Dropping the handle cancels the session.
#[derive(Debug)]
pub struct ScanHandle {
    id: Uuid,
    cancel: CancellationToken,
    state: watch::Receiver<SessionState>,
    result: Option<oneshot::Receiver<ScanResult>>,
}

impl ScanHandle {
    /// Session identifier, as it appears in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Request cancellation.
    ///
    /// Takes effect at the next read boundary. Has no effect once a frame
    /// has been extracted.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancellation handle that can be moved to another task.
    pub fn canceller(&self) -> ScanCanceller {
        ScanCanceller {
            token: self.cancel.clone(),
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Receiver notified on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Wait for the session result.
    pub async fn wait(mut self) -> ScanResult {
        let Some(result) = self.result.take() else {
            return ScanResult::Error(ScanError::Aborted("result already taken".to_string()));
        };
        match result.await {
            Ok(result) => result,
            Err(_) => ScanResult::Error(ScanError::Aborted(
                "session ended without a result".to_string(),
            )),
        }
    }

    /// Deliver the result to `callback` from a background task.
    pub fn on_result<F>(self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(ScanResult) + Send + 'static,
    {
        tokio::spawn(async move { callback(self.wait().await) })
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Cloneable cancellation trigger for a scan session.
#[derive(Debug, Clone)]
pub struct ScanCanceller {
    token: CancellationToken,
}

impl ScanCanceller {
    /// Request cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Session task state. Owns the transport binding until it finishes.
struct ScanSession<T> {
    id: Uuid,
    guard: TransportGuard<T>,
    profile: Arc<ScanProfile>,
    extractor: FrameExtractor,
    cancel: CancellationToken,
    state: watch::Sender<SessionState>,
}

impl<T: SerialTransport> ScanSession<T> {
    async fn run(mut self, result_tx: oneshot::Sender<ScanResult>) {
        let result = match self.exchange().await {
            Ok(result) => result,
            Err(err) => {
                warn!(session_id = %self.id, error = %err, "Scan failed");
                ScanResult::Error(ScanError::from(err))
            }
        };

        let id = self.id;
        self.transition(result.terminal_state());
        // Release the transport before anyone can observe the result.
        drop(self);

        info!(session_id = %id, result = %result.message(), "Scan session finished");
        if result_tx.send(result).is_err() {
            debug!(session_id = %id, "Scan result dropped, handle gone");
        }
    }

    async fn exchange(&mut self) -> std::result::Result<ScanResult, HardwareError> {
        self.transition(SessionState::Writing);

        if self.profile.clear_input {
            self.guard.clear_input().await?;
        }
        if self.cancel.is_cancelled() {
            return Ok(self.abort(ScanResult::Cancelled).await);
        }
        self.guard.write_all(self.profile.trigger.as_bytes()).await?;

        self.transition(SessionState::Reading);
        let deadline = self.profile.frame_timeout().map(|t| Instant::now() + t);
        let mut buf = [0u8; READ_CHUNK_SIZE];

        loop {
            if self.cancel.is_cancelled() {
                return Ok(self.abort(ScanResult::Cancelled).await);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                let timeout_ms = self.profile.frame_timeout_ms.unwrap_or_default();
                let result = ScanResult::Error(ScanError::FrameTimeout(timeout_ms));
                return Ok(self.abort(result).await);
            }

            let n = self.guard.read(&mut buf).await?;
            if n == 0 {
                continue;
            }

            if let Some(id) = self.extractor.feed(&buf[..n]) {
                return Ok(ScanResult::Identifier(id));
            }
        }
    }

    /// Stand the device down, best effort, and pass `result` through.
    async fn abort(&mut self, result: ScanResult) -> ScanResult {
        if let Some(sequence) = &self.profile.abort_sequence {
            if let Err(err) = self.guard.write_all(sequence.as_bytes()).await {
                debug!(session_id = %self.id, error = %err, "Failed to write abort sequence");
            }
        }
        result
    }

    fn transition(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        if previous.can_transition_to(next) {
            debug!(session_id = %self.id, from = %previous, to = %next, "Scan state changed");
        } else {
            warn!(session_id = %self.id, from = %previous, to = %next, "Unexpected scan state transition");
        }
    }
}
