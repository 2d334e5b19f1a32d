//! Mock serial transport for testing and development.
//!
//! This module provides an in-memory transport whose inbound byte stream and
//! failure modes are driven programmatically through a handle, so scan and
//! dispense sessions can be exercised without a physical device.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::sync::mpsc;

use crate::{
    HardwareError, Result,
    traits::SerialTransport,
    types::SerialConfig,
};

/// Failure injected into [`MockTransport::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFailure {
    /// No device attached.
    NotFound,

    /// Device present but access denied.
    PermissionDenied,
}

/// Inbound event delivered to the transport.
#[derive(Debug, Clone)]
enum MockEvent {
    Data(Vec<u8>),
    Error(String),
    Disconnect,
}

/// State shared between the transport and its handle.
#[derive(Debug, Default)]
struct MockState {
    open_failure: Option<OpenFailure>,
    open_count: usize,
    clear_count: usize,
    is_open: bool,
    last_config: Option<SerialConfig>,
}

/// Mock serial transport.
///
/// # Examples
///
/// ```
/// use medispense_hardware::mock::MockTransport;
/// use medispense_hardware::{SerialConfig, SerialTransport};
///
/// #[tokio::main]
/// async fn main() -> medispense_hardware::Result<()> {
///     let (mut transport, mut handle) = MockTransport::new();
///     transport.open(&SerialConfig::default()).await?;
///
///     transport.write_all(b"S").await?;
///     assert_eq!(handle.next_write().await.as_deref(), Some(&b"S"[..]));
///
///     handle.push_str("ID: A1B2C3D4\n")?;
///     let mut buf = [0u8; 64];
///     let n = transport.read(&mut buf).await?;
///     assert_eq!(&buf[..n], b"ID: A1B2C3D4\n");
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    /// Device name
    name: String,

    /// Inbound bytes pushed by the handle
    inbound_rx: mpsc::UnboundedReceiver<MockEvent>,

    /// Bytes received but not yet returned by `read`
    pending: BytesMut,

    /// Outbound writes, observed by the handle
    outbound_tx: mpsc::UnboundedSender<Vec<u8>>,

    /// Read poll interval
    poll: Duration,

    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport with the default name.
    ///
    /// Returns a tuple of (MockTransport, MockTransportHandle) where the
    /// handle feeds inbound bytes and observes writes.
    pub fn new() -> (Self, MockTransportHandle) {
        Self::with_name("mock-serial")
    }

    /// Create a new mock transport with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockTransportHandle) {
        let name = name.into();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(MockState::default()));

        let transport = Self {
            name: name.clone(),
            inbound_rx,
            pending: BytesMut::new(),
            outbound_tx,
            poll: SerialConfig::default().read_timeout(),
            state: Arc::clone(&state),
        };

        let handle = MockTransportHandle {
            name,
            inbound_tx,
            outbound_rx,
            state,
        };

        (transport, handle)
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut state)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.with_state(|s| s.is_open) {
            Ok(())
        } else {
            Err(HardwareError::not_open(&self.name))
        }
    }

    /// Mark the link closed if `result` reports a lost link.
    fn check_link<R>(&mut self, result: Result<R>) -> Result<R> {
        if let Err(err) = &result
            && err.is_link_failure()
        {
            self.pending.clear();
            self.with_state(|s| s.is_open = false);
        }
        result
    }

    fn take_pending(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        n
    }
}

impl SerialTransport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.with_state(|s| s.is_open)
    }

    async fn open(&mut self, config: &SerialConfig) -> Result<()> {
        let name = self.name.clone();
        self.with_state(|s| {
            if s.is_open {
                return Ok(());
            }
            match s.open_failure {
                Some(OpenFailure::NotFound) => Err(HardwareError::not_found(name)),
                Some(OpenFailure::PermissionDenied) => Err(HardwareError::permission_denied(name)),
                None => {
                    s.is_open = true;
                    s.open_count += 1;
                    s.last_config = Some(config.clone());
                    Ok(())
                }
            }
        })?;
        self.poll = config.read_timeout();
        Ok(())
    }

    async fn clear_input(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.pending.clear();
        while let Ok(event) = self.inbound_rx.try_recv() {
            let failure = match event {
                MockEvent::Data(_) => continue,
                MockEvent::Error(message) => HardwareError::communication(message),
                MockEvent::Disconnect => HardwareError::disconnected(&self.name),
            };
            return self.check_link(Err(failure));
        }
        self.with_state(|s| s.clear_count += 1);
        Ok(())
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let result = self
            .outbound_tx
            .send(bytes.to_vec())
            .map_err(|_| HardwareError::disconnected(&self.name));
        self.check_link(result)
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open()?;

        if !self.pending.is_empty() {
            return Ok(self.take_pending(buf));
        }

        let result = match tokio::time::timeout(self.poll, self.inbound_rx.recv()).await {
            Ok(Some(MockEvent::Data(data))) => {
                self.pending.extend_from_slice(&data);
                Ok(self.take_pending(buf))
            }
            Ok(Some(MockEvent::Error(message))) => Err(HardwareError::communication(message)),
            Ok(Some(MockEvent::Disconnect) | None) => Err(HardwareError::disconnected(&self.name)),
            Err(_) => Ok(0),
        };
        self.check_link(result)
    }

    async fn close(&mut self) -> Result<()> {
        self.with_state(|s| s.is_open = false);
        Ok(())
    }
}

/// Handle for driving a mock transport.
///
/// Dropping the handle disconnects the transport: subsequent reads fail
/// with [`HardwareError::Disconnected`]. Either way a failed read, write or
/// clear closes the transport until it is opened again.
#[derive(Debug)]
pub struct MockTransportHandle {
    name: String,
    inbound_tx: mpsc::UnboundedSender<MockEvent>,
    outbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    state: Arc<Mutex<MockState>>,
}

impl MockTransportHandle {
    /// Queue bytes to be returned by the transport's reads.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport has been dropped.
    pub fn push(&self, bytes: impl Into<Vec<u8>>) -> Result<()> {
        self.inbound_tx
            .send(MockEvent::Data(bytes.into()))
            .map_err(|_| HardwareError::disconnected(&self.name))
    }

    /// Queue a UTF-8 string to be returned by the transport's reads.
    pub fn push_str(&self, text: &str) -> Result<()> {
        self.push(text.as_bytes())
    }

    /// Make the next read fail with a communication error.
    pub fn push_error(&self, message: impl Into<String>) -> Result<()> {
        self.inbound_tx
            .send(MockEvent::Error(message.into()))
            .map_err(|_| HardwareError::disconnected(&self.name))
    }

    /// Make the next read fail as if the device was unplugged.
    ///
    /// The handle stays usable, so the device can be "replugged" by opening
    /// the transport again.
    pub fn disconnect(&self) -> Result<()> {
        self.inbound_tx
            .send(MockEvent::Disconnect)
            .map_err(|_| HardwareError::disconnected(&self.name))
    }

    /// Wait for the next chunk written by the transport.
    ///
    /// Returns `None` once the transport has been dropped.
    pub async fn next_write(&mut self) -> Option<Vec<u8>> {
        self.outbound_rx.recv().await
    }

    /// Make subsequent `open` calls fail.
    pub fn fail_open(&self, failure: OpenFailure) {
        self.with_state(|s| s.open_failure = Some(failure));
    }

    /// Let subsequent `open` calls succeed again.
    pub fn allow_open(&self) {
        self.with_state(|s| s.open_failure = None);
    }

    /// Number of times the transport was actually opened.
    pub fn open_count(&self) -> usize {
        self.with_state(|s| s.open_count)
    }

    /// Number of times the input buffer was cleared.
    pub fn clear_count(&self) -> usize {
        self.with_state(|s| s.clear_count)
    }

    /// Check whether the transport is open.
    pub fn is_open(&self) -> bool {
        self.with_state(|s| s.is_open)
    }

    /// Configuration passed to the last successful `open`.
    pub fn last_config(&self) -> Option<SerialConfig> {
        self.with_state(|s| s.last_config.clone())
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut state)
    }
}
