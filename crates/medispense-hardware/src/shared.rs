//! Process-wide transport with exclusive, first-come session binding.
//!
//! A [`SharedTransport`] owns the link for the lifetime of the process. The
//! link is opened lazily by the first session and stays open afterwards;
//! sessions only borrow it through a [`TransportGuard`]. If a session loses
//! the link, the transport closes itself and the next session reopens it.
//!
//! Binding is fail-fast: [`SharedTransport::try_acquire`] never queues. A
//! guard releases the binding when dropped, so every exit path of a session
//! (success, cancellation, error, panic) frees the transport.
//!
//! ```text
//!  session A ──try_acquire──> TransportGuard ──drop──┐
//!  session B ──try_acquire──> Err(Busy)              │
//!  session B ──try_acquire──> TransportGuard <───────┘
//! ```
//!
//! # Example
//!
//! ```
//! use medispense_hardware::{SerialConfig, SharedTransport, HardwareError};
//! use medispense_hardware::mock::MockTransport;
//!
//! # #[tokio::main]
//! # async fn main() -> medispense_hardware::Result<()> {
//! let (transport, _handle) = MockTransport::new();
//! let shared = SharedTransport::new(transport, SerialConfig::default());
//!
//! let guard = shared.try_acquire()?;
//! assert!(matches!(shared.try_acquire(), Err(HardwareError::Busy { .. })));
//!
//! drop(guard);
//! assert!(shared.try_acquire().is_ok());
//! # Ok(())
//! # }
//! ```

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, trace};

use crate::error::{HardwareError, Result};
use crate::traits::SerialTransport;
use crate::types::SerialConfig;

/// Shared, exclusively bindable transport.
///
/// Cloning is cheap and yields another handle to the same link.
#[derive(Debug)]
pub struct SharedTransport<T> {
    inner: Arc<Mutex<T>>,
    config: Arc<SerialConfig>,
    name: Arc<str>,
}

impl<T> Clone for SharedTransport<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: Arc::clone(&self.config),
            name: Arc::clone(&self.name),
        }
    }
}

impl<T: SerialTransport> SharedTransport<T> {
    /// Wrap a transport. It is opened on first use, not here.
    pub fn new(transport: T, config: SerialConfig) -> Self {
        let name: Arc<str> = Arc::from(transport.name());
        Self {
            inner: Arc::new(Mutex::new(transport)),
            config: Arc::new(config),
            name,
        }
    }

    /// Bind the transport exclusively.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Busy`] if another guard is alive.
    pub fn try_acquire(&self) -> Result<TransportGuard<T>> {
        let guard = Arc::clone(&self.inner)
            .try_lock_owned()
            .map_err(|_| HardwareError::busy(&*self.name))?;

        trace!(port = %self.name, "Transport bound");
        Ok(TransportGuard {
            guard,
            config: Arc::clone(&self.config),
            name: Arc::clone(&self.name),
        })
    }

    /// Check whether a guard is currently alive.
    ///
    /// The answer may be stale by the time the caller acts on it.
    pub fn is_busy(&self) -> bool {
        self.inner.try_lock().is_err()
    }

    /// Link configuration.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Exclusive binding to a [`SharedTransport`].
///
/// Dereferences to the underlying transport. Dropping the guard releases
/// the binding; the link itself stays open.
#[derive(Debug)]
pub struct TransportGuard<T> {
    guard: OwnedMutexGuard<T>,
    config: Arc<SerialConfig>,
    name: Arc<str>,
}

impl<T: SerialTransport> TransportGuard<T> {
    /// Open the link if it is not open yet, or reopen it after a lost link.
    ///
    /// # Errors
    ///
    /// Propagates the transport's open error. See
    /// [`HardwareError::is_unavailable`].
    pub async fn ensure_open(&mut self) -> Result<()> {
        if self.guard.is_open() {
            return Ok(());
        }
        debug!(port = %self.name, "Opening transport");
        let config = Arc::clone(&self.config);
        self.guard.open(&config).await
    }

    /// Link configuration.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl<T> Deref for TransportGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for TransportGuard<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for TransportGuard<T> {
    fn drop(&mut self) {
        trace!(port = %self.name, "Transport released");
    }
}
