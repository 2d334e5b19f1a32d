//! Serial transport trait definition.
//!
//! This module defines the contract between the scan/dispense sessions and
//! the physical link to the reader or dispenser controller. The link is
//! half-duplex from the host's point of view: a session writes a command and
//! then reads the reply.
//!
//! The trait methods return `impl Future + Send` so sessions driving a
//! transport can be spawned onto the Tokio runtime. Implementations are free
//! to write them as plain `async fn`.

use std::future::Future;

use crate::error::Result;
use crate::types::SerialConfig;

/// Byte-stream transport to a serial device.
///
/// # Read semantics
///
/// [`read`](SerialTransport::read) waits at most the configured read timeout
/// and returns `Ok(0)` if no bytes arrived in that window. End of stream is
/// reported as [`HardwareError::Disconnected`](crate::HardwareError), never
/// as `Ok(0)`. Callers rely on this bound to observe cancellation between
/// reads.
///
/// # Lost links
///
/// When `read`, `write_all` or `clear_input` fails with a
/// [link failure](crate::HardwareError::is_link_failure), the transport
/// drops the link and [`is_open`](SerialTransport::is_open) returns `false`
/// until the next successful [`open`](SerialTransport::open).
///
/// # Object Safety and Dynamic Dispatch
///
/// The trait is not object-safe. Use generics, or the
/// [`AnyTransport`](crate::devices::AnyTransport) enum wrapper for runtime
/// selection between implementations.
///
/// # Examples
///
/// ```no_run
/// use medispense_hardware::{Result, SerialConfig, SerialTransport};
///
/// async fn ping<T: SerialTransport>(transport: &mut T) -> Result<usize> {
///     transport.open(&SerialConfig::default()).await?;
///     transport.write_all(b"S").await?;
///
///     let mut buf = [0u8; 64];
///     transport.read(&mut buf).await
/// }
/// ```
pub trait SerialTransport: Send + Sync {
    /// Human-readable device name, used in errors and logs.
    fn name(&self) -> &str;

    /// Check whether the link is currently open.
    fn is_open(&self) -> bool;

    /// Open the link with the given configuration.
    ///
    /// Opening an already open transport is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The device does not exist ([`HardwareError::NotFound`](crate::HardwareError))
    /// - The process lacks permission ([`HardwareError::PermissionDenied`](crate::HardwareError))
    /// - The configuration is rejected by the driver
    fn open(&mut self, config: &SerialConfig) -> impl Future<Output = Result<()>> + Send;

    /// Discard any bytes received but not yet read.
    fn clear_input(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Write all bytes to the link and flush.
    fn write_all(&mut self, bytes: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Read available bytes into `buf`, returning how many were read.
    ///
    /// Returns `Ok(0)` when the read timeout elapsed without data.
    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize>> + Send;

    /// Close the link. Closing a closed transport is a no-op.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
