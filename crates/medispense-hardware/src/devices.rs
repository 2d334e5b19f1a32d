//! Enum wrapper for transport dispatch.
//!
//! [`SerialTransport`] is not object-safe, so runtime selection between the
//! real serial port and the mock (for example from a CLI flag) goes through
//! [`AnyTransport`] instead of `Box<dyn SerialTransport>`.
//!
//! # Examples
//!
//! ```
//! use medispense_hardware::devices::AnyTransport;
//! use medispense_hardware::mock::MockTransport;
//!
//! let (transport, _handle) = MockTransport::new();
//! let any = AnyTransport::Mock(transport);
//! ```

use crate::mock::MockTransport;
use crate::traits::SerialTransport;
use crate::{Result, SerialConfig};

#[cfg(feature = "hardware-serial")]
use crate::serial::SerialPortTransport;

/// Enum wrapper for transport dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTransport {
    /// Physical serial port.
    #[cfg(feature = "hardware-serial")]
    Serial(SerialPortTransport),

    /// Mock transport for development and testing.
    Mock(MockTransport),
}

macro_rules! dispatch {
    ($self:ident, $device:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "hardware-serial")]
            AnyTransport::Serial($device) => $call,
            AnyTransport::Mock($device) => $call,
        }
    };
}

impl SerialTransport for AnyTransport {
    fn name(&self) -> &str {
        dispatch!(self, device => device.name())
    }

    fn is_open(&self) -> bool {
        dispatch!(self, device => device.is_open())
    }

    async fn open(&mut self, config: &SerialConfig) -> Result<()> {
        dispatch!(self, device => device.open(config).await)
    }

    async fn clear_input(&mut self) -> Result<()> {
        dispatch!(self, device => device.clear_input().await)
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        dispatch!(self, device => device.write_all(bytes).await)
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        dispatch!(self, device => device.read(buf).await)
    }

    async fn close(&mut self) -> Result<()> {
        dispatch!(self, device => device.close().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_any_transport_delegates_to_mock() {
        let (transport, mut handle) = MockTransport::with_name("dispatch-test");
        let mut any = AnyTransport::Mock(transport);

        assert_eq!(any.name(), "dispatch-test");
        assert!(!any.is_open());

        any.open(&SerialConfig::default()).await.unwrap();
        any.write_all(b"START\n").await.unwrap();

        assert!(any.is_open());
        assert_eq!(handle.next_write().await.unwrap(), b"START\n");

        any.close().await.unwrap();
        assert!(!handle.is_open());
    }
}
