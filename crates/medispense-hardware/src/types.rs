//! Common types shared across transport implementations.

use medispense_core::constants::{DEFAULT_BAUD_RATE, DEFAULT_READ_POLL_MS, DEFAULT_SERIAL_PORT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Serial link configuration.
///
/// # Example
///
/// ```
/// use medispense_hardware::SerialConfig;
///
/// let config = SerialConfig::new("/dev/ttyUSB0");
/// assert_eq!(config.baud_rate, 115_200);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path (e.g. `/dev/serial0`, `COM3`).
    pub port: String,

    /// Baud rate in bits per second.
    pub baud_rate: u32,

    /// Upper bound for a single read, in milliseconds.
    pub read_timeout_ms: u64,
}

impl SerialConfig {
    /// Create a configuration for the given port with default settings.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    /// Read timeout as a [`Duration`].
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERIAL_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_POLL_MS,
        }
    }
}

/// Serial port discovered on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    /// Device path.
    pub name: String,

    /// Port kind (`usb`, `pci`, `bluetooth`, `unknown`).
    pub kind: String,

    /// Product string reported by USB devices.
    pub product: Option<String>,
}
