//! Settings file.
//!
//! ```json
//! {
//!   "serial": { "port": "/dev/ttyUSB0", "baud_rate": 115200 },
//!   "kiosk": { "admin_ids": ["E2FA4206"], "machine_id": "MED-001" }
//! }
//! ```
//!
//! Every field is optional. Command-line flags win over the file.

use std::path::Path;

use anyhow::Context;
use medispense_hardware::SerialConfig;
use medispense_kiosk::KioskConfig;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Tool settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Serial link to the reader or controller.
    pub serial: SerialConfig,

    /// Kiosk service settings.
    pub kiosk: KioskConfig,
}

impl Settings {
    /// Load settings from `path`, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing settings file {}", path.display()))
    }

    /// Parse settings from JSON text.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(port) = &cli.port {
            self.serial.port = port.clone();
        }
        if let Some(baud) = cli.baud {
            self.serial.baud_rate = baud;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = Settings::from_json(r#"{"serial": {"port": "/dev/ttyACM0"}}"#).unwrap();
        assert_eq!(settings.serial.port, "/dev/ttyACM0");
        assert_eq!(settings.serial.baud_rate, 115_200);
        assert_eq!(settings.kiosk, KioskConfig::default());
    }

    #[test]
    fn test_flags_override_file() {
        let settings = Settings::from_json(r#"{"serial": {"port": "/dev/ttyACM0"}}"#).unwrap();
        let cli = Cli::parse_from(["medispense", "--port", "/dev/ttyUSB0", "-b", "9600", "ports"]);

        let settings = settings.with_overrides(&cli);
        assert_eq!(settings.serial.port, "/dev/ttyUSB0");
        assert_eq!(settings.serial.baud_rate, 9600);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/medispense.json"))).is_err());
        assert_eq!(Settings::load(None).unwrap(), Settings::default());
    }
}
