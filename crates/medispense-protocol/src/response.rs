//! Lines reported by the dispenser controller.

use medispense_core::constants::{RESPONSE_DONE, RESPONSE_ERR, STOCK_PREFIX};
use tracing::debug;

use crate::stock::StockReport;

/// One classified line from the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceLine {
    /// Dispense finished.
    Done,
    /// Command rejected. Carries the raw line.
    Rejected(String),
    /// Stock sensor report.
    Stock(StockReport),
    /// Debug output or a malformed report.
    Unrecognized(String),
}

impl DeviceLine {
    /// Classify a line (without its terminator).
    ///
    /// `ERR` anywhere in the line wins over everything else. A `STK:` line
    /// with a bad bitmap is [`DeviceLine::Unrecognized`].
    ///
    /// # Example
    ///
    /// ```
    /// use medispense_protocol::DeviceLine;
    ///
    /// assert_eq!(DeviceLine::parse("DONE"), DeviceLine::Done);
    /// assert!(matches!(DeviceLine::parse("ERR:SLOT"), DeviceLine::Rejected(_)));
    /// assert!(matches!(DeviceLine::parse("STK:00000"), DeviceLine::Stock(_)));
    /// ```
    pub fn parse(line: &str) -> Self {
        let line = line.trim();

        if line.contains(RESPONSE_ERR) {
            return Self::Rejected(line.to_string());
        }

        if let Some(payload) = line.strip_prefix(STOCK_PREFIX) {
            return match StockReport::parse(payload) {
                Ok(report) => Self::Stock(report),
                Err(err) => {
                    debug!(line, error = %err, "Malformed stock report");
                    Self::Unrecognized(line.to_string())
                }
            };
        }

        if line.contains(RESPONSE_DONE) {
            return Self::Done;
        }

        Self::Unrecognized(line.to_string())
    }
}
