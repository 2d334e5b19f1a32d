//! Scan session errors.

use medispense_hardware::HardwareError;

/// Errors reported by scan sessions.
///
/// Carries rendered messages rather than the source errors so a result can
/// be cloned and handed to several observers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// Another session is bound to the transport. Retry once it finishes.
    #[error("Transport busy: {0}")]
    TransportBusy(String),

    /// The link could not be opened (no device, permission denied).
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    /// No frame arrived within the profile's frame timeout.
    #[error("No card detected within {0}ms")]
    FrameTimeout(u64),

    /// The link failed while the session was running.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The session task ended without reporting a result.
    #[error("Scan session aborted: {0}")]
    Aborted(String),
}

impl ScanError {
    /// Check whether retrying the scan may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::TransportBusy(_) | Self::FrameTimeout(_))
    }
}

impl From<HardwareError> for ScanError {
    fn from(err: HardwareError) -> Self {
        match err {
            HardwareError::Busy { device } => Self::TransportBusy(device),
            e if e.is_unavailable() => Self::TransportUnavailable(e.to_string()),
            e => Self::Transport(e.to_string()),
        }
    }
}

/// Result type alias for scan operations.
pub type Result<T> = std::result::Result<T, ScanError>;
