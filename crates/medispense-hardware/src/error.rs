//! Error types for transport operations.
//!
//! This module defines the errors a serial transport can report: missing or
//! inaccessible devices, exclusive-access conflicts, disconnections, and
//! generic communication failures.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during transport operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device does not exist or is not attached.
    #[error("Device not found: {device}")]
    NotFound { device: String },

    /// Device exists but the process may not open it.
    #[error("Permission denied: {device}")]
    PermissionDenied { device: String },

    /// Transport is already bound to another session.
    #[error("Transport busy: {device}")]
    Busy { device: String },

    /// Operation requires an open transport.
    #[error("Transport not open: {device}")]
    NotOpen { device: String },

    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Device communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Device configuration error.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    /// Create a new not-found error.
    pub fn not_found(device: impl Into<String>) -> Self {
        Self::NotFound {
            device: device.into(),
        }
    }

    /// Create a new permission-denied error.
    pub fn permission_denied(device: impl Into<String>) -> Self {
        Self::PermissionDenied {
            device: device.into(),
        }
    }

    /// Create a new busy error.
    pub fn busy(device: impl Into<String>) -> Self {
        Self::Busy {
            device: device.into(),
        }
    }

    /// Create a new not-open error.
    pub fn not_open(device: impl Into<String>) -> Self {
        Self::NotOpen {
            device: device.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Check whether the device could not be opened at all.
    ///
    /// These failures are surfaced to the user and never retried
    /// automatically.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::PermissionDenied { .. } => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
            ),
            _ => false,
        }
    }

    /// Check whether an open link has been lost.
    ///
    /// A transport that returns one of these from `read`, `write_all` or
    /// `clear_input` reports itself closed afterwards, so the next `open`
    /// reconnects.
    pub fn is_link_failure(&self) -> bool {
        matches!(
            self,
            Self::Disconnected { .. } | Self::CommunicationError { .. } | Self::Io(_)
        )
    }
}

#[cfg(feature = "hardware-serial")]
impl HardwareError {
    /// Map a `serialport` error raised while operating on `device`.
    pub(crate) fn from_serial(device: &str, err: serialport::Error) -> Self {
        use serialport::ErrorKind;

        match err.kind() {
            ErrorKind::NoDevice => Self::not_found(device),
            ErrorKind::InvalidInput => Self::configuration(err.to_string()),
            ErrorKind::Io(std::io::ErrorKind::NotFound) => Self::not_found(device),
            ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => Self::permission_denied(device),
            ErrorKind::Io(_) | ErrorKind::Unknown => Self::communication(err.to_string()),
        }
    }
}
