//! Scan profiles for the two card-reading front-ends.

use std::time::Duration;

use medispense_core::constants::{
    CONTROLLER_END, CONTROLLER_SCAN_TIMEOUT_MS, CONTROLLER_TRIGGER, READER_TRIGGER,
};
use serde::{Deserialize, Serialize};

use crate::frame::FrameFormat;

/// How a scan session talks to the device on the other end of the link.
///
/// # Example
///
/// ```
/// use medispense_rfid::{FrameFormat, ScanProfile};
/// use std::time::Duration;
///
/// let profile = ScanProfile::kiosk();
/// assert_eq!(profile.frame, FrameFormat::binary());
/// assert_eq!(profile.frame_timeout(), Some(Duration::from_secs(10)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanProfile {
    /// Discard stale input before triggering.
    pub clear_input: bool,

    /// Bytes written to start a card read.
    pub trigger: String,

    /// Expected identifier frame.
    pub frame: FrameFormat,

    /// Give up after this many milliseconds without a frame.
    pub frame_timeout_ms: Option<u64>,

    /// Bytes written when the session ends without a frame.
    pub abort_sequence: Option<String>,
}

impl ScanProfile {
    /// Doctor-portal card reader: `S` trigger, text `ID:` frames, waits
    /// until a card is presented or the scan is cancelled.
    pub fn portal() -> Self {
        Self {
            clear_input: false,
            trigger: String::from_utf8_lossy(READER_TRIGGER).into_owned(),
            frame: FrameFormat::text(),
            frame_timeout_ms: None,
            abort_sequence: None,
        }
    }

    /// Kiosk dispenser controller: `START` trigger, binary `PID:` frames,
    /// ten second timeout, `END` to stand the controller down.
    pub fn kiosk() -> Self {
        Self {
            clear_input: true,
            trigger: String::from_utf8_lossy(CONTROLLER_TRIGGER).into_owned(),
            frame: FrameFormat::binary(),
            frame_timeout_ms: Some(CONTROLLER_SCAN_TIMEOUT_MS),
            abort_sequence: Some(String::from_utf8_lossy(CONTROLLER_END).into_owned()),
        }
    }

    /// Frame timeout as a [`Duration`].
    pub fn frame_timeout(&self) -> Option<Duration> {
        self.frame_timeout_ms.map(Duration::from_millis)
    }

    /// Override the frame timeout.
    pub fn with_frame_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.frame_timeout_ms = timeout.map(|d| d.as_millis() as u64);
        self
    }
}

impl Default for ScanProfile {
    fn default() -> Self {
        Self::portal()
    }
}
