//! Core constants for the dispenser serial protocols.
//!
//! Two controllers share the serial link at different times:
//!
//! - The **card reader** (portal front-end) is triggered with a single `S`
//!   byte and answers with a text frame `ID:<uid>\n`.
//! - The **dispenser controller** (kiosk front-end) is triggered with
//!   `START\n` and answers with `PID:` followed by four raw UID bytes. The
//!   same controller accepts `MED:` dispense commands and reports `DONE`,
//!   `ERR` and `STK:` lines.
//!
//! ```text
//! reader      ──> ID: A1B2C3D4\r\n
//! controller  ──> PID:<b0><b1><b2><b3>
//! host        ──> MED:A0B2C0D0E1\n
//! controller  ──> DONE\n
//! host        ──> END\n
//! controller  ──> STK:01000\n
//! ```
//!
//! # Usage
//!
//! ```
//! use medispense_core::constants::*;
//!
//! assert_eq!(DEFAULT_BAUD_RATE, 115_200);
//! assert_eq!(ID_SENTINEL, "ID:");
//! ```

// ============================================================================
// Serial Link
// ============================================================================

/// Fixed baud rate for every device on the dispenser serial link.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default serial device path on the kiosk host.
pub const DEFAULT_SERIAL_PORT: &str = "/dev/serial0";

/// Default read poll interval in milliseconds.
///
/// A single transport read never blocks longer than this, which bounds how
/// long a cancelled scan takes to observe its cancellation flag.
pub const DEFAULT_READ_POLL_MS: u64 = 100;

// ============================================================================
// Card Reader Frames
// ============================================================================

/// Marker preceding the identifier in a text frame.
pub const ID_SENTINEL: &str = "ID:";

/// Trigger written to the card reader to begin a read.
pub const READER_TRIGGER: &[u8] = b"S";

/// Minimum identifier length (in characters) after trimming.
pub const MIN_IDENTIFIER_LENGTH: usize = 8;

// ============================================================================
// Dispenser Controller
// ============================================================================

/// Marker preceding the raw UID bytes in a controller frame.
pub const PID_SENTINEL: &str = "PID:";

/// Number of raw UID bytes following [`PID_SENTINEL`].
pub const PID_UID_BYTES: usize = 4;

/// Trigger written to the controller to begin a card read.
pub const CONTROLLER_TRIGGER: &[u8] = b"START\n";

/// Written to the controller to end a card read or request a stock report.
pub const CONTROLLER_END: &[u8] = b"END\n";

/// Controller card-read timeout in milliseconds.
pub const CONTROLLER_SCAN_TIMEOUT_MS: u64 = 10_000;

/// Dispense command prefix.
pub const DISPENSE_PREFIX: &str = "MED:";

/// Stock report prefix.
pub const STOCK_PREFIX: &str = "STK:";

/// Controller token reporting a completed dispense.
pub const RESPONSE_DONE: &str = "DONE";

/// Controller token reporting a rejected command.
pub const RESPONSE_ERR: &str = "ERR";

/// Overall dispense exchange timeout in milliseconds.
pub const DISPENSE_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// Kiosk
// ============================================================================

/// Card identifier that opens the monitoring dashboard instead of a patient
/// record.
pub const DEFAULT_ADMIN_ID: &str = "E2FA4206";

/// Default dispenser machine document id.
pub const DEFAULT_MACHINE_ID: &str = "MED-001";

/// Number of medicine slots in the dispenser.
pub const SLOT_COUNT: usize = 5;
