//! Status messages shown on the kiosk screen.
//!
//! The kiosk front-end renders these verbatim in its status page, so they
//! stay short and in plain English.
//!
//! # Usage
//!
//! ```
//! use medispense_kiosk::messages::StatusMessages;
//!
//! assert_eq!(StatusMessages::ADMIN_GRANTED, "Admin access granted.");
//! ```

/// User-facing kiosk messages.
pub struct StatusMessages;

impl StatusMessages {
    /// No card presented before the controller timed out.
    pub const SCAN_TIMEOUT: &'static str = "Hardware Timeout: No card detected.";

    /// Administrator card scanned.
    pub const ADMIN_GRANTED: &'static str = "Admin access granted.";

    /// Card scanned but not linked to a patient.
    pub const UNREGISTERED: &'static str = "ID not registered.";

    /// Patient has no visits on record.
    pub const NO_PRESCRIPTIONS: &'static str = "No valid prescriptions.";

    /// Prescription lookup without patient or date.
    pub const MISSING_VISIT_ARGS: &'static str = "Missing Patient ID or Visit Date.";

    /// Dispense request without patient or date.
    pub const MISSING_DISPENSE_ARGS: &'static str = "Missing ID or Date.";

    /// Dispense requested for a visit that does not exist.
    pub const PRESCRIPTION_NOT_FOUND: &'static str = "Prescription not found.";

    /// Controller answered `ERR`.
    pub const DISPENSER_REJECTED: &'static str = "FPGA returned ERR: Command rejected.";

    /// Controller never answered `DONE`.
    pub const DISPENSER_TIMEOUT: &'static str = "Hardware Timeout: 'DONE' not received.";

    /// Medicine handed out.
    pub const DISPENSE_SUCCESS: &'static str = "Medicine dispensed successfully!";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_non_empty() {
        for message in [
            StatusMessages::SCAN_TIMEOUT,
            StatusMessages::ADMIN_GRANTED,
            StatusMessages::UNREGISTERED,
            StatusMessages::NO_PRESCRIPTIONS,
            StatusMessages::MISSING_VISIT_ARGS,
            StatusMessages::MISSING_DISPENSE_ARGS,
            StatusMessages::PRESCRIPTION_NOT_FOUND,
            StatusMessages::DISPENSER_REJECTED,
            StatusMessages::DISPENSER_TIMEOUT,
            StatusMessages::DISPENSE_SUCCESS,
        ] {
            assert!(!message.trim().is_empty());
        }
    }
}
