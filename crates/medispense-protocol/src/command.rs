//! Host-to-dispenser commands.
//!
//! The dispenser controller accepts three newline-terminated commands:
//!
//! | Command | Wire form | Meaning |
//! |---|---|---|
//! | [`HostCommand::Start`] | `START\n` | begin a card read |
//! | [`HostCommand::Dispense`] | `MED:A1B0C2D0E0\n` | dispense per-slot counts |
//! | [`HostCommand::End`] | `END\n` | stand down, report stock |

use std::fmt;
use std::str::FromStr;

use medispense_core::constants::{CONTROLLER_END, CONTROLLER_TRIGGER, DISPENSE_PREFIX, SLOT_COUNT};
use medispense_core::{Error, Medication, Result, Slot};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Per-slot dispense counts.
///
/// # Example
///
/// ```
/// use medispense_core::{Medication, Medicine};
/// use medispense_protocol::DispenseCommand;
///
/// let meds = vec![
///     Medication::new(Medicine::Paracetamol, 2, "3x daily"),
///     Medication::new(Medicine::Ceterizine, 1, "1x daily"),
/// ];
/// let command = DispenseCommand::from_medications(&meds);
/// assert_eq!(command.to_string(), "MED:A0B2C0D0E1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DispenseCommand {
    counts: [u32; SLOT_COUNT],
}

impl DispenseCommand {
    /// Command that dispenses nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum quantities per slot over a visit's medications.
    ///
    /// Medications whose name is not in the catalog are skipped.
    pub fn from_medications(medications: &[Medication]) -> Self {
        let mut command = Self::new();
        for medication in medications {
            match medication.medicine() {
                Some(medicine) => command.add(medicine.slot(), medication.quantity),
                None => trace!(name = %medication.medicine_name, "Skipping unknown medicine"),
            }
        }
        command
    }

    /// Add `quantity` units to a slot.
    pub fn add(&mut self, slot: Slot, quantity: u32) {
        let count = &mut self.counts[slot.index()];
        *count = count.saturating_add(quantity);
    }

    /// Units requested from a slot.
    pub fn count(&self, slot: Slot) -> u32 {
        self.counts[slot.index()]
    }

    /// Total units requested.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Check whether no units are requested.
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Wire bytes including the trailing newline.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut wire = self.to_string().into_bytes();
        wire.push(b'\n');
        wire
    }
}

impl fmt::Display for DispenseCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(DISPENSE_PREFIX)?;
        for slot in Slot::ALL {
            write!(f, "{}{}", slot.letter(), self.count(slot))?;
        }
        Ok(())
    }
}

impl FromStr for DispenseCommand {
    type Err = Error;

    /// Parse `MED:A{a}B{b}C{c}D{d}E{e}`, slots in order, one count each.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidDispenseCommand(format!("{s:?}: {reason}"));

        let mut rest = s
            .trim_end_matches(['\r', '\n'])
            .strip_prefix(DISPENSE_PREFIX)
            .ok_or_else(|| invalid("missing prefix"))?;

        let mut command = Self::new();
        for slot in Slot::ALL {
            rest = rest
                .strip_prefix(slot.letter())
                .ok_or_else(|| invalid("slots out of order"))?;
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            let count = rest[..digits]
                .parse::<u32>()
                .map_err(|_| invalid("bad count"))?;
            command.counts[slot.index()] = count;
            rest = &rest[digits..];
        }

        if !rest.is_empty() {
            return Err(invalid("trailing bytes"));
        }
        Ok(command)
    }
}

/// Command sent from the host to the dispenser controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    /// Begin a card read.
    Start,
    /// Dispense medicine.
    Dispense(DispenseCommand),
    /// Stand down and report stock.
    End,
}

impl HostCommand {
    /// Wire bytes including the trailing newline.
    pub fn to_wire(&self) -> Vec<u8> {
        match self {
            Self::Start => CONTROLLER_TRIGGER.to_vec(),
            Self::Dispense(command) => command.to_wire(),
            Self::End => CONTROLLER_END.to_vec(),
        }
    }
}

impl From<DispenseCommand> for HostCommand {
    fn from(command: DispenseCommand) -> Self {
        Self::Dispense(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medispense_core::Medicine;
    use rstest::rstest;

    fn med(name: &str, quantity: u32) -> Medication {
        Medication {
            medicine_name: name.to_string(),
            dosage: String::new(),
            quantity,
            frequency: String::new(),
        }
    }

    #[test]
    fn test_sums_per_slot() {
        let meds = vec![
            med("Paracetamol", 2),
            med("Bromhexine HCL", 1),
            med("Paracetamol", 3),
            med("Loperamide", 4),
        ];
        let command = DispenseCommand::from_medications(&meds);
        assert_eq!(command.to_string(), "MED:A1B5C0D4E0");
        assert_eq!(command.total(), 10);
    }

    #[test]
    fn test_unknown_medicine_ignored() {
        let meds = vec![med("Aspirin", 9), med("Ceterizine", 1)];
        let command = DispenseCommand::from_medications(&meds);
        assert_eq!(command.to_string(), "MED:A0B0C0D0E1");
    }

    #[test]
    fn test_empty_command() {
        let command = DispenseCommand::from_medications(&[]);
        assert!(command.is_empty());
        assert_eq!(command.to_wire(), b"MED:A0B0C0D0E0\n");
    }

    #[test]
    fn test_add_saturates() {
        let mut command = DispenseCommand::new();
        command.add(Slot::C, u32::MAX);
        command.add(Slot::C, 1);
        assert_eq!(command.count(Slot::C), u32::MAX);
    }

    #[test]
    fn test_parse_wire_form() {
        let command: DispenseCommand = "MED:A1B12C0D3E0\n".parse().unwrap();
        assert_eq!(command.count(Slot::A), 1);
        assert_eq!(command.count(Slot::B), 12);
        assert_eq!(command.count(Medicine::Loperamide.slot()), 3);
    }

    #[rstest]
    #[case("A1B0C0D0E0")]
    #[case("MED:B0A1C0D0E0")]
    #[case("MED:A1B0C0D0")]
    #[case("MED:A1B0C0D0E0X")]
    #[case("MED:AxB0C0D0E0")]
    fn test_parse_rejects(#[case] input: &str) {
        assert!(matches!(
            input.parse::<DispenseCommand>(),
            Err(Error::InvalidDispenseCommand(_))
        ));
    }

    #[test]
    fn test_host_command_wire() {
        assert_eq!(HostCommand::Start.to_wire(), b"START\n");
        assert_eq!(HostCommand::End.to_wire(), b"END\n");

        let mut command = DispenseCommand::new();
        command.add(Slot::E, 2);
        assert_eq!(HostCommand::from(command).to_wire(), b"MED:A0B0C0D0E2\n");
    }
}
