//! Medicine catalog and dispenser slots.
//!
//! The dispenser has five slots, labelled `A` through `E`, each loaded with a
//! single medicine. Prescriptions reference medicines by display name, so
//! the catalog maps names to slots and to the default dosage offered by the
//! doctor portal.

use crate::{Result, constants::SLOT_COUNT, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dispenser slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    A,
    B,
    C,
    D,
    E,
}

impl Slot {
    /// All slots in label order.
    pub const ALL: [Slot; SLOT_COUNT] = [Slot::A, Slot::B, Slot::C, Slot::D, Slot::E];

    /// Zero-based position of the slot in label order.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Slot label as a single character.
    #[must_use]
    pub fn letter(self) -> char {
        match self {
            Slot::A => 'A',
            Slot::B => 'B',
            Slot::C => 'C',
            Slot::D => 'D',
            Slot::E => 'E',
        }
    }

    /// Medicine loaded in this slot.
    #[must_use]
    pub fn medicine(self) -> Medicine {
        match self {
            Slot::A => Medicine::BromhexineHcl,
            Slot::B => Medicine::Paracetamol,
            Slot::C => Medicine::MefenamicAcid,
            Slot::D => Medicine::Loperamide,
            Slot::E => Medicine::Ceterizine,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl TryFrom<char> for Slot {
    type Error = Error;

    fn try_from(c: char) -> Result<Self> {
        match c.to_ascii_uppercase() {
            'A' => Ok(Slot::A),
            'B' => Ok(Slot::B),
            'C' => Ok(Slot::C),
            'D' => Ok(Slot::D),
            'E' => Ok(Slot::E),
            other => Err(Error::InvalidSlot(other.to_string())),
        }
    }
}

/// Medicine stocked by the dispenser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Medicine {
    BromhexineHcl,
    Paracetamol,
    MefenamicAcid,
    Loperamide,
    Ceterizine,
}

impl Medicine {
    /// All medicines in slot order.
    pub const ALL: [Medicine; SLOT_COUNT] = [
        Medicine::BromhexineHcl,
        Medicine::Paracetamol,
        Medicine::MefenamicAcid,
        Medicine::Loperamide,
        Medicine::Ceterizine,
    ];

    /// Display name, as written in prescriptions.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Medicine::BromhexineHcl => "Bromhexine HCL",
            Medicine::Paracetamol => "Paracetamol",
            Medicine::MefenamicAcid => "Mefenamic Acid",
            Medicine::Loperamide => "Loperamide",
            Medicine::Ceterizine => "Ceterizine",
        }
    }

    /// Slot the medicine is loaded in.
    #[must_use]
    pub fn slot(self) -> Slot {
        match self {
            Medicine::BromhexineHcl => Slot::A,
            Medicine::Paracetamol => Slot::B,
            Medicine::MefenamicAcid => Slot::C,
            Medicine::Loperamide => Slot::D,
            Medicine::Ceterizine => Slot::E,
        }
    }

    /// Dosage pre-filled when the medicine is selected in the portal.
    #[must_use]
    pub fn default_dosage(self) -> &'static str {
        match self {
            Medicine::BromhexineHcl => "8mg",
            Medicine::Paracetamol => "500mg",
            Medicine::MefenamicAcid => "250mg",
            Medicine::Loperamide => "2mg",
            Medicine::Ceterizine => "10mg",
        }
    }

    /// Look up a medicine by its exact display name.
    ///
    /// # Examples
    ///
    /// ```
    /// use medispense_core::{Medicine, Slot};
    ///
    /// let med = Medicine::from_name("Paracetamol").unwrap();
    /// assert_eq!(med.slot(), Slot::B);
    /// assert!(Medicine::from_name("Aspirin").is_none());
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl fmt::Display for Medicine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Medicine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::UnknownMedicine(s.to_string()))
    }
}

/// Stock sensor reading for one slot.
///
/// The IR sensors report `0` while medicine is present and `1` once the slot
/// runs empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum StockLevel {
    #[default]
    Available,
    RefillNeeded,
}

impl StockLevel {
    /// Check whether the slot needs a refill.
    #[must_use]
    pub fn needs_refill(self) -> bool {
        matches!(self, StockLevel::RefillNeeded)
    }
}

impl From<StockLevel> for u8 {
    fn from(level: StockLevel) -> Self {
        match level {
            StockLevel::Available => 0,
            StockLevel::RefillNeeded => 1,
        }
    }
}

impl TryFrom<u8> for StockLevel {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(StockLevel::Available),
            1 => Ok(StockLevel::RefillNeeded),
            other => Err(Error::InvalidStockBitmap(format!(
                "stock level must be 0 or 1, got {other}"
            ))),
        }
    }
}
