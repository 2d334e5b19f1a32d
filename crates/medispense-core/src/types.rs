use crate::{Result, constants::MIN_IDENTIFIER_LENGTH, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Card identifier read from a patient or admin RFID card.
///
/// Identifiers are trimmed and uppercased on construction and must be at
/// least [`MIN_IDENTIFIER_LENGTH`] characters long. Patient records are keyed
/// by this value.
///
/// # Security
/// Comparison is constant-time, since the admin card is recognized by
/// comparing identifiers.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardId(String);

impl CardId {
    /// Create a new card identifier with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardId` if the trimmed value is shorter than
    /// [`MIN_IDENTIFIER_LENGTH`] characters.
    ///
    /// # Examples
    ///
    /// ```
    /// use medispense_core::CardId;
    ///
    /// let id = CardId::new("  a1b2c3d4 ").unwrap();
    /// assert_eq!(id.as_str(), "A1B2C3D4");
    ///
    /// assert!(CardId::new("123").is_err());
    /// ```
    pub fn new(value: &str) -> Result<Self> {
        let value = value.trim().to_uppercase();

        let len = value.chars().count();
        if len < MIN_IDENTIFIER_LENGTH {
            return Err(Error::InvalidCardId(format!(
                "identifier must be at least {MIN_IDENTIFIER_LENGTH} chars, got {len}"
            )));
        }

        Ok(CardId(value))
    }

    /// Build an identifier from raw UID bytes, rendered as uppercase hex.
    ///
    /// # Examples
    ///
    /// ```
    /// use medispense_core::CardId;
    ///
    /// let id = CardId::from_uid_bytes(&[0xE2, 0xFA, 0x42, 0x06]).unwrap();
    /// assert_eq!(id.as_str(), "E2FA4206");
    /// ```
    pub fn from_uid_bytes(uid: &[u8]) -> Result<Self> {
        let hex: String = uid.iter().map(|b| format!("{b:02X}")).collect();
        Self::new(&hex)
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identifier and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CardId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CardId::new(s)
    }
}

impl TryFrom<String> for CardId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        CardId::new(&value)
    }
}

impl From<CardId> for String {
    fn from(id: CardId) -> Self {
        id.0
    }
}

/// Constant-time comparison implementation for CardId
impl PartialEq for CardId {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for CardId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}
