//! Stock sensor bitmap reported by the dispenser.
//!
//! After a dispense the controller reports its IR stock sensors as a string
//! of `0`/`1` characters following `STK:`. Characters map to slots in
//! reverse order:
//!
//! ```text
//! STK:01000
//!     │││││
//!     EDCBA      0 = stock available, 1 = refill needed
//! ```
//!
//! A short payload only reports the leading slots (`STK:01` covers E and D).
//! Bits past the fifth are ignored.

use std::collections::BTreeMap;
use std::fmt;

use medispense_core::constants::SLOT_COUNT;
use medispense_core::{Error, Result, Slot, StockLevel};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Slot order of bitmap characters.
pub const BITMAP_ORDER: [Slot; SLOT_COUNT] = [Slot::E, Slot::D, Slot::C, Slot::B, Slot::A];

/// Sensor readings from one `STK:` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockReport {
    readings: Vec<(Slot, StockLevel)>,
}

impl StockReport {
    /// Parse a bitmap payload (without the `STK:` prefix).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStockBitmap`] if the payload is empty or one of
    /// its first five characters is not `0` or `1`. Anything after the fifth
    /// character is ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use medispense_core::{Slot, StockLevel};
    /// use medispense_protocol::StockReport;
    ///
    /// let report = StockReport::parse("01000").unwrap();
    /// assert_eq!(report.level(Slot::D), Some(StockLevel::RefillNeeded));
    /// assert_eq!(report.level(Slot::A), Some(StockLevel::Available));
    /// ```
    pub fn parse(payload: &str) -> Result<Self> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(Error::InvalidStockBitmap(
                "expected at least one sensor bit".to_string(),
            ));
        }

        let cut = payload
            .char_indices()
            .nth(SLOT_COUNT)
            .map_or(payload.len(), |(index, _)| index);
        let (bits, extra) = payload.split_at(cut);
        if !extra.is_empty() {
            debug!(extra = %extra, "Ignoring sensor bits past the last slot");
        }

        let readings = bits
            .chars()
            .zip(BITMAP_ORDER)
            .map(|(bit, slot)| {
                let level = match bit {
                    '0' => StockLevel::Available,
                    '1' => StockLevel::RefillNeeded,
                    other => {
                        return Err(Error::InvalidStockBitmap(format!(
                            "bad sensor bit {other:?} in {payload:?}"
                        )));
                    }
                };
                Ok((slot, level))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { readings })
    }

    /// Reading for a slot, if the report covers it.
    pub fn level(&self, slot: Slot) -> Option<StockLevel> {
        self.readings
            .iter()
            .find_map(|&(s, level)| (s == slot).then_some(level))
    }

    /// All readings, in bitmap order.
    pub fn readings(&self) -> &[(Slot, StockLevel)] {
        &self.readings
    }

    /// Check whether every slot is covered.
    pub fn is_complete(&self) -> bool {
        self.readings.len() == SLOT_COUNT
    }
}

impl fmt::Display for StockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &(_, level) in &self.readings {
            f.write_str(if level.needs_refill() { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Stock level of every slot, as stored on `sensor/status`.
///
/// Serializes as a map of slot letter to `0`/`1`.
///
/// # Example
///
/// ```
/// use medispense_core::Slot;
/// use medispense_protocol::{StockReport, StockSnapshot};
///
/// let before = StockSnapshot::default();
/// let mut after = before;
/// after.apply(&StockReport::parse("00011").unwrap());
///
/// assert_eq!(before.newly_empty(&after), vec![Slot::A, Slot::B]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "BTreeMap<Slot, StockLevel>", from = "BTreeMap<Slot, StockLevel>")]
pub struct StockSnapshot {
    levels: [StockLevel; SLOT_COUNT],
}

impl StockSnapshot {
    /// Parse a complete five-bit bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStockBitmap`] unless every slot is covered.
    pub fn from_bitmap(payload: &str) -> Result<Self> {
        let report = StockReport::parse(payload)?;
        if !report.is_complete() {
            return Err(Error::InvalidStockBitmap(format!(
                "expected {SLOT_COUNT} sensor bits, got {payload:?}"
            )));
        }
        let mut snapshot = Self::default();
        snapshot.apply(&report);
        Ok(snapshot)
    }

    /// Stock level of a slot.
    pub fn level(&self, slot: Slot) -> StockLevel {
        self.levels[slot.index()]
    }

    /// Set the stock level of a slot.
    pub fn set(&mut self, slot: Slot, level: StockLevel) {
        self.levels[slot.index()] = level;
    }

    /// Overwrite the slots covered by `report`.
    pub fn apply(&mut self, report: &StockReport) {
        for &(slot, level) in report.readings() {
            self.set(slot, level);
        }
    }

    /// Slots that need a refill, in slot order.
    pub fn refill_needed(&self) -> Vec<Slot> {
        Slot::ALL
            .into_iter()
            .filter(|&slot| self.level(slot).needs_refill())
            .collect()
    }

    /// Slots that went from available here to refill needed in `next`.
    pub fn newly_empty(&self, next: &StockSnapshot) -> Vec<Slot> {
        Slot::ALL
            .into_iter()
            .filter(|&slot| !self.level(slot).needs_refill() && next.level(slot).needs_refill())
            .collect()
    }

    /// Bitmap in controller order (E..A).
    pub fn to_bitmap(&self) -> String {
        BITMAP_ORDER
            .iter()
            .map(|&slot| if self.level(slot).needs_refill() { '1' } else { '0' })
            .collect()
    }
}

impl From<StockSnapshot> for BTreeMap<Slot, StockLevel> {
    fn from(snapshot: StockSnapshot) -> Self {
        Slot::ALL
            .into_iter()
            .map(|slot| (slot, snapshot.level(slot)))
            .collect()
    }
}

impl From<BTreeMap<Slot, StockLevel>> for StockSnapshot {
    /// Missing slots read as available.
    fn from(map: BTreeMap<Slot, StockLevel>) -> Self {
        let mut snapshot = Self::default();
        for (slot, level) in map {
            snapshot.set(slot, level);
        }
        snapshot
    }
}
