//! Refill alerts from stock sensor updates.

use medispense_core::Medicine;
use medispense_protocol::StockSnapshot;
use tracing::info;

/// Tracks the last stock snapshot and reports slots that just ran empty.
///
/// Starts from "everything available", so slots already empty in the first
/// observed snapshot are reported once.
///
/// # Example
///
/// ```
/// use medispense_core::Medicine;
/// use medispense_kiosk::StockMonitor;
/// use medispense_protocol::StockSnapshot;
///
/// let mut monitor = StockMonitor::new();
/// let empty_b = StockSnapshot::from_bitmap("00010").unwrap();
///
/// assert_eq!(monitor.observe(empty_b), vec![Medicine::Paracetamol]);
/// assert!(monitor.observe(empty_b).is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StockMonitor {
    last: StockSnapshot,
}

impl StockMonitor {
    /// Monitor assuming every slot is stocked.
    pub fn new() -> Self {
        Self::default()
    }

    /// Monitor starting from a known snapshot.
    pub fn with_snapshot(last: StockSnapshot) -> Self {
        Self { last }
    }

    /// Record a new snapshot and return medicines that just ran empty.
    pub fn observe(&mut self, next: StockSnapshot) -> Vec<Medicine> {
        let empty: Vec<Medicine> = self
            .last
            .newly_empty(&next)
            .into_iter()
            .map(|slot| slot.medicine())
            .collect();

        for medicine in &empty {
            info!(medicine = %medicine, slot = %medicine.slot(), "Refill needed");
        }
        self.last = next;
        empty
    }

    /// Last observed snapshot.
    pub fn last(&self) -> &StockSnapshot {
        &self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(bitmap: &str) -> StockSnapshot {
        StockSnapshot::from_bitmap(bitmap).unwrap()
    }

    #[test]
    fn test_alerts_fire_once_per_transition() {
        let mut monitor = StockMonitor::new();
        assert!(monitor.observe(snapshot("00000")).is_empty());

        assert_eq!(
            monitor.observe(snapshot("10001")),
            vec![Medicine::BromhexineHcl, Medicine::Ceterizine]
        );
        assert!(monitor.observe(snapshot("10001")).is_empty());

        // Refilled, then empty again.
        assert!(monitor.observe(snapshot("00001")).is_empty());
        assert_eq!(monitor.observe(snapshot("10001")), vec![Medicine::Ceterizine]);
    }

    #[test]
    fn test_with_snapshot_suppresses_known_empties() {
        let mut monitor = StockMonitor::with_snapshot(snapshot("01000"));
        assert!(monitor.observe(snapshot("01000")).is_empty());
        assert_eq!(monitor.last(), &snapshot("01000"));
    }
}
