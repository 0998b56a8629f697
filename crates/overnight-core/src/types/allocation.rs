//! Target position allocations derived from a rating set and cash.

use serde::{Deserialize, Serialize};

/// Target position for one symbol: whole shares to buy and the ceiling
/// price the order is willing to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationEntry {
    /// Symbol identifier
    pub symbol: String,
    /// Whole shares to buy
    pub shares: u64,
    /// Limit price in whole dollars. A deliberately loose cap (1.5x the
    /// rated price) meant to avoid missing fills on a fast-moving price,
    /// not a fill estimate.
    pub limit_price: u64,
}

/// A full set of sized positions, in rating order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Allocation {
    entries: Vec<AllocationEntry>,
}

impl Allocation {
    /// Create an allocation from sized entries.
    pub fn new(entries: Vec<AllocationEntry>) -> Self {
        Self { entries }
    }

    /// Number of sized positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing was sized.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, in rating order.
    pub fn entries(&self) -> &[AllocationEntry] {
        &self.entries
    }

    /// Select the dominant allocation: the single entry with the maximum
    /// computed share count. Ties keep the earlier (better-rated) entry.
    ///
    /// Only this entry is ever acted on; the rest of the allocation is
    /// computed but not bought. This materially changes the strategy from
    /// "buy a basket" to "buy one symbol" and is kept as a separate step so
    /// the policy can be revisited at the call sites.
    pub fn dominant(&self) -> Option<&AllocationEntry> {
        self.entries
            .iter()
            .reduce(|best, entry| if entry.shares > best.shares { entry } else { best })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(symbol: &str, shares: u64) -> AllocationEntry {
        AllocationEntry {
            symbol: symbol.to_string(),
            shares,
            limit_price: 45,
        }
    }

    #[test]
    fn test_dominant_picks_max_shares() {
        let allocation = Allocation::new(vec![entry("A", 10), entry("B", 40), entry("C", 25)]);
        assert_eq!(allocation.dominant().unwrap().symbol, "B");
    }

    #[test]
    fn test_dominant_tie_keeps_better_rated() {
        let allocation = Allocation::new(vec![entry("A", 40), entry("B", 40)]);
        assert_eq!(allocation.dominant().unwrap().symbol, "A");
    }

    #[test]
    fn test_dominant_empty() {
        assert!(Allocation::default().dominant().is_none());
    }
}
