//! Position sizing.
//!
//! Splits available cash across a rating set proportionally to score,
//! rounding down to whole shares, and caps each order with a loose limit
//! price so a fast-moving fill is not missed.

use overnight_core::error::SizingError;
use overnight_core::types::{Allocation, AllocationEntry, RatingSet};
use serde::{Deserialize, Serialize};

/// Configuration for the position sizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Multiplier applied to the rated price to form the limit price cap
    pub limit_price_multiplier: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            limit_price_multiplier: 1.5,
        }
    }
}

/// Sizes positions from a rating set and an available cash amount.
#[derive(Debug, Clone, Default)]
pub struct PositionSizer {
    config: SizingConfig,
}

impl PositionSizer {
    /// Create a new position sizer.
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    /// Compute target share counts and limit prices for every rating.
    ///
    /// Each symbol receives `score / total_score` of the cash, floored to
    /// whole shares, so the combined cost never exceeds `cash`.
    ///
    /// # Errors
    /// `SizingError::InvalidAllocationInput` when the rating set is empty
    /// or its total score is not positive; sizing is undefined there and
    /// must not degrade into a silent divide-by-zero.
    pub fn allocate(&self, ratings: &RatingSet, cash: f64) -> Result<Allocation, SizingError> {
        let total_score = ratings.total_score();
        if ratings.is_empty() || total_score <= 0.0 {
            return Err(SizingError::InvalidAllocationInput { total_score });
        }
        if cash <= 0.0 {
            return Err(SizingError::NonPositiveCash { cash });
        }

        let entries = ratings
            .iter()
            .map(|rating| AllocationEntry {
                symbol: rating.symbol.clone(),
                shares: (rating.score / total_score * cash / rating.price).floor() as u64,
                limit_price: (rating.price * self.config.limit_price_multiplier).floor() as u64,
            })
            .collect();

        Ok(Allocation::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overnight_core::types::Rating;
    use proptest::prelude::*;

    fn rating(symbol: &str, score: f64, price: f64) -> Rating {
        Rating {
            symbol: symbol.to_string(),
            score,
            price,
        }
    }

    fn sizer() -> PositionSizer {
        PositionSizer::new(SizingConfig::default())
    }

    #[test]
    fn test_single_rating_gets_all_cash() {
        let ratings = RatingSet::from_unsorted(vec![rating("A", 2.0, 25.0)], 50);
        let allocation = sizer().allocate(&ratings, 10_000.0).unwrap();

        let entry = &allocation.entries()[0];
        assert_eq!(entry.shares, 400);
        assert_eq!(entry.limit_price, 37); // floor(25 * 1.5)
    }

    #[test]
    fn test_proportional_split() {
        let ratings = RatingSet::from_unsorted(
            vec![rating("A", 3.0, 30.0), rating("B", 1.0, 20.0)],
            50,
        );
        let allocation = sizer().allocate(&ratings, 8_000.0).unwrap();

        // A gets 3/4 of the cash at $30, B gets 1/4 at $20.
        assert_eq!(allocation.entries()[0].shares, 200);
        assert_eq!(allocation.entries()[1].shares, 100);
    }

    #[test]
    fn test_empty_rating_set_fails() {
        let err = sizer().allocate(&RatingSet::default(), 10_000.0).unwrap_err();
        assert!(matches!(
            err,
            SizingError::InvalidAllocationInput { total_score } if total_score == 0.0
        ));
    }

    #[test]
    fn test_non_positive_cash_fails() {
        let ratings = RatingSet::from_unsorted(vec![rating("A", 2.0, 25.0)], 50);
        assert!(matches!(
            sizer().allocate(&ratings, 0.0),
            Err(SizingError::NonPositiveCash { .. })
        ));
    }

    proptest! {
        /// The allocation never overspends the cash it was sized against,
        /// whatever the score/price mix.
        #[test]
        fn prop_never_overspends(
            scores in proptest::collection::vec(0.001f64..100.0, 1..50),
            prices in proptest::collection::vec(20.0f64..50.0, 50),
            cash in 100.0f64..1e7,
        ) {
            let ratings: Vec<Rating> = scores
                .iter()
                .zip(&prices)
                .enumerate()
                .map(|(i, (&score, &price))| rating(&format!("S{i}"), score, price))
                .collect();
            let set = RatingSet::from_unsorted(ratings, 50);

            let allocation = sizer().allocate(&set, cash).unwrap();
            let spent: f64 = allocation
                .entries()
                .iter()
                .zip(set.iter())
                .map(|(entry, rating)| entry.shares as f64 * rating.price)
                .sum();

            prop_assert!(spent <= cash * (1.0 + 1e-9));
        }
    }
}
