//! Symbol rating engine.
//!
//! Rates stocks on the volume's deviation from the previous days combined
//! with price momentum over the same window, then keeps the best-scoring
//! names. Symbols with short, stale, out-of-range, or degenerate windows
//! are excluded silently.

use chrono::{DateTime, Utc};
use overnight_core::error::{DataError, TradingError};
use overnight_core::traits::MarketData;
use overnight_core::types::{BarWindow, Rating, RatingSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::stats;

/// Configuration for the rating engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Maximum number of symbols kept in a rating set
    pub stocks_to_hold: usize,
    /// Number of daily bars in a scoring window
    pub window_size: usize,
    /// Maximum symbols per bar request (data API constraint)
    pub batch_size: usize,
    /// Lowest latest-close price eligible for rating
    pub min_stock_price: f64,
    /// Highest latest-close price eligible for rating
    pub max_stock_price: f64,
    /// Maximum whole days the latest bar may lag the as-of time
    pub max_staleness_days: i64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            stocks_to_hold: 50,
            window_size: 5,
            batch_size: 200,
            min_stock_price: 20.0,
            max_stock_price: 50.0,
            max_staleness_days: 1,
        }
    }
}

impl RatingConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), TradingError> {
        if self.stocks_to_hold == 0 {
            return Err(TradingError::Config(
                "stocks_to_hold must be greater than 0".into(),
            ));
        }
        if self.window_size < 3 {
            return Err(TradingError::Config(
                "window_size must be at least 3 to compute a volume deviation".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(TradingError::Config(
                "batch_size must be greater than 0".into(),
            ));
        }
        if self.min_stock_price >= self.max_stock_price {
            return Err(TradingError::Config(
                "min_stock_price must be below max_stock_price".into(),
            ));
        }
        Ok(())
    }
}

/// Rates candidate symbols against daily-bar windows from a data source.
pub struct RatingEngine {
    config: RatingConfig,
    data: Arc<dyn MarketData>,
}

impl RatingEngine {
    /// Create a new rating engine.
    pub fn new(config: RatingConfig, data: Arc<dyn MarketData>) -> Result<Self, TradingError> {
        config.validate()?;
        Ok(Self { config, data })
    }

    /// The engine's configuration.
    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    /// Rate the candidate symbols as of the given time (`None` means "use
    /// live/latest data") and return the top scorers.
    ///
    /// Candidates that are not currently tradable are dropped up front;
    /// candidates whose windows fail a quality check are excluded without
    /// surfacing an error. An empty candidate list yields an empty set.
    pub async fn compute_ratings(
        &self,
        candidates: &[String],
        as_of: Option<DateTime<Utc>>,
    ) -> Result<RatingSet, DataError> {
        if candidates.is_empty() {
            return Ok(RatingSet::default());
        }

        let assets = self.data.list_assets().await?;
        let tradable: HashSet<&str> = assets
            .iter()
            .filter(|a| a.tradable)
            .map(|a| a.symbol.as_str())
            .collect();
        let symbols: Vec<String> = candidates
            .iter()
            .filter(|s| tradable.contains(s.as_str()))
            .cloned()
            .collect();

        let mut ratings = Vec::new();
        for batch in symbols.chunks(self.config.batch_size) {
            let barsets = self
                .data
                .daily_bars(batch, self.config.window_size, as_of)
                .await?;

            for symbol in batch {
                let Some(bars) = barsets.get(symbol) else {
                    continue;
                };
                let window = BarWindow::new(symbol.clone(), bars.clone());
                if let Some(rating) = self.rate_window(&window, as_of) {
                    ratings.push(rating);
                }
            }
        }

        debug!(
            candidates = symbols.len(),
            rated = ratings.len(),
            "rating pass complete"
        );
        Ok(RatingSet::from_unsorted(ratings, self.config.stocks_to_hold))
    }

    /// Score a single symbol window. Returns `None` when the window fails a
    /// quality check or the blended score is not positive.
    pub fn rate_window(&self, window: &BarWindow, as_of: Option<DateTime<Utc>>) -> Option<Rating> {
        if window.len() != self.config.window_size {
            return None;
        }

        let first = window.first()?;
        let latest = window.latest()?;

        // Make sure we aren't missing the most recent data.
        let reference = as_of.unwrap_or_else(Utc::now);
        let gap_days = (reference - latest.datetime()).num_days();
        if gap_days > self.config.max_staleness_days {
            debug!(symbol = %window.symbol, gap_days, "stale window, skipping");
            return None;
        }

        let price = latest.close;
        if price < self.config.min_stock_price || price > self.config.max_stock_price {
            return None;
        }

        let volumes = window.volumes();
        let past_volumes = &volumes[..volumes.len() - 1];
        let volume_stdev = stats::sample_stdev(past_volumes)?;
        if volume_stdev == 0.0 {
            // The data for the stock might be low quality.
            debug!(symbol = %window.symbol, "zero volume variance, skipping");
            return None;
        }

        let price_change = price - first.close;
        let volume_change = latest.volume - volumes[volumes.len() - 2];
        let volume_factor = volume_change / volume_stdev;

        // Momentum over the window times volume standard deviations since
        // yesterday, then weighted a little more toward the price change.
        let raw = price_change / first.close * volume_factor;
        let score = 0.5 * raw + 0.5 * price_change;

        (score > 0.0).then(|| Rating {
            symbol: window.symbol.clone(),
            score,
            price,
        })
    }
}
