//! Daily OHLCV bar types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One day's aggregated open/high/low/close/volume for a symbol.
/// Uses f64 for fast scoring arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume
    pub volume: f64,
}

impl Bar {
    /// Create a new bar.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Get the timestamp as a DateTime.
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp)
            .unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
    }
}

/// A fixed-length ordered sequence of consecutive daily bars for one symbol,
/// ending at or before some cutoff. The scoring window of the strategy.
#[derive(Debug, Clone)]
pub struct BarWindow {
    /// Symbol identifier
    pub symbol: String,
    bars: Vec<Bar>,
}

impl BarWindow {
    /// Create a window from bars ordered oldest to newest.
    pub fn new(symbol: String, bars: Vec<Bar>) -> Self {
        Self { symbol, bars }
    }

    /// Number of bars in the window.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if the window is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The oldest bar in the window.
    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    /// The most recent bar in the window.
    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Get a bar by index (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    /// All bars, oldest first.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Extract close prices as a vector.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Extract volumes as a vector.
    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }
}
