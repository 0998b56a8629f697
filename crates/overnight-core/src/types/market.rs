//! Market metadata types supplied by the data collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A listed asset and whether it can currently be traded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Symbol identifier
    pub symbol: String,
    /// Whether the broker will accept orders for it
    pub tradable: bool,
}

/// A snapshot of the market clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketClock {
    /// Whether the market is currently open
    pub is_open: bool,
    /// Next scheduled close
    pub next_close: DateTime<Utc>,
    /// Server time of the snapshot
    pub timestamp: DateTime<Utc>,
}

impl MarketClock {
    /// Seconds remaining until the next close. Zero if already past.
    pub fn seconds_until_close(&self) -> i64 {
        (self.next_close - self.timestamp).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_seconds_until_close() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 8, 20, 58, 0).unwrap();
        let next_close = Utc.with_ymd_and_hms(2024, 1, 8, 21, 0, 0).unwrap();
        let clock = MarketClock {
            is_open: true,
            next_close,
            timestamp,
        };
        assert_eq!(clock.seconds_until_close(), 120);

        let past = MarketClock {
            is_open: false,
            next_close: timestamp,
            timestamp: next_close,
        };
        assert_eq!(past.seconds_until_close(), 0);
    }
}
