//! Market data trait definition.

use crate::error::DataError;
use crate::types::{Asset, Bar};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

/// Trait for historical market data sources.
///
/// Satisfiable by any broker/data API that can list assets, serve daily
/// bars up to a cutoff, and enumerate market-open dates.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// List all known assets with their tradability flags.
    async fn list_assets(&self) -> Result<Vec<Asset>, DataError>;

    /// Fetch up to `limit` daily bars per symbol, ending at or before `end`
    /// (`None` means the latest available data).
    ///
    /// # Returns
    /// A map from symbol to bars ordered oldest to newest. Symbols with no
    /// data may be absent or map to an empty vector.
    async fn daily_bars(
        &self,
        symbols: &[String],
        limit: usize,
        end: Option<DateTime<Utc>>,
    ) -> Result<HashMap<String, Vec<Bar>>, DataError>;

    /// The ordered market-open dates within `[start, end]`, holidays and
    /// closures excluded.
    async fn trading_calendar(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, DataError>;

    /// Get the data source name.
    fn name(&self) -> &str;
}
