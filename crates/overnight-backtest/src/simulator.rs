//! Day-by-day backtest simulation.
//!
//! Replays the strategy over a trading calendar: positions bought near one
//! day's close are valued (and implicitly liquidated) at the next day's
//! open, then a fresh pick is bought against the updated cash.

use chrono::{DateTime, NaiveDate, Utc};
use overnight_core::error::{DataError, TradingError};
use overnight_core::traits::MarketData;
use overnight_engine::{PositionSizer, RatingEngine};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::report::{BacktestReport, DailyValue};

/// Backtest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Reference index symbol for the benchmark comparison
    pub benchmark_symbol: String,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            benchmark_symbol: "SPY".to_string(),
        }
    }
}

/// Simulated portfolio, mutated once per trading day.
#[derive(Debug, Clone, Default)]
pub struct PortfolioState {
    /// Uninvested cash
    pub cash: f64,
    /// Shares held overnight, keyed by symbol
    pub held: HashMap<String, u64>,
    /// The day most recently processed
    pub as_of: Option<NaiveDate>,
}

/// Backtesting simulator.
pub struct BacktestSimulator {
    config: BacktestConfig,
    engine: RatingEngine,
    sizer: PositionSizer,
    data: Arc<dyn MarketData>,
}

impl BacktestSimulator {
    /// Create a new simulator driving the given engine and sizer.
    pub fn new(
        config: BacktestConfig,
        engine: RatingEngine,
        sizer: PositionSizer,
        data: Arc<dyn MarketData>,
    ) -> Self {
        Self {
            config,
            engine,
            sizer,
            data,
        }
    }

    /// Run the simulation over the trading days within `[start, end]`.
    ///
    /// Each day the previous pick is valued at that day's open and folded
    /// back into cash; every day except the last then buys the dominant
    /// allocation near the close. Days where nothing rates positively
    /// simply hold cash.
    pub async fn run(
        &self,
        starting_cash: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BacktestReport, TradingError> {
        let calendar = self.data.trading_calendar(start, end).await.map_err(TradingError::Data)?;
        if calendar.is_empty() {
            return Err(TradingError::Data(DataError::NoDataAvailable));
        }

        // The candidate universe: every listed symbol. For longer windows
        // this should be the set of symbols active during the period under
        // test; recently listed names simply fail the window-length check.
        let assets = self.data.list_assets().await.map_err(TradingError::Data)?;
        let candidates: Vec<String> = assets.into_iter().map(|a| a.symbol).collect();

        let mut state = PortfolioState {
            cash: starting_cash,
            ..Default::default()
        };
        let mut daily_values = Vec::with_capacity(calendar.len());

        for (index, day) in calendar.iter().enumerate() {
            // See how much holding the previous day's pick overnight got us.
            state.cash += self.value_of_holdings(&state.held, *day).await?;
            state.held.clear();
            state.as_of = Some(*day);

            debug!(date = %day, value = state.cash, "portfolio value");
            daily_values.push(DailyValue {
                date: *day,
                value: state.cash,
            });

            if index == calendar.len() - 1 {
                break;
            }

            let ratings = self
                .engine
                .compute_ratings(&candidates, Some(end_of_day(*day)))
                .await
                .map_err(TradingError::Data)?;

            match self.sizer.allocate(&ratings, state.cash) {
                Ok(allocation) => {
                    // Only the dominant entry is bought; see
                    // Allocation::dominant for the policy.
                    if let Some(pick) = allocation.dominant() {
                        if let Some(rating) = ratings.iter().find(|r| r.symbol == pick.symbol) {
                            state.cash -= pick.shares as f64 * rating.price;
                            state.held.insert(pick.symbol.clone(), pick.shares);
                            debug!(
                                date = %day,
                                symbol = %pick.symbol,
                                shares = pick.shares,
                                price = rating.price,
                                "bought overnight position"
                            );
                        }
                    }
                }
                Err(err) => {
                    debug!(date = %day, %err, "no allocation today, holding cash");
                }
            }
        }

        let final_value = state.cash;
        let benchmark_return_pct = self
            .benchmark_return(*calendar.first().unwrap(), *calendar.last().unwrap())
            .await?;

        Ok(BacktestReport {
            starting_cash,
            final_value,
            return_pct: (final_value - starting_cash) / starting_cash * 100.0,
            daily_values,
            benchmark_symbol: self.config.benchmark_symbol.clone(),
            benchmark_return_pct,
        })
    }

    /// Market value of held shares at `day`'s open. A symbol with no bars
    /// available contributes zero rather than failing the day.
    async fn value_of_holdings(
        &self,
        held: &HashMap<String, u64>,
        day: NaiveDate,
    ) -> Result<f64, TradingError> {
        if held.is_empty() {
            return Ok(0.0);
        }

        let symbols: Vec<String> = held.keys().cloned().collect();
        let barsets = self
            .data
            .daily_bars(&symbols, 1, Some(end_of_day(day)))
            .await
            .map_err(TradingError::Data)?;

        let mut total = 0.0;
        for (symbol, shares) in held {
            match barsets.get(symbol).and_then(|bars| bars.first()) {
                Some(bar) => total += *shares as f64 * bar.open,
                None => debug!(%symbol, date = %day, "no bars for held symbol, valuing at zero"),
            }
        }
        Ok(total)
    }

    /// Close-to-close change of the benchmark symbol across the window, as
    /// a percentage. `None` when the endpoints cannot be resolved.
    async fn benchmark_return(
        &self,
        first_day: NaiveDate,
        last_day: NaiveDate,
    ) -> Result<Option<f64>, TradingError> {
        let symbols = vec![self.config.benchmark_symbol.clone()];

        let first_close = self.endpoint_close(&symbols, first_day).await?;
        let last_close = self.endpoint_close(&symbols, last_day).await?;

        Ok(match (first_close, last_close) {
            (Some(first), Some(last)) if first != 0.0 => Some((last - first) / first * 100.0),
            _ => None,
        })
    }

    async fn endpoint_close(
        &self,
        symbols: &[String],
        day: NaiveDate,
    ) -> Result<Option<f64>, TradingError> {
        let barsets = self
            .data
            .daily_bars(symbols, 1, Some(end_of_day(day)))
            .await
            .map_err(TradingError::Data)?;
        Ok(barsets
            .get(&symbols[0])
            .and_then(|bars| bars.first())
            .map(|bar| bar.close))
    }
}

/// The bar cutoff for "as of this trading day": the end of the calendar
/// day, so that day's daily bar is the latest one visible.
fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(23, 59, 59)
        .expect("valid wall-clock time")
        .and_utc()
}
