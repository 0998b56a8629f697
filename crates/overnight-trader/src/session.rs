//! The live trading session.
//!
//! Single-threaded cooperative polling: wait for the market to open,
//! liquidate yesterday's position once, then wait for the final minutes of
//! the session and submit one limit buy for the dominant allocation.
//! Transient collaborator failures are retried a bounded number of times
//! and never kill the process; authentication failures do.

use chrono::{Duration as ChronoDuration, Utc};
use overnight_broker::{with_retry, RetryPolicy};
use overnight_core::error::TradingError;
use overnight_core::traits::{Broker, MarketData};
use overnight_core::types::{Side, TimeInForce};
use overnight_engine::{PositionSizer, RatingEngine};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Configuration for the live session loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Pause between clock polls while waiting
    pub poll_interval_secs: u64,
    /// Pause after submitting the daily order, long enough to carry the
    /// loop past the close so the same cycle cannot buy twice
    pub post_buy_pause_secs: u64,
    /// Submit the daily buy once the close is at most this many seconds away
    pub buy_window_secs: i64,
    /// Attempts per collaborator call before giving up on the cycle
    pub retry_attempts: u32,
    /// Pause between retry attempts
    pub retry_delay_secs: u64,
    /// Emit a waiting heartbeat every this many closed-market polls
    pub waiting_log_every: u32,
    /// How far back to scan orders when recovering session state
    pub order_lookback_hours: i64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            post_buy_pause_secs: 150,
            buy_window_secs: 120,
            retry_attempts: 4,
            retry_delay_secs: 15,
            waiting_log_every: 60,
            order_lookback_hours: 12,
        }
    }
}

/// What has already happened in the current trading day.
#[derive(Debug, Clone, Copy, Default)]
struct DayFlags {
    bought: bool,
    sold: bool,
}

impl DayFlags {
    fn reset(&mut self) {
        self.bought = false;
        self.sold = false;
    }
}

/// Drives the rating and sizing pipeline against a real broker and clock.
pub struct TradingSession {
    config: LiveConfig,
    engine: RatingEngine,
    sizer: PositionSizer,
    data: Arc<dyn MarketData>,
    broker: Arc<dyn Broker>,
}

impl TradingSession {
    /// Create a new session.
    pub fn new(
        config: LiveConfig,
        engine: RatingEngine,
        sizer: PositionSizer,
        data: Arc<dyn MarketData>,
        broker: Arc<dyn Broker>,
    ) -> Self {
        Self {
            config,
            engine,
            sizer,
            data,
            broker,
        }
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.config.retry_attempts,
            Duration::from_secs(self.config.retry_delay_secs),
        )
    }

    /// Run the session indefinitely. Returns only on a fatal broker error;
    /// interruption happens externally between sleeps.
    pub async fn run(&self) -> Result<(), TradingError> {
        let mut flags = self.recover_session_state().await;
        info!(
            bought_today = flags.bought,
            sold_today = flags.sold,
            "session state recovered"
        );

        let poll = Duration::from_secs(self.config.poll_interval_secs);
        let mut waiting_cycle: u32 = 0;

        loop {
            let clock = match with_retry(self.retry_policy(), "market_clock", || {
                self.broker.market_clock()
            })
            .await
            {
                Ok(clock) => clock,
                Err(err) if err.is_transient() => {
                    error!(%err, "clock unavailable, will poll again");
                    tokio::time::sleep(poll).await;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            if !clock.is_open {
                flags.reset();
                if waiting_cycle % self.config.waiting_log_every == 0 {
                    info!("Waiting for next market day...");
                }
                waiting_cycle += 1;
                tokio::time::sleep(poll).await;
                continue;
            }

            if !flags.sold {
                info!("Liquidating positions.");
                match with_retry(self.retry_policy(), "close_all_positions", || {
                    self.broker.close_all_positions()
                })
                .await
                {
                    Ok(()) => flags.sold = true,
                    Err(err) if err.is_transient() => {
                        error!(%err, "liquidation failed, will poll again");
                        tokio::time::sleep(poll).await;
                        continue;
                    }
                    Err(err) => return Err(err.into()),
                }
            }

            if clock.seconds_until_close() <= self.config.buy_window_secs && !flags.bought {
                match self.buy_cycle().await {
                    Ok(()) => {
                        flags.bought = true;
                        tokio::time::sleep(Duration::from_secs(self.config.post_buy_pause_secs))
                            .await;
                    }
                    Err(err) if is_recoverable(&err) => {
                        // Still inside the buy window on the next poll, so
                        // the cycle gets another chance.
                        error!(%err, "buy cycle failed, will poll again");
                        tokio::time::sleep(poll).await;
                    }
                    Err(err) => return Err(err),
                }
            } else {
                tokio::time::sleep(poll).await;
            }
        }
    }

    /// One end-of-day buy: rate, size, and submit a single limit order for
    /// the dominant allocation. Rejections are logged and absorbed; only
    /// connectivity problems bubble up for the caller to reschedule.
    async fn buy_cycle(&self) -> Result<(), TradingError> {
        info!("Buying positions...");

        let cash = with_retry(self.retry_policy(), "account_cash", || {
            self.broker.account_cash()
        })
        .await?;

        let assets = with_retry(self.retry_policy(), "list_assets", || {
            self.data.list_assets()
        })
        .await?;
        let candidates: Vec<String> = assets.into_iter().map(|a| a.symbol).collect();

        let ratings = self.engine.compute_ratings(&candidates, None).await?;

        let allocation = match self.sizer.allocate(&ratings, cash) {
            Ok(allocation) => allocation,
            Err(err) => {
                warn!(%err, "nothing to buy this cycle");
                return Ok(());
            }
        };

        let Some(pick) = allocation.dominant() else {
            return Ok(());
        };
        if pick.shares == 0 {
            warn!(symbol = %pick.symbol, "dominant allocation rounds to zero shares");
            return Ok(());
        }

        match self
            .broker
            .submit_limit_buy(
                &pick.symbol,
                pick.shares,
                Decimal::from(pick.limit_price),
                TimeInForce::Day,
            )
            .await
        {
            Ok(order) => {
                info!(id = %order.id, symbol = %pick.symbol, shares = pick.shares, "Positions bought.");
            }
            Err(err) => {
                error!(
                    symbol = %pick.symbol,
                    shares = pick.shares,
                    limit_price = pick.limit_price,
                    %err,
                    "Failed to buy"
                );
            }
        }

        Ok(())
    }

    /// See if we've already bought or sold positions today, in case the
    /// process was restarted during market hours.
    async fn recover_session_state(&self) -> DayFlags {
        let since = Utc::now() - ChronoDuration::hours(self.config.order_lookback_hours);
        match self.broker.recent_orders(since).await {
            Ok(orders) => DayFlags {
                bought: orders.iter().any(|o| o.side == Side::Buy),
                sold: orders.iter().any(|o| o.side == Side::Sell),
            },
            Err(err) => {
                // No order history visible, so we've evidently not done
                // anything today.
                warn!(%err, "could not scan recent orders, assuming a fresh session");
                DayFlags::default()
            }
        }
    }
}

/// A buy-cycle error the loop can absorb and retry on the next poll.
fn is_recoverable(err: &TradingError) -> bool {
    match err {
        TradingError::Broker(e) => e.is_transient(),
        TradingError::Data(e) => e.is_transient(),
        _ => false,
    }
}
