//! Broker trait definition.

use crate::error::BrokerError;
use crate::types::{MarketClock, Order, OrderSummary, TimeInForce};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Trait for order execution and account state.
///
/// Brokers handle order submission, liquidation, and account information.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Cash available for new positions.
    async fn account_cash(&self) -> Result<f64, BrokerError>;

    /// Snapshot of the market clock.
    async fn market_clock(&self) -> Result<MarketClock, BrokerError>;

    /// Submit a limit buy order for whole shares.
    ///
    /// # Arguments
    /// * `symbol` - The symbol to buy
    /// * `qty` - Whole shares
    /// * `limit_price` - Ceiling willing-to-pay price
    /// * `time_in_force` - Order lifetime
    async fn submit_limit_buy(
        &self,
        symbol: &str,
        qty: u64,
        limit_price: Decimal,
        time_in_force: TimeInForce,
    ) -> Result<Order, BrokerError>;

    /// Liquidate every open position with market orders.
    async fn close_all_positions(&self) -> Result<(), BrokerError>;

    /// Orders submitted since `since`, newest state included regardless of
    /// whether they filled.
    async fn recent_orders(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<OrderSummary>, BrokerError>;

    /// Get the broker name.
    fn name(&self) -> &str;
}
