//! Alpaca REST integration for paper and live trading.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use overnight_core::error::{BrokerError, DataError};
use overnight_core::traits::{Broker, MarketData};
use overnight_core::types::{
    Asset, Bar, MarketClock, Order, OrderStatus, OrderSummary, Side, TimeInForce,
};
use reqwest::{header, Client, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

/// Alpaca API configuration.
#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    pub api_key: String,
    pub api_secret: String,
    pub paper: bool,
}

impl AlpacaConfig {
    /// Create config directly with key and secret.
    pub fn new(api_key: String, api_secret: String, paper: bool) -> Self {
        Self {
            api_key,
            api_secret,
            paper,
        }
    }

    /// Load from environment variables.
    pub fn from_env() -> Result<Self, BrokerError> {
        let api_key = std::env::var("ALPACA_API_KEY")
            .map_err(|_| BrokerError::Configuration("ALPACA_API_KEY not set".into()))?;
        let api_secret = std::env::var("ALPACA_API_SECRET")
            .map_err(|_| BrokerError::Configuration("ALPACA_API_SECRET not set".into()))?;
        let paper = std::env::var("ALPACA_PAPER")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        Ok(Self {
            api_key,
            api_secret,
            paper,
        })
    }

    pub fn base_url(&self) -> &str {
        if self.paper {
            "https://paper-api.alpaca.markets"
        } else {
            "https://api.alpaca.markets"
        }
    }

    pub fn data_url(&self) -> &str {
        "https://data.alpaca.markets"
    }
}

/// Alpaca API response types
#[derive(Debug, Deserialize)]
struct AlpacaAsset {
    symbol: String,
    tradable: bool,
}

#[derive(Debug, Deserialize)]
struct AlpacaBar {
    t: String,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: u64,
}

#[derive(Debug, Deserialize)]
struct AlpacaBarsResponse {
    bars: HashMap<String, Vec<AlpacaBar>>,
    #[allow(dead_code)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlpacaCalendarDay {
    date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct AlpacaAccount {
    cash: String,
}

#[derive(Debug, Deserialize)]
struct AlpacaClock {
    timestamp: String,
    is_open: bool,
    next_close: String,
}

#[derive(Debug, Deserialize)]
struct AlpacaOrder {
    id: String,
    status: String,
    symbol: String,
    qty: String,
    side: String,
    limit_price: Option<String>,
    created_at: String,
    submitted_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest {
    symbol: String,
    qty: String,
    side: String,
    #[serde(rename = "type")]
    order_type: String,
    time_in_force: String,
    limit_price: String,
}

/// Alpaca client serving both market data and order execution.
pub struct AlpacaClient {
    config: AlpacaConfig,
    client: Client,
}

impl AlpacaClient {
    /// Create a new Alpaca client.
    pub fn new(config: AlpacaConfig) -> Result<Self, BrokerError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "APCA-API-KEY-ID",
            header::HeaderValue::from_str(&config.api_key)
                .map_err(|e| BrokerError::Configuration(e.to_string()))?,
        );
        headers.insert(
            "APCA-API-SECRET-KEY",
            header::HeaderValue::from_str(&config.api_secret)
                .map_err(|e| BrokerError::Configuration(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self, BrokerError> {
        let config = AlpacaConfig::from_env()?;
        Self::new(config)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, BrokerError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let text = resp.text().await.unwrap_or_default();
            return Err(BrokerError::Authentication(format!("{}: {}", status, text)));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(30);
            return Err(BrokerError::RateLimited { retry_after_secs });
        }

        let text = resp.text().await.unwrap_or_default();
        Err(BrokerError::ApiError(format!("{}: {}", status, text)))
    }

    fn parse_order(order: AlpacaOrder) -> Result<Order, BrokerError> {
        let id = Uuid::parse_str(&order.id).unwrap_or_else(|_| Uuid::new_v4());

        let side = parse_side(&order.side)?;

        let status = match order.status.as_str() {
            "partially_filled" => OrderStatus::PartiallyFilled,
            "filled" => OrderStatus::Filled,
            "canceled" | "expired" | "rejected" => OrderStatus::Canceled,
            _ => OrderStatus::Pending,
        };

        let quantity: Decimal = order.qty.parse().unwrap_or_default();
        let limit_price = order.limit_price.as_ref().and_then(|p| p.parse().ok());
        let created_at = parse_timestamp(&order.created_at);

        Ok(Order {
            id,
            symbol: order.symbol,
            side,
            quantity,
            limit_price,
            time_in_force: TimeInForce::Day,
            status,
            created_at,
        })
    }
}

fn parse_side(side: &str) -> Result<Side, BrokerError> {
    match side {
        "buy" => Ok(Side::Buy),
        "sell" => Ok(Side::Sell),
        other => Err(BrokerError::ApiError(format!("Unknown side: {}", other))),
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn data_err(err: BrokerError) -> DataError {
    match err {
        BrokerError::Connection(msg) => DataError::ConnectionError(msg),
        BrokerError::RateLimited { retry_after_secs } => {
            DataError::ConnectionError(format!("rate limited, retry after {}s", retry_after_secs))
        }
        other => DataError::Internal(other.to_string()),
    }
}

#[async_trait]
impl MarketData for AlpacaClient {
    async fn list_assets(&self) -> Result<Vec<Asset>, DataError> {
        let url = format!("{}/v2/assets", self.config.base_url());
        let resp = self
            .client
            .get(&url)
            .query(&[("status", "active"), ("asset_class", "us_equity")])
            .send()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        let resp = Self::check(resp).await.map_err(data_err)?;
        let assets: Vec<AlpacaAsset> = resp
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        Ok(assets
            .into_iter()
            .map(|a| Asset {
                symbol: a.symbol,
                tradable: a.tradable,
            })
            .collect())
    }

    async fn daily_bars(
        &self,
        symbols: &[String],
        limit: usize,
        end: Option<DateTime<Utc>>,
    ) -> Result<HashMap<String, Vec<Bar>>, DataError> {
        let url = format!("{}/v2/stocks/bars", self.config.data_url());

        let mut params = vec![
            ("symbols", symbols.join(",")),
            ("timeframe", "1Day".to_string()),
            ("limit", limit.to_string()),
            ("feed", "iex".to_string()),
        ];
        if let Some(end) = end {
            params.push(("end", end.to_rfc3339()));
        }

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        let resp = Self::check(resp).await.map_err(data_err)?;
        let data: AlpacaBarsResponse = resp
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let barsets = data
            .bars
            .into_iter()
            .map(|(symbol, bars)| {
                let mut bars: Vec<Bar> = bars
                    .iter()
                    .map(|b| {
                        let ts = DateTime::parse_from_rfc3339(&b.t)
                            .map(|dt| dt.timestamp_millis())
                            .unwrap_or(0);
                        Bar::new(ts, b.o, b.h, b.l, b.c, b.v as f64)
                    })
                    .collect();
                // The API bounds the total page size, not the per-symbol
                // count; trim to the requested window length.
                if bars.len() > limit {
                    bars.drain(..bars.len() - limit);
                }
                (symbol, bars)
            })
            .collect();

        Ok(barsets)
    }

    async fn trading_calendar(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, DataError> {
        let url = format!("{}/v2/calendar", self.config.base_url());
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("start", start.format("%Y-%m-%d").to_string()),
                ("end", end.format("%Y-%m-%d").to_string()),
            ])
            .send()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        let resp = Self::check(resp).await.map_err(data_err)?;
        let days: Vec<AlpacaCalendarDay> = resp
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        Ok(days.into_iter().map(|d| d.date).collect())
    }

    fn name(&self) -> &str {
        "Alpaca Data"
    }
}

#[async_trait]
impl Broker for AlpacaClient {
    async fn account_cash(&self) -> Result<f64, BrokerError> {
        let url = format!("{}/v2/account", self.config.base_url());
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        let resp = Self::check(resp).await?;
        let account: AlpacaAccount = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;

        account
            .cash
            .parse()
            .map_err(|_| BrokerError::ApiError(format!("unparseable cash: {}", account.cash)))
    }

    async fn market_clock(&self) -> Result<MarketClock, BrokerError> {
        let url = format!("{}/v2/clock", self.config.base_url());
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        let resp = Self::check(resp).await?;
        let clock: AlpacaClock = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;

        Ok(MarketClock {
            is_open: clock.is_open,
            next_close: parse_timestamp(&clock.next_close),
            timestamp: parse_timestamp(&clock.timestamp),
        })
    }

    async fn submit_limit_buy(
        &self,
        symbol: &str,
        qty: u64,
        limit_price: Decimal,
        time_in_force: TimeInForce,
    ) -> Result<Order, BrokerError> {
        let url = format!("{}/v2/orders", self.config.base_url());

        let tif = match time_in_force {
            TimeInForce::Day => "day",
            TimeInForce::GTC => "gtc",
        };
        let create_req = CreateOrderRequest {
            symbol: symbol.to_string(),
            qty: qty.to_string(),
            side: "buy".to_string(),
            order_type: "limit".to_string(),
            time_in_force: tif.to_string(),
            limit_price: limit_price.to_string(),
        };

        debug!("Submitting order: {:?}", create_req);

        let resp = self
            .client
            .post(&url)
            .json(&create_req)
            .send()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(BrokerError::OrderRejected(format!("{}: {}", status, text)));
        }

        let order: AlpacaOrder = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;

        info!(
            "Order submitted: {} {} {} @ {:?}",
            order.side, order.qty, order.symbol, order.limit_price
        );
        Self::parse_order(order)
    }

    async fn close_all_positions(&self) -> Result<(), BrokerError> {
        let url = format!("{}/v2/positions", self.config.base_url());
        let resp = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        Self::check(resp).await?;
        info!("All positions closed");
        Ok(())
    }

    async fn recent_orders(&self, since: DateTime<Utc>) -> Result<Vec<OrderSummary>, BrokerError> {
        let url = format!("{}/v2/orders", self.config.base_url());
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("status", "all".to_string()),
                ("after", since.to_rfc3339()),
                ("limit", "400".to_string()),
            ])
            .send()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        let resp = Self::check(resp).await?;
        let orders: Vec<AlpacaOrder> = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;

        orders
            .into_iter()
            .map(|o| {
                let submitted_at =
                    parse_timestamp(o.submitted_at.as_deref().unwrap_or(&o.created_at));
                Ok(OrderSummary {
                    symbol: o.symbol,
                    side: parse_side(&o.side)?,
                    submitted_at,
                })
            })
            .collect()
    }

    fn name(&self) -> &str {
        if self.config.paper {
            "Alpaca Paper"
        } else {
            "Alpaca Live"
        }
    }
}
