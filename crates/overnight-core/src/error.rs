//! Error types for the trading system.

use thiserror::Error;

/// Top-level trading system error.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sizing error: {0}")]
    Sizing(#[from] SizingError),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Position sizing errors.
///
/// These must surface to the caller: sizing against a degenerate rating set
/// is undefined and is never resolved with a silent divide-by-zero.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SizingError {
    #[error("cannot allocate: rating set is empty or total score is {total_score}")]
    InvalidAllocationInput { total_score: f64 },

    #[error("cannot allocate: available cash {cash} is not positive")]
    NonPositiveCash { cash: f64 },
}

/// Broker-specific errors.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("API error: {0}")]
    ApiError(String),
}

impl BrokerError {
    /// Whether a retry with delay is a reasonable response.
    ///
    /// Authentication and configuration failures are permanent; retrying
    /// them only delays the fatal exit.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BrokerError::Connection(_) | BrokerError::RateLimited { .. }
        )
    }
}

/// Market data errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Data source error: {0}")]
    Internal(String),
}

impl DataError {
    /// Whether a retry with delay is a reasonable response.
    pub fn is_transient(&self) -> bool {
        matches!(self, DataError::ConnectionError(_))
    }
}

/// Result type alias for trading operations.
pub type TradingResult<T> = Result<T, TradingError>;
