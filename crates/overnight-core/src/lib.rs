//! Core types and traits for the overnight-hold trading system.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarWindow)
//! - Rating and allocation types produced by the strategy core
//! - Order and account types exchanged with the broker
//! - Collaborator traits for market data and order execution

pub mod error;
pub mod traits;
pub mod types;

pub use error::{TradingError, TradingResult};
pub use traits::*;
pub use types::*;
