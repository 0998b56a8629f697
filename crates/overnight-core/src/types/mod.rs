//! Core data types for the trading system.

mod allocation;
mod bar;
mod market;
mod order;
mod rating;

pub use allocation::{Allocation, AllocationEntry};
pub use bar::{Bar, BarWindow};
pub use market::{Asset, MarketClock};
pub use order::{Order, OrderStatus, OrderSummary, Side, TimeInForce};
pub use rating::{Rating, RatingSet};
