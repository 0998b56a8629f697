//! Live trading session loop and logging setup.

mod logging;
mod session;

pub use logging::setup_logging;
pub use session::{LiveConfig, TradingSession};
