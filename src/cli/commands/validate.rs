//! Validate configuration command.

use anyhow::Result;
use overnight_config::load_config;
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            config.rating.validate()?;

            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("Alpaca paper mode: {}", config.alpaca.paper);
            println!("Stocks to hold: {}", config.rating.stocks_to_hold);
            println!(
                "Price range: ${} - ${}",
                config.rating.min_stock_price, config.rating.max_stock_price
            );
            println!("Scoring window: {} days", config.rating.window_size);
            println!("Benchmark: {}", config.backtest.benchmark_symbol);
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
