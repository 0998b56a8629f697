//! Backtest command implementation.

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use overnight_backtest::BacktestSimulator;
use overnight_broker::{AlpacaClient, AlpacaConfig};
use overnight_config::load_config;
use overnight_engine::{PositionSizer, RatingEngine};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::cli::BacktestArgs;

pub async fn run(args: BacktestArgs, config_path: &Path) -> Result<()> {
    if args.starting_cash <= 0.0 {
        bail!("starting cash must be positive, got {}", args.starting_cash);
    }
    if args.days_to_test == 0 {
        bail!("days to test must be at least 1");
    }

    let config = load_config(config_path).context("Failed to load configuration")?;

    let api_key = std::env::var(&config.alpaca.api_key_env)
        .with_context(|| format!("{} not set", config.alpaca.api_key_env))?;
    let api_secret = std::env::var(&config.alpaca.api_secret_env)
        .with_context(|| format!("{} not set", config.alpaca.api_secret_env))?;

    let client = Arc::new(AlpacaClient::new(AlpacaConfig::new(
        api_key,
        api_secret,
        config.alpaca.paper,
    ))?);

    let engine = RatingEngine::new(config.rating.clone(), client.clone())?;
    let sizer = PositionSizer::new(config.sizing.clone());
    let simulator =
        BacktestSimulator::new(config.backtest.clone(), engine, sizer, client.clone());

    let end = Utc::now().date_naive();
    let start = end - Duration::days(args.days_to_test as i64);
    info!(%start, %end, starting_cash = args.starting_cash, "running backtest");

    let report = simulator.run(args.starting_cash, start, end).await?;
    println!("{}", report.summary());

    Ok(())
}
