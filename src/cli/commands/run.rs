//! Live trading command implementation.

use anyhow::{Context, Result};
use overnight_broker::{AlpacaClient, AlpacaConfig};
use overnight_config::load_config;
use overnight_engine::{PositionSizer, RatingEngine};
use overnight_trader::TradingSession;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub async fn run(config_path: &Path) -> Result<()> {
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
    let session = TradingSession::new(
        config.live.clone(),
        engine,
        sizer,
        client.clone(),
        client.clone(),
    );

    info!(paper = config.alpaca.paper, "starting live trading session");

    // The session itself runs forever; ctrl-c lands between its sleeps and
    // ends the process cleanly.
    tokio::select! {
        result = session.run() => result.map_err(Into::into),
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            Ok(())
        }
    }
}
