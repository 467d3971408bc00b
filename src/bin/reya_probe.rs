//! Smoke check against a live Reya deployment.
//!
//! Reads `REYA_*` variables (and `.env`), then walks the read-only
//! operations for every catalog market. Account operations run when
//! `REYA_WALLET_ADDRESS` is set.
//!
//! ```bash
//! RUST_LOG=reya_unified=debug cargo run --features native --bin reya-probe
//! ```

use chrono::{Duration, Utc};
use reya_unified::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AdapterConfig::from_env()?;
    let has_account = config.account.is_some();
    let exchange = ReyaExchange::builder().config(config).build()?;

    for (operation, capability) in exchange.capabilities() {
        tracing::info!(%operation, ?capability, "capability");
    }

    let markets = exchange.fetch_markets().await?;
    tracing::info!(count = markets.len(), "markets loaded");

    let end = Utc::now();
    let start = end - Duration::hours(6);
    for market in &markets {
        let symbol = &market.symbol;

        let ticker = exchange.fetch_ticker(symbol).await?;
        tracing::info!(%symbol, mark = ?ticker.mark_price, index = ?ticker.index_price, "ticker");

        let funding = exchange.fetch_funding_rate(symbol).await?;
        tracing::info!(%symbol, ?funding, "funding");

        match exchange.fetch_order_book(symbol, Some(5)).await {
            Ok(book) => tracing::info!(
                %symbol,
                version = book.version,
                bid = ?book.best_bid().map(|l| l.price),
                ask = ?book.best_ask().map(|l| l.price),
                "order book"
            ),
            Err(e) => tracing::warn!(%symbol, "order book unavailable: {}", e),
        }

        let candles = exchange
            .fetch_ohlcv(symbol, Timeframe::Hour1, start, end)
            .await?;
        tracing::info!(%symbol, count = candles.len(), "hourly candles");
    }

    if has_account {
        let balances = exchange.fetch_balance(None).await?;
        tracing::info!(?balances, "balances");
        let positions = exchange.fetch_positions(None).await?;
        tracing::info!(count = positions.len(), "positions");
        let open = exchange.fetch_open_orders(None).await?;
        tracing::info!(count = open.len(), "open orders");
    }

    Ok(())
}
