//! Wire types for Reya market endpoints.
//!
//! - `GET /v2/marketDefinitions`
//! - `GET /v2/market/{symbol}/summary`
//! - `GET /v2/prices/{symbol}`

use crate::shared::serde_util::FlexDecimal;
use crate::shared::NativeId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ─── Market definitions ──────────────────────────────────────────────────────

/// One entry of `GET /v2/marketDefinitions`.
///
/// ```json
/// {
///   "symbol": "BTCRUSDPERP", "marketId": 1,
///   "minOrderQty": "0.001", "qtyStepSize": "0.001", "tickSize": "0.01",
///   "liquidationMarginParameter": "0.05", "initialMarginParameter": "0.04",
///   "maxLeverage": 40, "oiCap": "10000"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDefinition {
    pub symbol: NativeId,
    pub market_id: u32,
    pub min_order_qty: Decimal,
    pub qty_step_size: Decimal,
    pub tick_size: Decimal,
    #[serde(default)]
    pub liquidation_margin_parameter: Option<Decimal>,
    #[serde(default)]
    pub initial_margin_parameter: Option<Decimal>,
    pub max_leverage: u32,
    #[serde(default)]
    pub oi_cap: Option<Decimal>,
}

// ─── Market summary ──────────────────────────────────────────────────────────

/// `GET /v2/market/{symbol}/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub symbol: NativeId,
    pub updated_at: i64,
    #[serde(default)]
    pub long_oi_qty: Option<Decimal>,
    #[serde(default)]
    pub short_oi_qty: Option<Decimal>,
    #[serde(default)]
    pub oi_qty: Option<Decimal>,
    pub funding_rate: Decimal,
    #[serde(default)]
    pub funding_rate_velocity: Option<Decimal>,
    #[serde(default)]
    pub volume24h: Option<Decimal>,
    #[serde(default)]
    pub px_change24h: Option<Decimal>,
    #[serde(default)]
    pub throttled_oracle_price: Option<Decimal>,
    #[serde(default)]
    pub throttled_pool_price: Option<Decimal>,
    #[serde(default)]
    pub prices_updated_at: Option<i64>,
}

// ─── Prices ──────────────────────────────────────────────────────────────────

/// `GET /v2/prices/{symbol}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub symbol: NativeId,
    #[serde(default)]
    pub oracle_price: Option<FlexDecimal>,
    #[serde(default)]
    pub pool_price: Option<FlexDecimal>,
    pub updated_at: i64,
}

impl PriceResponse {
    /// Mark price: the pool price, falling back to the oracle price.
    pub fn mark(&self) -> Option<Decimal> {
        self.pool_price.or(self.oracle_price).map(Decimal::from)
    }
}
