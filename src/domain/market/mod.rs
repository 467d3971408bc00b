//! Market domain: catalog, market metadata, tickers, funding.

pub mod catalog;
pub mod client;
mod convert;
pub mod ticker;
pub mod wire;

use crate::shared::{NativeId, Symbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use catalog::{CatalogEntry, MarketCatalog};
pub use ticker::{FundingRate, Ticker};

/// Settlement asset of every Reya perpetual.
pub const SETTLEMENT_ASSET: &str = "RUSD";

// ─── Market ──────────────────────────────────────────────────────────────────

/// A tradeable perpetual market: catalog identity joined with the backend's
/// market definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub symbol: Symbol,
    pub native_id: NativeId,
    pub market_id: u32,
    pub base: String,
    pub quote: String,
    /// Collateral the contract settles in.
    pub settle: String,
    pub precision: Precision,
    pub limits: Limits,
    pub max_leverage: u32,
    /// Pair used when OHLCV is delegated to the fallback exchange.
    pub fallback_id: Option<NativeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Precision {
    /// Minimum price increment.
    pub price: Decimal,
    /// Minimum quantity increment.
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub min_amount: Decimal,
    pub max_open_interest: Option<Decimal>,
}

impl Market {
    /// Number of decimal places in the price tick (`0.01` → 2).
    pub fn price_decimals(&self) -> u32 {
        self.precision.price.normalize().scale()
    }

    /// Number of decimal places in the quantity step.
    pub fn amount_decimals(&self) -> u32 {
        self.precision.amount.normalize().scale()
    }
}

// ─── Validation ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Definition belongs to a different market than the catalog entry.
    SymbolMismatch { expected: NativeId, got: NativeId },
    NonPositive { field: &'static str, value: Decimal },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::SymbolMismatch { expected, got } => {
                write!(f, "definition for {} does not match {}", got, expected)
            }
            ValidationError::NonPositive { field, value } => {
                write!(f, "{} must be positive, got {}", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
