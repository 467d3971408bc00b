//! Account domain: collateral balances and perpetual positions.

pub mod client;
mod convert;
pub mod reader;
pub mod wire;

pub use reader::AccountStateReader;

use crate::shared::{AccountId, Side, Symbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ─── Balance ─────────────────────────────────────────────────────────────────

/// Balance of one recognized collateral asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub account: AccountId,
    pub asset: String,
    pub free: Decimal,
    /// `None` when the backend does not break out a locked amount.
    pub locked: Option<Decimal>,
    pub total: Decimal,
}

// ─── Position ────────────────────────────────────────────────────────────────

/// Leverage of a position, when the backend exposes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Leverage {
    Unknown,
    Known(Decimal),
}

/// An open perpetual position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub side: Side,
    /// Absolute size in base units; always positive.
    pub size: Decimal,
    pub entry_price: Decimal,
    pub mark_price: Decimal,
    pub notional: Decimal,
    pub unrealized_pnl: Decimal,
    pub leverage: Leverage,
}
