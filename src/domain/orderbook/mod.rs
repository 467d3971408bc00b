//! Orderbook domain: published snapshots, per-symbol book state, and the
//! market data cache that keeps them current.

pub mod cache;
pub mod client;
pub mod state;
pub mod wire;

pub use cache::MarketDataCache;
pub use state::{BookState, DeltaOutcome};

use crate::shared::Symbol;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub size: Decimal,
}

/// Immutable view of a book at one version.
///
/// Bids are sorted by price descending, asks ascending; prices are unique
/// within a side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub symbol: Symbol,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub timestamp: DateTime<Utc>,
    /// Sequence number of the last message applied.
    pub version: u64,
}

impl OrderBookSnapshot {
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / Decimal::from(2)),
            _ => None,
        }
    }

    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// The top `depth` levels of each side.
    pub fn truncated(&self, depth: usize) -> Self {
        Self {
            symbol: self.symbol.clone(),
            bids: self.bids.iter().take(depth).copied().collect(),
            asks: self.asks.iter().take(depth).copied().collect(),
            timestamp: self.timestamp,
            version: self.version,
        }
    }
}
