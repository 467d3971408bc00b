//! Wire types for order-book depth.
//!
//! The same shape is served by `GET /v2/market/{symbol}/depth` and carried in
//! the `data` field of `/v2/market/{symbol}/depth` channel messages.

use crate::shared::serde_util::timestamp_ms;
use crate::shared::NativeId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepthKind {
    /// Full book; replaces every level.
    #[serde(rename = "SNAPSHOT")]
    Snapshot,
    /// Changed levels only; a zero quantity removes the level.
    #[serde(rename = "UPDATE")]
    Update,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireLevel {
    pub px: Decimal,
    pub qty: Decimal,
}

impl WireLevel {
    pub fn new(px: Decimal, qty: Decimal) -> Self {
        Self { px, qty }
    }
}

/// One depth message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthMessage {
    pub symbol: NativeId,
    #[serde(rename = "type")]
    pub kind: DepthKind,
    #[serde(default)]
    pub bids: Vec<WireLevel>,
    #[serde(default)]
    pub asks: Vec<WireLevel>,
    /// Per-market sequence number; consecutive updates differ by one.
    pub sequence_number: u64,
    #[serde(with = "timestamp_ms")]
    pub updated_at: DateTime<Utc>,
}

impl DepthMessage {
    pub fn is_snapshot(&self) -> bool {
        self.kind == DepthKind::Snapshot
    }
}
