//! Injected collaborators.
//!
//! Each backend the adapter reads from or writes to sits behind one of these
//! traits. The crate ships implementations for the public Reya API
//! ([`ReyaHttp`](crate::http::ReyaHttp)), the Reya market-data WebSocket and
//! the Binance klines endpoint; signing is always supplied by the caller.
//! Tests swap any of them for in-memory fakes.

use crate::domain::account::wire::{AccountBalanceEntry, PositionEntry};
use crate::domain::candle::wire::{ReyaCandleHistory, SpotKline};
use crate::domain::market::wire::{MarketDefinition, MarketSummary, PriceResponse};
use crate::domain::order::wire::OpenOrderEntry;
use crate::domain::orderbook::wire::DepthMessage;
use crate::error::AdapterResult;
use crate::shared::{NativeId, OrderId, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Signer ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    Gtc,
    Ioc,
}

/// A fully-resolved order action for the on-chain execution path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub market_id: u32,
    pub native_id: NativeId,
    pub is_buy: bool,
    pub qty: Decimal,
    /// `None` for market orders; the signer applies its own slippage bound.
    pub limit_px: Option<Decimal>,
    pub time_in_force: TimeInForce,
    pub reduce_only: bool,
    pub client_order_id: OrderId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum SignerAction {
    Place(PlaceOrder),
    Cancel {
        exchange_order_id: String,
        native_id: NativeId,
    },
}

/// How far the broadcast action got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroadcastState {
    /// Accepted and resting (or pending execution).
    Accepted,
    Filled,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_reference: String,
    pub exchange_order_id: Option<String>,
    pub state: BroadcastState,
}

/// Why a signer call did not produce a receipt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignerFailure {
    #[error("Rejected by backend: {0}")]
    Rejected(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Broadcast failed: {0}")]
    Broadcast(String),
}

/// Signs and broadcasts order actions. All-or-nothing per call.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign_and_broadcast(&self, action: &SignerAction) -> Result<TxReceipt, SignerFailure>;
}

// ─── Market data ─────────────────────────────────────────────────────────────

/// Raw order-book feed for one market.
#[async_trait]
pub trait MarketDataTransport: Send + Sync {
    /// Lazy, infinite message stream. The stream may end when the transport
    /// gives up on a connection; callers reopen it.
    fn open_stream(&self, native_id: &NativeId) -> BoxStream<'static, AdapterResult<DepthMessage>>;

    /// Full book snapshot over the request/response path.
    async fn fetch_snapshot(&self, native_id: &NativeId) -> AdapterResult<DepthMessage>;
}

/// Reya market metadata and prices.
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn market_definitions(&self) -> AdapterResult<Vec<MarketDefinition>>;

    async fn market_summary(&self, native_id: &NativeId) -> AdapterResult<MarketSummary>;

    async fn prices(&self, native_id: &NativeId) -> AdapterResult<PriceResponse>;
}

/// Account-scoped reads keyed by wallet address.
#[async_trait]
pub trait AccountSource: Send + Sync {
    async fn account_balances(&self, address: &str) -> AdapterResult<Vec<AccountBalanceEntry>>;

    async fn positions(&self, address: &str) -> AdapterResult<Vec<PositionEntry>>;

    async fn open_orders(&self, address: &str) -> AdapterResult<Vec<OpenOrderEntry>>;
}

// ─── Candles ─────────────────────────────────────────────────────────────────

/// Reya's own candle endpoint.
#[async_trait]
pub trait NativeCandleSource: Send + Sync {
    /// Whether arbitrary `[start, end)` windows can be served efficiently.
    fn has_ranged_history(&self) -> bool;

    fn supports(&self, timeframe: Timeframe) -> bool;

    async fn candle_history(
        &self,
        native_id: &NativeId,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AdapterResult<ReyaCandleHistory>;
}

/// Third-party spot exchange used when Reya cannot serve a candle request.
#[async_trait]
pub trait FallbackCandleSource: Send + Sync {
    /// Upper bound on candles returned by one `fetch_candles` call.
    fn max_candles_per_request(&self) -> usize;

    fn supports(&self, _timeframe: Timeframe) -> bool {
        true
    }

    /// Candles whose open time lies in `[start, end)`.
    async fn fetch_candles(
        &self,
        pair: &NativeId,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AdapterResult<Vec<SpotKline>>;
}
