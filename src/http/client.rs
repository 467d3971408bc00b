//! Low-level HTTP client for the public Reya REST API: `ReyaHttp`.
//!
//! One method per endpoint, returning wire types. Each call is a single
//! attempt; retries belong to the facade so every backend gets the same
//! policy.

use crate::domain::account::wire::{AccountBalanceEntry, PositionEntry};
use crate::domain::candle::wire::ReyaCandleHistory;
use crate::domain::market::wire::{MarketDefinition, MarketSummary, PriceResponse};
use crate::domain::order::wire::OpenOrderEntry;
use crate::domain::orderbook::wire::DepthMessage;
use crate::error::{AdapterResult, Backend, HttpError};
use crate::ports::{AccountSource, MarketSource, NativeCandleSource};
use crate::shared::{NativeId, Timeframe};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Resolutions `candleHistory` understands.
const CANDLE_RESOLUTIONS: [Timeframe; 6] = [
    Timeframe::Minute1,
    Timeframe::Minute5,
    Timeframe::Minute15,
    Timeframe::Hour1,
    Timeframe::Hour4,
    Timeframe::Day1,
];

/// Low-level HTTP client for the Reya REST API.
#[derive(Clone)]
pub struct ReyaHttp {
    base_url: String,
    client: Client,
}

impl ReyaHttp {
    pub fn new(base_url: &str) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Reuse an existing `reqwest` client (connection pool, proxies, TLS).
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Markets ──────────────────────────────────────────────────────────

    pub async fn get_market_definitions(&self) -> Result<Vec<MarketDefinition>, HttpError> {
        let url = format!("{}/v2/marketDefinitions", self.base_url);
        self.get(&url).await
    }

    pub async fn get_market_summary(&self, symbol: &str) -> Result<MarketSummary, HttpError> {
        let url = format!(
            "{}/v2/market/{}/summary",
            self.base_url,
            urlencoding::encode(symbol)
        );
        self.get(&url).await
    }

    pub async fn get_prices(&self, symbol: &str) -> Result<PriceResponse, HttpError> {
        let url = format!("{}/v2/prices/{}", self.base_url, urlencoding::encode(symbol));
        self.get(&url).await
    }

    // ── Orderbooks ───────────────────────────────────────────────────────

    pub async fn get_depth(&self, symbol: &str) -> Result<DepthMessage, HttpError> {
        let url = format!(
            "{}/v2/market/{}/depth",
            self.base_url,
            urlencoding::encode(symbol)
        );
        self.get(&url).await
    }

    // ── Candles ──────────────────────────────────────────────────────────

    /// Most recent candles at `resolution`. The endpoint takes no range.
    pub async fn get_candle_history(
        &self,
        symbol: &str,
        resolution: &str,
    ) -> Result<ReyaCandleHistory, HttpError> {
        let url = format!(
            "{}/v2/candleHistory/{}/{}",
            self.base_url,
            urlencoding::encode(symbol),
            resolution
        );
        self.get(&url).await
    }

    // ── Wallet ───────────────────────────────────────────────────────────

    pub async fn get_account_balances(
        &self,
        address: &str,
    ) -> Result<Vec<AccountBalanceEntry>, HttpError> {
        let url = format!(
            "{}/v2/wallet/{}/accountBalances",
            self.base_url,
            urlencoding::encode(address)
        );
        self.get(&url).await
    }

    pub async fn get_positions(&self, address: &str) -> Result<Vec<PositionEntry>, HttpError> {
        let url = format!(
            "{}/v2/wallet/{}/positions",
            self.base_url,
            urlencoding::encode(address)
        );
        self.get(&url).await
    }

    pub async fn get_open_orders(&self, address: &str) -> Result<Vec<OpenOrderEntry>, HttpError> {
        let url = format!(
            "{}/v2/wallet/{}/openOrders",
            self.base_url,
            urlencoding::encode(address)
        );
        self.get(&url).await
    }

    // ── Internal HTTP methods ────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, HttpError> {
        get_json(&self.client, url).await
    }
}

/// `GET` and decode a JSON body, mapping non-success statuses.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
) -> Result<T, HttpError> {
    tracing::trace!(url, "GET");
    let resp = client.get(url).send().await?;
    let status = resp.status();

    if status.is_success() {
        let parsed = resp.json::<T>().await?;
        return Ok(parsed);
    }

    let status_code = status.as_u16();
    let body_text = resp.text().await.unwrap_or_default();

    match status_code {
        404 => Err(HttpError::NotFound(body_text)),
        429 => Err(HttpError::RateLimited),
        400..=499 => Err(HttpError::BadRequest(body_text)),
        _ => Err(HttpError::ServerError {
            status: status_code,
            body: body_text,
        }),
    }
}

// ── Capability implementations ───────────────────────────────────────────

#[async_trait]
impl MarketSource for ReyaHttp {
    async fn market_definitions(&self) -> AdapterResult<Vec<MarketDefinition>> {
        self.get_market_definitions()
            .await
            .map_err(|e| e.into_adapter(Backend::ReyaRest))
    }

    async fn market_summary(&self, native_id: &NativeId) -> AdapterResult<MarketSummary> {
        self.get_market_summary(native_id.as_str())
            .await
            .map_err(|e| e.into_adapter(Backend::ReyaRest))
    }

    async fn prices(&self, native_id: &NativeId) -> AdapterResult<PriceResponse> {
        self.get_prices(native_id.as_str())
            .await
            .map_err(|e| e.into_adapter(Backend::ReyaRest))
    }
}

#[async_trait]
impl AccountSource for ReyaHttp {
    async fn account_balances(&self, address: &str) -> AdapterResult<Vec<AccountBalanceEntry>> {
        self.get_account_balances(address)
            .await
            .map_err(|e| e.into_adapter(Backend::ReyaRest))
    }

    async fn positions(&self, address: &str) -> AdapterResult<Vec<PositionEntry>> {
        self.get_positions(address)
            .await
            .map_err(|e| e.into_adapter(Backend::ReyaRest))
    }

    async fn open_orders(&self, address: &str) -> AdapterResult<Vec<OpenOrderEntry>> {
        self.get_open_orders(address)
            .await
            .map_err(|e| e.into_adapter(Backend::ReyaRest))
    }
}

#[async_trait]
impl NativeCandleSource for ReyaHttp {
    /// `candleHistory` only serves the most recent window.
    fn has_ranged_history(&self) -> bool {
        false
    }

    fn supports(&self, timeframe: Timeframe) -> bool {
        CANDLE_RESOLUTIONS.contains(&timeframe)
    }

    async fn candle_history(
        &self,
        native_id: &NativeId,
        timeframe: Timeframe,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> AdapterResult<ReyaCandleHistory> {
        self.get_candle_history(native_id.as_str(), timeframe.as_str())
            .await
            .map_err(|e| e.into_adapter(Backend::ReyaRest))
    }
}
