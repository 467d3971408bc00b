//! High-level client: `ReyaExchange` with nested sub-client accessors and the
//! flat operation set of the uniform exchange interface.
//!
//! Each domain has its own sub-client in `domain/<name>/client.rs`.
//! This module keeps the builder, shared state, the capability gate and the
//! retry wrapper every read goes through.

use crate::capability::{Capability, CapabilityTable, Operation, NO_BACKEND_ENDPOINT};
use crate::config::AdapterConfig;
use crate::domain::account::client::Accounts;
use crate::domain::account::{AccountStateReader, Balance, Leverage, Position};
use crate::domain::candle::client::Candles;
use crate::domain::candle::{Candle, CandleRouter};
use crate::domain::market::catalog::CatalogEntry;
use crate::domain::market::client::Markets;
use crate::domain::market::{FundingRate, Market, MarketCatalog, Ticker};
use crate::domain::order::client::Orders;
use crate::domain::order::gateway::StatusSource;
use crate::domain::order::{OpenOrder, OrderGateway, OrderRequest, OrderResult};
use crate::domain::orderbook::client::Orderbooks;
use crate::domain::orderbook::{MarketDataCache, OrderBookSnapshot};
use crate::error::{AdapterError, AdapterResult};
use crate::ports::{
    AccountSource, FallbackCandleSource, MarketDataTransport, MarketSource, NativeCandleSource,
    Signer,
};
use crate::retry::RetryConfig;
use crate::shared::{AccountId, OrderId, Symbol, Timeframe};

use async_lock::{Mutex, RwLock};
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

// Re-export sub-client types for convenience.
pub use crate::domain::account::client::Accounts as AccountsClient;
pub use crate::domain::candle::client::Candles as CandlesClient;
pub use crate::domain::market::client::Markets as MarketsClient;
pub use crate::domain::order::client::Orders as OrdersClient;
pub use crate::domain::orderbook::client::Orderbooks as OrderbooksClient;

/// The primary entry point: one Reya deployment behind the uniform
/// exchange interface.
///
/// Provides nested sub-client accessors for each domain
/// (`exchange.markets()`, `exchange.orders()`, ...) and the flat
/// operation names (`fetch_markets`, `create_order`, ...) on top of them.
pub struct ReyaExchange {
    pub(crate) capabilities: CapabilityTable,
    pub(crate) catalog: Arc<MarketCatalog>,
    pub(crate) market_source: Arc<dyn MarketSource>,
    pub(crate) book_cache: Arc<MarketDataCache>,
    pub(crate) candles: CandleRouter,
    pub(crate) accounts: AccountStateReader,
    pub(crate) gateway: OrderGateway,
    pub(crate) retry: RetryConfig,
    /// Market metadata cache: (markets, fetched_at)
    pub(crate) market_cache: RwLock<Option<(Vec<Market>, Instant)>>,
    /// Held while market metadata loads, so concurrent callers share one load.
    pub(crate) market_load: Mutex<()>,
    pub(crate) market_cache_ttl: Duration,
    pub(crate) default_account: Option<AccountId>,
}

impl ReyaExchange {
    pub fn builder() -> ReyaExchangeBuilder {
        ReyaExchangeBuilder::default()
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn markets(&self) -> Markets<'_> {
        Markets { client: self }
    }

    pub fn orderbooks(&self) -> Orderbooks<'_> {
        Orderbooks { client: self }
    }

    pub fn candles(&self) -> Candles<'_> {
        Candles { client: self }
    }

    pub fn accounts(&self) -> Accounts<'_> {
        Accounts { client: self }
    }

    pub fn orders(&self) -> Orders<'_> {
        Orders { client: self }
    }

    // ── Capabilities ─────────────────────────────────────────────────────

    /// How `operation` is served. Static; never probes a backend.
    pub fn has(&self, operation: Operation) -> Capability {
        self.capabilities.get(operation)
    }

    /// The whole capability table.
    pub fn capabilities(&self) -> impl Iterator<Item = (Operation, Capability)> + '_ {
        self.capabilities.entries()
    }

    pub fn catalog(&self) -> &MarketCatalog {
        &self.catalog
    }

    /// `Unsupported` operations short-circuit here, before any backend call.
    pub(crate) fn gate(&self, operation: Operation) -> AdapterResult<Capability> {
        match self.capabilities.get(operation) {
            Capability::Unsupported { reason } => {
                tracing::debug!(%operation, reason, "Rejecting unsupported operation");
                Err(AdapterError::Unsupported { operation, reason })
            }
            capability => Ok(capability),
        }
    }

    /// Run a backend read under the retry policy.
    pub(crate) async fn read<T, F, Fut>(&self, operation: Operation, call: F) -> AdapterResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AdapterResult<T>>,
    {
        self.retry.run(operation.as_str(), call).await
    }

    pub(crate) fn account_or_default(&self, account: Option<&AccountId>) -> AdapterResult<AccountId> {
        account
            .or(self.default_account.as_ref())
            .cloned()
            .ok_or_else(|| AdapterError::invalid("no account given and no default wallet configured"))
    }

    /// Unsupported operations that name a market: an unknown symbol is
    /// reported as `NotSupported` first.
    fn unsupported_for<T>(&self, symbol: &Symbol, operation: Operation) -> AdapterResult<T> {
        self.catalog.resolve(symbol)?;
        self.unsupported(operation)
    }

    pub(crate) fn unsupported<T>(&self, operation: Operation) -> AdapterResult<T> {
        self.gate(operation)?;
        Err(AdapterError::Unsupported {
            operation,
            reason: NO_BACKEND_ENDPOINT,
        })
    }

    // ── Uniform interface ────────────────────────────────────────────────

    pub async fn fetch_markets(&self) -> AdapterResult<Vec<Market>> {
        self.markets().all().await
    }

    /// Cached markets, or a fresh load when `reload` is set.
    pub async fn load_markets(&self, reload: bool) -> AdapterResult<Vec<Market>> {
        if reload {
            self.markets().reload().await
        } else {
            self.markets().all().await
        }
    }

    pub async fn market(&self, symbol: &Symbol) -> AdapterResult<Market> {
        self.markets().get(symbol).await
    }

    pub async fn fetch_ticker(&self, symbol: &Symbol) -> AdapterResult<Ticker> {
        self.markets().ticker(symbol).await
    }

    pub async fn fetch_funding_rate(&self, symbol: &Symbol) -> AdapterResult<FundingRate> {
        self.markets().funding_rate(symbol).await
    }

    pub async fn fetch_order_book(
        &self,
        symbol: &Symbol,
        depth: Option<usize>,
    ) -> AdapterResult<Arc<OrderBookSnapshot>> {
        self.orderbooks().get(symbol, depth).await
    }

    pub fn subscribe_order_book(
        &self,
        symbol: &Symbol,
    ) -> AdapterResult<BoxStream<'static, AdapterResult<Arc<OrderBookSnapshot>>>> {
        self.orderbooks().subscribe(symbol)
    }

    pub async fn refresh_order_book(&self, symbol: &Symbol) -> AdapterResult<Arc<OrderBookSnapshot>> {
        self.orderbooks().refresh(symbol).await
    }

    pub async fn fetch_ohlcv(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AdapterResult<Vec<Candle>> {
        self.candles().get(symbol, timeframe, start, end).await
    }

    pub async fn fetch_balance(&self, account: Option<&AccountId>) -> AdapterResult<Vec<Balance>> {
        self.accounts().balance(account).await
    }

    pub async fn fetch_positions(&self, account: Option<&AccountId>) -> AdapterResult<Vec<Position>> {
        self.accounts().positions(account).await
    }

    pub async fn fetch_open_orders(&self, account: Option<&AccountId>) -> AdapterResult<Vec<OpenOrder>> {
        self.orders().open(account).await
    }

    pub async fn create_order(&self, request: OrderRequest) -> AdapterResult<OrderResult> {
        self.orders().create(request).await
    }

    pub async fn cancel_order(&self, id: &OrderId) -> AdapterResult<OrderResult> {
        self.orders().cancel(id).await
    }

    pub async fn fetch_order(&self, id: &OrderId) -> AdapterResult<OrderResult> {
        self.orders().get(id).await
    }

    pub async fn fetch_canceled_and_closed_orders(
        &self,
        account: Option<&AccountId>,
    ) -> AdapterResult<Vec<OrderResult>> {
        self.orders().canceled_and_closed(account).await
    }

    pub async fn set_leverage(&self, symbol: &Symbol, _leverage: Decimal) -> AdapterResult<()> {
        self.unsupported_for(symbol, Operation::SetLeverage)
    }

    pub async fn fetch_leverage(&self, symbol: &Symbol) -> AdapterResult<Leverage> {
        self.unsupported_for(symbol, Operation::FetchLeverage)
    }

    pub async fn set_margin_mode(&self, symbol: &Symbol, _mode: &str) -> AdapterResult<()> {
        self.unsupported_for(symbol, Operation::SetMarginMode)
    }

    pub async fn withdraw(&self, _asset: &str, _amount: Decimal, _address: &str) -> AdapterResult<()> {
        self.unsupported(Operation::Withdraw)
    }

    /// Drop cached books and market metadata. Order history is kept.
    pub async fn reset(&self) {
        self.book_cache.reset().await;
        *self.market_cache.write().await = None;
        tracing::info!("Adapter caches reset");
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

/// Builds a [`ReyaExchange`]. Every backend defaults to the public Reya
/// deployment (with the `http` feature) and can be replaced individually.
#[derive(Default)]
pub struct ReyaExchangeBuilder {
    config: AdapterConfig,
    signer: Option<Arc<dyn Signer>>,
    market_source: Option<Arc<dyn MarketSource>>,
    account_source: Option<Arc<dyn AccountSource>>,
    transport: Option<Arc<dyn MarketDataTransport>>,
    native_candles: Option<Arc<dyn NativeCandleSource>>,
    fallback_candles: Option<Arc<dyn FallbackCandleSource>>,
}

impl ReyaExchangeBuilder {
    pub fn config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn api_url(mut self, url: &str) -> Self {
        self.config.api_url = url.to_string();
        self
    }

    pub fn ws_url(mut self, url: &str) -> Self {
        self.config.ws_url = url.to_string();
        self
    }

    pub fn account(mut self, account: impl Into<AccountId>) -> Self {
        self.config.account = Some(account.into());
        self
    }

    pub fn staleness_window(mut self, window: Duration) -> Self {
        self.config.staleness_window = window;
        self
    }

    pub fn order_timeout(mut self, timeout: Duration) -> Self {
        self.config.order_timeout = timeout;
        self
    }

    pub fn market_cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.market_cache_ttl = ttl;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn recognized_collateral<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.recognized_collateral = assets.into_iter().map(Into::into).collect();
        self
    }

    pub fn catalog(mut self, entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        self.config.catalog = entries.into_iter().collect();
        self
    }

    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn market_source(mut self, source: Arc<dyn MarketSource>) -> Self {
        self.market_source = Some(source);
        self
    }

    pub fn account_source(mut self, source: Arc<dyn AccountSource>) -> Self {
        self.account_source = Some(source);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn MarketDataTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn native_candles(mut self, source: Arc<dyn NativeCandleSource>) -> Self {
        self.native_candles = Some(source);
        self
    }

    pub fn fallback_candles(mut self, source: Arc<dyn FallbackCandleSource>) -> Self {
        self.fallback_candles = Some(source);
        self
    }

    pub fn build(self) -> AdapterResult<ReyaExchange> {
        let config = self.config;

        #[cfg(feature = "http")]
        let http = crate::http::ReyaHttp::new(&config.api_url)
            .map_err(|e| e.into_adapter(crate::error::Backend::ReyaRest))?;

        let market_source: Arc<dyn MarketSource> = match self.market_source {
            Some(source) => source,
            #[cfg(feature = "http")]
            None => Arc::new(http.clone()),
            #[cfg(not(feature = "http"))]
            None => return Err(missing("market source")),
        };
        let account_source: Arc<dyn AccountSource> = match self.account_source {
            Some(source) => source,
            #[cfg(feature = "http")]
            None => Arc::new(http.clone()),
            #[cfg(not(feature = "http"))]
            None => return Err(missing("account source")),
        };
        let native_candles: Option<Arc<dyn NativeCandleSource>> = match self.native_candles {
            Some(source) => Some(source),
            #[cfg(feature = "http")]
            None => Some(Arc::new(http.clone())),
            #[cfg(not(feature = "http"))]
            None => None,
        };
        let fallback_candles: Arc<dyn FallbackCandleSource> = match self.fallback_candles {
            Some(source) => source,
            #[cfg(feature = "http")]
            None => Arc::new(
                crate::http::BinanceKlines::new(&config.fallback_url)
                    .map_err(|e| e.into_adapter(crate::error::Backend::Fallback))?,
            ),
            #[cfg(not(feature = "http"))]
            None => return Err(missing("fallback candle source")),
        };
        let transport: Arc<dyn MarketDataTransport> = match self.transport {
            Some(transport) => transport,
            #[cfg(feature = "ws-native")]
            None => Arc::new(crate::ws::ReyaWsTransport::new(
                crate::ws::WsConfig {
                    url: config.ws_url.clone(),
                    ..crate::ws::WsConfig::default()
                },
                http.clone(),
            )),
            #[cfg(all(feature = "http", not(feature = "ws-native")))]
            None => Arc::new(crate::http::RestPollingTransport::new(
                http.clone(),
                crate::http::polling::DEFAULT_POLL_INTERVAL,
            )),
            #[cfg(not(feature = "http"))]
            None => return Err(missing("market data transport")),
        };

        let catalog = Arc::new(MarketCatalog::new(config.catalog));
        let status = config.account.clone().map(|account| StatusSource {
            source: Arc::clone(&account_source),
            account,
        });

        tracing::debug!(
            markets = catalog.len(),
            signer = self.signer.is_some(),
            "Building Reya exchange adapter"
        );

        Ok(ReyaExchange {
            capabilities: CapabilityTable,
            book_cache: Arc::new(MarketDataCache::new(
                Arc::clone(&catalog),
                transport,
                config.staleness_window,
            )),
            candles: CandleRouter::new(Arc::clone(&catalog), native_candles, fallback_candles),
            accounts: AccountStateReader::new(
                Arc::clone(&catalog),
                account_source,
                Arc::clone(&market_source),
                config.recognized_collateral,
            ),
            gateway: OrderGateway::new(
                Arc::clone(&catalog),
                self.signer,
                status,
                config.order_timeout,
                config.order_history_capacity,
            ),
            catalog,
            market_source,
            retry: config.retry,
            market_cache: RwLock::new(None),
            market_load: Mutex::new(()),
            market_cache_ttl: config.market_cache_ttl,
            default_account: config.account,
        })
    }
}

#[cfg(not(feature = "http"))]
fn missing(what: &str) -> AdapterError {
    AdapterError::invalid(format!("no {} configured and the http feature is disabled", what))
}
