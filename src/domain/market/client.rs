//! Markets sub-client: catalog markets, tickers, funding. Market metadata
//! uses a TTL cache.

use crate::capability::Operation;
use crate::client::ReyaExchange;
use crate::domain::market::{FundingRate, Market, Ticker};
use crate::error::{AdapterError, AdapterResult, Backend, NotSupportedCause};
use crate::shared::Symbol;
use chrono::Utc;
use futures_util::future::try_join;
use std::time::Instant;

/// Sub-client for market operations.
pub struct Markets<'a> {
    pub(crate) client: &'a ReyaExchange,
}

impl<'a> Markets<'a> {
    /// Catalog markets the backend lists, in catalog order. Uses TTL cache.
    pub async fn all(&self) -> AdapterResult<Vec<Market>> {
        self.client.gate(Operation::FetchMarkets)?;
        if let Some(markets) = self.cached().await {
            return Ok(markets);
        }

        // Concurrent callers share one backend load.
        let _load = self.client.market_load.lock().await;
        if let Some(markets) = self.cached().await {
            return Ok(markets);
        }
        self.load().await
    }

    /// Bypass the cache and reload market metadata.
    pub async fn reload(&self) -> AdapterResult<Vec<Market>> {
        self.client.gate(Operation::FetchMarkets)?;
        let _load = self.client.market_load.lock().await;
        self.load().await
    }

    /// One market. `NotSupported` if it is not allow-listed, or allow-listed
    /// but missing from the backend.
    pub async fn get(&self, symbol: &Symbol) -> AdapterResult<Market> {
        self.client.catalog.resolve(symbol)?;
        self.all()
            .await?
            .into_iter()
            .find(|m| &m.symbol == symbol)
            .ok_or_else(|| AdapterError::NotSupported {
                subject: symbol.to_string(),
                cause: NotSupportedCause::BackendLacksMarket,
                detail: "not listed in Reya market definitions".to_string(),
            })
    }

    pub async fn ticker(&self, symbol: &Symbol) -> AdapterResult<Ticker> {
        let entry = self.client.catalog.resolve(symbol)?;
        self.client.gate(Operation::FetchTicker)?;
        let source = &self.client.market_source;
        let (price, summary) = self
            .client
            .read(Operation::FetchTicker, || {
                try_join(source.prices(&entry.native_id), source.market_summary(&entry.native_id))
            })
            .await?;
        Ok(Ticker::from_wire(entry.symbol.clone(), &price, &summary))
    }

    pub async fn funding_rate(&self, symbol: &Symbol) -> AdapterResult<FundingRate> {
        let entry = self.client.catalog.resolve(symbol)?;
        self.client.gate(Operation::FetchFundingRate)?;
        let source = &self.client.market_source;
        let summary = self
            .client
            .read(Operation::FetchFundingRate, || {
                source.market_summary(&entry.native_id)
            })
            .await?;
        Ok(FundingRate::from_summary(entry.symbol.clone(), &summary, Utc::now()))
    }

    /// Drop cached market metadata.
    pub async fn invalidate(&self) {
        *self.client.market_cache.write().await = None;
    }

    async fn cached(&self) -> Option<Vec<Market>> {
        let cache = self.client.market_cache.read().await;
        match cache.as_ref() {
            Some((markets, fetched_at)) if fetched_at.elapsed() < self.client.market_cache_ttl => {
                Some(markets.clone())
            }
            _ => None,
        }
    }

    async fn load(&self) -> AdapterResult<Vec<Market>> {
        let source = &self.client.market_source;
        let definitions = self
            .client
            .read(Operation::FetchMarkets, || source.market_definitions())
            .await?;

        let mut markets = Vec::with_capacity(self.client.catalog.len());
        for entry in self.client.catalog.entries() {
            let Some(def) = definitions.iter().find(|d| d.symbol == entry.native_id) else {
                tracing::warn!(symbol = %entry.symbol, native = %entry.native_id, "Catalog market missing from backend");
                continue;
            };
            let market = Market::try_from((entry, def.clone()))
                .map_err(|e| AdapterError::unavailable(Backend::ReyaRest, e))?;
            markets.push(market);
        }

        tracing::debug!(count = markets.len(), "Market metadata loaded");
        *self.client.market_cache.write().await = Some((markets.clone(), Instant::now()));
        Ok(markets)
    }
}
