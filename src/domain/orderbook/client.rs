//! Orderbooks sub-client: cached depth, live subscription, forced refresh.

use crate::capability::Operation;
use crate::client::ReyaExchange;
use crate::domain::orderbook::OrderBookSnapshot;
use crate::error::AdapterResult;
use crate::shared::Symbol;
use futures_util::stream::BoxStream;
use std::sync::Arc;

/// Sub-client for order-book operations.
pub struct Orderbooks<'a> {
    pub(crate) client: &'a ReyaExchange,
}

impl<'a> Orderbooks<'a> {
    /// Current book, optionally truncated to `depth` levels per side.
    ///
    /// Served from the market data cache. A market that has never received
    /// data is pulled once over REST; one whose feed went quiet past the
    /// staleness window returns `Stale`.
    pub async fn get(
        &self,
        symbol: &Symbol,
        depth: Option<usize>,
    ) -> AdapterResult<Arc<OrderBookSnapshot>> {
        self.client.gate(Operation::FetchOrderBook)?;
        let book = self
            .client
            .read(Operation::FetchOrderBook, || self.client.book_cache.current(symbol))
            .await?;
        Ok(match depth {
            Some(d) => Arc::new(book.truncated(d)),
            None => book,
        })
    }

    /// Cached book only; never touches a backend.
    pub async fn cached(&self, symbol: &Symbol) -> AdapterResult<Arc<OrderBookSnapshot>> {
        self.client.gate(Operation::FetchOrderBook)?;
        self.client.book_cache.get_snapshot(symbol).await
    }

    /// Infinite stream of books as the feed updates them.
    pub fn subscribe(
        &self,
        symbol: &Symbol,
    ) -> AdapterResult<BoxStream<'static, AdapterResult<Arc<OrderBookSnapshot>>>> {
        self.client.gate(Operation::FetchOrderBook)?;
        self.client.book_cache.subscribe(symbol)
    }

    /// Force a REST snapshot into the cache.
    pub async fn refresh(&self, symbol: &Symbol) -> AdapterResult<Arc<OrderBookSnapshot>> {
        self.client.gate(Operation::FetchOrderBook)?;
        self.client
            .read(Operation::FetchOrderBook, || self.client.book_cache.refresh(symbol))
            .await
    }
}
