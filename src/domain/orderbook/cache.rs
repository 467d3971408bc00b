//! Market data cache: live order books assembled from the push feed and
//! REST snapshots.
//!
//! Partitioned by symbol; the partition map is built once from the catalog.
//! Each partition has one writer lock (serializes message application for
//! that symbol) and a separately published `Arc<OrderBookSnapshot>` that
//! readers clone without touching the writer.

use crate::domain::market::MarketCatalog;
use crate::domain::orderbook::state::{BookState, DeltaOutcome};
use crate::domain::orderbook::wire::DepthMessage;
use crate::domain::orderbook::OrderBookSnapshot;
use crate::error::{AdapterError, AdapterResult};
use crate::ports::MarketDataTransport;
use crate::shared::{NativeId, Symbol};

use async_lock::{Mutex, RwLock};
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Delay before reopening a transport stream that ended.
const REOPEN_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone)]
struct Published {
    snapshot: Arc<OrderBookSnapshot>,
    received_at: Instant,
}

struct Partition {
    symbol: Symbol,
    native_id: NativeId,
    writer: Mutex<BookState>,
    published: RwLock<Option<Published>>,
}

impl Partition {
    fn new(symbol: Symbol, native_id: NativeId) -> Self {
        Self {
            symbol,
            native_id,
            writer: Mutex::new(BookState::new()),
            published: RwLock::new(None),
        }
    }

    /// Apply one feed message, resnapshotting on a gap.
    ///
    /// Returns the newly published snapshot, or `None` if the message
    /// changed nothing.
    async fn ingest(
        &self,
        transport: &dyn MarketDataTransport,
        msg: DepthMessage,
    ) -> AdapterResult<Option<Arc<OrderBookSnapshot>>> {
        let mut book = self.writer.lock().await;
        // Mutations land on a copy that is committed only after every await.
        let mut next = book.clone();

        match next.apply(&msg) {
            DeltaOutcome::Applied => {}
            DeltaOutcome::Duplicate => {
                tracing::debug!(
                    symbol = %self.symbol,
                    seq = msg.sequence_number,
                    version = book.version(),
                    "Discarded stale book message"
                );
                return Ok(None);
            }
            outcome @ (DeltaOutcome::Gap { .. } | DeltaOutcome::Uninitialized) => {
                tracing::info!(symbol = %self.symbol, ?outcome, "Resnapshotting book");
                let snapshot = transport.fetch_snapshot(&self.native_id).await?;
                let took_snapshot = next.apply_snapshot(&snapshot);
                let delta = next.apply_delta(&msg);
                if let DeltaOutcome::Gap { expected, got } = delta {
                    tracing::warn!(
                        symbol = %self.symbol,
                        expected,
                        got,
                        "Snapshot still behind the feed; dropping delta"
                    );
                }
                if !took_snapshot && delta != DeltaOutcome::Applied {
                    return Ok(None);
                }
            }
        }

        Ok(self.commit(&mut book, next).await)
    }

    /// Fetch a REST snapshot and publish it if it is not older than the book.
    async fn refresh(
        &self,
        transport: &dyn MarketDataTransport,
    ) -> AdapterResult<Arc<OrderBookSnapshot>> {
        let mut book = self.writer.lock().await;
        let snapshot = transport.fetch_snapshot(&self.native_id).await?;
        let mut next = book.clone();
        if !next.apply_snapshot(&snapshot) {
            tracing::debug!(
                symbol = %self.symbol,
                seq = snapshot.sequence_number,
                version = book.version(),
                "Book already newer than REST snapshot"
            );
        }
        self.commit(&mut book, next)
            .await
            .ok_or_else(|| AdapterError::Stale {
                symbol: self.symbol.clone(),
                detail: "snapshot produced no book".to_string(),
            })
    }

    async fn commit(
        &self,
        book: &mut BookState,
        next: BookState,
    ) -> Option<Arc<OrderBookSnapshot>> {
        let mut published = self.published.write().await;
        *book = next;
        let snapshot = Arc::new(book.to_snapshot(&self.symbol)?);
        *published = Some(Published {
            snapshot: Arc::clone(&snapshot),
            received_at: Instant::now(),
        });
        Some(snapshot)
    }

    async fn read(&self) -> Option<Published> {
        self.published.read().await.clone()
    }

    async fn reset(&self) {
        let mut book = self.writer.lock().await;
        let mut published = self.published.write().await;
        book.clear();
        *published = None;
    }
}

/// Live order books for every catalog market.
pub struct MarketDataCache {
    catalog: Arc<MarketCatalog>,
    transport: Arc<dyn MarketDataTransport>,
    staleness: Duration,
    partitions: HashMap<Symbol, Arc<Partition>>,
}

impl MarketDataCache {
    pub fn new(
        catalog: Arc<MarketCatalog>,
        transport: Arc<dyn MarketDataTransport>,
        staleness: Duration,
    ) -> Self {
        let partitions = catalog
            .entries()
            .iter()
            .map(|e| {
                (
                    e.symbol.clone(),
                    Arc::new(Partition::new(e.symbol.clone(), e.native_id.clone())),
                )
            })
            .collect();
        Self {
            catalog,
            transport,
            staleness,
            partitions,
        }
    }

    pub fn staleness_window(&self) -> Duration {
        self.staleness
    }

    fn partition(&self, symbol: &Symbol) -> AdapterResult<&Arc<Partition>> {
        self.catalog.resolve(symbol)?;
        self.partitions
            .get(symbol)
            .ok_or_else(|| AdapterError::invalid(format!("no cache partition for {}", symbol)))
    }

    /// Latest published book, or `Stale` if nothing arrived within the
    /// staleness window (or nothing ever arrived).
    pub async fn get_snapshot(&self, symbol: &Symbol) -> AdapterResult<Arc<OrderBookSnapshot>> {
        let partition = self.partition(symbol)?;
        match partition.read().await {
            None => Err(AdapterError::Stale {
                symbol: symbol.clone(),
                detail: "no book received yet".to_string(),
            }),
            Some(p) if p.received_at.elapsed() > self.staleness => Err(AdapterError::Stale {
                symbol: symbol.clone(),
                detail: format!(
                    "last update {}ms ago exceeds {}ms window",
                    p.received_at.elapsed().as_millis(),
                    self.staleness.as_millis()
                ),
            }),
            Some(p) => Ok(p.snapshot),
        }
    }

    /// Like [`get_snapshot`](Self::get_snapshot), but pulls a REST snapshot
    /// when the partition has never received anything.
    pub async fn current(&self, symbol: &Symbol) -> AdapterResult<Arc<OrderBookSnapshot>> {
        let partition = self.partition(symbol)?;
        if partition.read().await.is_none() {
            return partition.refresh(self.transport.as_ref()).await;
        }
        self.get_snapshot(symbol).await
    }

    /// Force a REST snapshot for `symbol`.
    pub async fn refresh(&self, symbol: &Symbol) -> AdapterResult<Arc<OrderBookSnapshot>> {
        self.partition(symbol)?
            .refresh(self.transport.as_ref())
            .await
    }

    /// Apply one feed message for `symbol`.
    pub async fn apply_message(
        &self,
        symbol: &Symbol,
        msg: DepthMessage,
    ) -> AdapterResult<Option<Arc<OrderBookSnapshot>>> {
        let partition = self.partition(symbol)?;
        if msg.symbol != partition.native_id {
            return Err(AdapterError::invalid(format!(
                "message for {} offered to {}",
                msg.symbol, symbol
            )));
        }
        partition.ingest(self.transport.as_ref(), msg).await
    }

    /// Infinite stream of book snapshots for `symbol`.
    ///
    /// Drives the transport stream; when it ends, it is reopened after a
    /// short delay. Transport and resnapshot errors are yielded in-band.
    pub fn subscribe(
        &self,
        symbol: &Symbol,
    ) -> AdapterResult<BoxStream<'static, AdapterResult<Arc<OrderBookSnapshot>>>> {
        let partition = Arc::clone(self.partition(symbol)?);
        let transport = Arc::clone(&self.transport);

        Ok(Box::pin(async_stream::stream! {
            loop {
                let mut messages = transport.open_stream(&partition.native_id);
                while let Some(item) = messages.next().await {
                    match item {
                        Ok(msg) if msg.symbol != partition.native_id => {
                            tracing::debug!(got = %msg.symbol, "Ignoring message for another market");
                        }
                        Ok(msg) => match partition.ingest(transport.as_ref(), msg).await {
                            Ok(Some(snapshot)) => yield Ok(snapshot),
                            Ok(None) => {}
                            Err(e) => yield Err(e),
                        },
                        Err(e) => yield Err(e),
                    }
                }
                tracing::info!(symbol = %partition.symbol, "Market data stream ended, reopening");
                futures_timer::Delay::new(REOPEN_DELAY).await;
            }
        }))
    }

    /// Drop every book.
    pub async fn reset(&self) {
        for partition in self.partitions.values() {
            partition.reset().await;
        }
    }
}
