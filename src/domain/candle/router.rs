//! Candle router: picks the native or fallback source per request and
//! normalizes whatever comes back onto the timeframe grid.

use super::convert::timeframe_delta;
use super::Candle;
use crate::capability::{Capability, Operation};
use crate::domain::market::MarketCatalog;
use crate::error::{AdapterError, AdapterResult, NotSupportedCause};
use crate::ports::{FallbackCandleSource, NativeCandleSource};
use crate::shared::serde_util::from_millis;
use crate::shared::{Symbol, Timeframe};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Longest timeframe the native path is ever asked for.
pub const NATIVE_MAX_TIMEFRAME: Timeframe = Timeframe::Day1;

/// Where a request is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Native,
    Fallback,
}

pub struct CandleRouter {
    catalog: Arc<MarketCatalog>,
    native: Option<Arc<dyn NativeCandleSource>>,
    fallback: Arc<dyn FallbackCandleSource>,
}

impl CandleRouter {
    pub fn new(
        catalog: Arc<MarketCatalog>,
        native: Option<Arc<dyn NativeCandleSource>>,
        fallback: Arc<dyn FallbackCandleSource>,
    ) -> Self {
        Self {
            catalog,
            native,
            fallback,
        }
    }

    /// Serve a `Delegated` capability from the fallback source. A `Native`
    /// capability needs a native source that holds ranged history for
    /// `timeframe`, within the native maximum.
    pub fn route(&self, capability: Capability, timeframe: Timeframe) -> AdapterResult<Route> {
        match capability {
            Capability::Delegated { .. } => Ok(Route::Fallback),
            Capability::Native => match &self.native {
                Some(native)
                    if timeframe <= NATIVE_MAX_TIMEFRAME
                        && native.has_ranged_history()
                        && native.supports(timeframe) =>
                {
                    Ok(Route::Native)
                }
                _ => Err(AdapterError::NotSupported {
                    subject: timeframe.to_string(),
                    cause: NotSupportedCause::Timeframe,
                    detail: format!("no native ranged history for {} candles", timeframe),
                }),
            },
            Capability::Unsupported { reason } => Err(AdapterError::Unsupported {
                operation: Operation::FetchOhlcv,
                reason,
            }),
        }
    }

    /// Candles with open time in `[start, end)`, ascending, one per grid point
    /// at most. Grid points the source has no data for are left out.
    ///
    /// `capability` is the table entry for `fetchOHLCV` and decides the source.
    pub async fn get_candles(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        capability: Capability,
    ) -> AdapterResult<Vec<Candle>> {
        let entry = self.catalog.resolve(symbol)?;
        if end <= start {
            return Err(AdapterError::invalid(format!(
                "end ({}) must be after start ({})",
                end, start
            )));
        }

        let aligned = timeframe.align_up(start.timestamp_millis());
        let end_ms = end.timestamp_millis();
        if aligned >= end_ms {
            return Ok(Vec::new());
        }
        let aligned_start = from_millis(aligned)
            .ok_or_else(|| AdapterError::invalid(format!("start out of range: {}", start)))?;
        // The last candle closes on the first grid point at or after `end`.
        if from_millis(timeframe.align_up(end_ms)).is_none() {
            return Err(AdapterError::invalid(format!(
                "end ({}) leaves the last {} candle closing past the representable time range",
                end, timeframe
            )));
        }

        let raw = match (self.route(capability, timeframe)?, &self.native) {
            (Route::Native, Some(native)) => {
                tracing::debug!(%symbol, %timeframe, "Serving candles natively");
                native
                    .candle_history(&entry.native_id, timeframe, aligned_start, end)
                    .await?
                    .into_candles(symbol, timeframe)
                    .map_err(|e| {
                        AdapterError::unavailable(
                            crate::error::Backend::ReyaRest,
                            format!("malformed candle history: {}", e),
                        )
                    })?
            }
            _ => {
                let pair = entry.fallback_id.as_ref().ok_or_else(|| AdapterError::NotSupported {
                    subject: symbol.to_string(),
                    cause: NotSupportedCause::BackendLacksMarket,
                    detail: "no fallback pair configured for delegated candles".to_string(),
                })?;
                if !self.fallback.supports(timeframe) {
                    return Err(AdapterError::NotSupported {
                        subject: timeframe.to_string(),
                        cause: NotSupportedCause::Timeframe,
                        detail: format!("fallback exchange has no {} candles", timeframe),
                    });
                }
                tracing::debug!(%symbol, %timeframe, %pair, "Delegating candles to fallback");
                self.fetch_fallback(symbol, pair, timeframe, aligned_start, end)
                    .await?
            }
        };

        Ok(normalize(raw, timeframe, aligned, end_ms))
    }

    /// Walk `[start, end)` in windows of at most `max_candles_per_request`.
    async fn fetch_fallback(
        &self,
        symbol: &Symbol,
        pair: &crate::shared::NativeId,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AdapterResult<Vec<Candle>> {
        let limit = i64::try_from(self.fallback.max_candles_per_request().max(1)).unwrap_or(i64::MAX);
        let page = timeframe
            .millis()
            .checked_mul(limit)
            .and_then(chrono::TimeDelta::try_milliseconds);
        let mut out = Vec::new();
        let mut cursor = start;
        while cursor < end {
            let window_end = page
                .and_then(|page| cursor.checked_add_signed(page))
                .map_or(end, |t| t.min(end));
            let klines = self
                .fallback
                .fetch_candles(pair, timeframe, cursor, window_end)
                .await?;
            out.extend(
                klines
                    .iter()
                    .filter_map(|k| Candle::from_kline(symbol, timeframe, k)),
            );
            cursor = window_end;
        }
        Ok(out)
    }
}

/// Keep aligned candles in `[start_ms, end_ms)`, ascending, de-duplicated by
/// open time (first one wins), with `close_time` recomputed. Candles whose
/// close time is not representable are dropped.
pub(crate) fn normalize(
    mut candles: Vec<Candle>,
    timeframe: Timeframe,
    start_ms: i64,
    end_ms: i64,
) -> Vec<Candle> {
    candles.retain(|c| {
        let t = c.open_time.timestamp_millis();
        t >= start_ms && t < end_ms && timeframe.is_aligned(t)
    });
    candles.sort_by_key(|c| c.open_time);
    candles.dedup_by_key(|c| c.open_time);
    candles
        .into_iter()
        .filter_map(|mut c| {
            c.timeframe = timeframe;
            c.close_time = c.open_time.checked_add_signed(timeframe_delta(timeframe))?;
            Some(c)
        })
        .collect()
}
