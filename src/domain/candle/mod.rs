//! Candle domain: canonical OHLCV bars and the router that sources them.

pub mod client;
mod convert;
pub mod router;
pub mod wire;

pub use router::CandleRouter;

use crate::shared::{Symbol, Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One OHLCV bar. `close_time == open_time + timeframe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Base-asset volume; zero when the source does not report it.
    pub volume: Decimal,
}

impl Candle {
    /// `[open_ms, open, high, low, close, volume]`, the row layout
    /// multi-exchange libraries use.
    pub fn to_row(&self) -> (i64, Decimal, Decimal, Decimal, Decimal, Decimal) {
        (
            self.open_time.timestamp_millis(),
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
        )
    }
}
