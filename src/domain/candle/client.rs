//! Candles sub-client: OHLCV over an explicit time range.

use crate::capability::Operation;
use crate::client::ReyaExchange;
use crate::domain::candle::Candle;
use crate::error::AdapterResult;
use crate::shared::{Symbol, Timeframe};
use chrono::{DateTime, Utc};

/// Sub-client for candle operations.
pub struct Candles<'a> {
    pub(crate) client: &'a ReyaExchange,
}

impl<'a> Candles<'a> {
    /// Candles with open time in `[start, end)`. Both bounds are required;
    /// there is no "most recent N" form.
    pub async fn get(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AdapterResult<Vec<Candle>> {
        let capability = self.client.gate(Operation::FetchOhlcv)?;
        self.client
            .read(Operation::FetchOhlcv, || {
                self.client
                    .candles
                    .get_candles(symbol, timeframe, start, end, capability)
            })
            .await
    }
}
