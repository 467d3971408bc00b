//! Conversion: spot klines and Reya candle columns → `Candle`.

use super::wire::{ReyaCandleHistory, SpotKline};
use super::Candle;
use crate::shared::serde_util::{from_millis, from_secs};
use crate::shared::{Symbol, Timeframe};
use rust_decimal::Decimal;

impl Candle {
    /// `None` if the open or close time is not representable.
    pub(crate) fn from_kline(symbol: &Symbol, timeframe: Timeframe, k: &SpotKline) -> Option<Self> {
        let open_time = from_millis(k.open_time())?;
        Some(Candle {
            symbol: symbol.clone(),
            timeframe,
            open_time,
            close_time: open_time.checked_add_signed(timeframe_delta(timeframe))?,
            open: k.open(),
            high: k.high(),
            low: k.low(),
            close: k.close(),
            volume: k.volume(),
        })
    }
}

impl ReyaCandleHistory {
    /// Zip the columns into candles. Errors when the columns disagree in length.
    pub(crate) fn into_candles(
        self,
        symbol: &Symbol,
        timeframe: Timeframe,
    ) -> Result<Vec<Candle>, String> {
        let n = self.t.len();
        if [self.o.len(), self.h.len(), self.l.len(), self.c.len()]
            .iter()
            .any(|&len| len != n)
        {
            return Err(format!(
                "column lengths differ: t={} o={} h={} l={} c={}",
                n,
                self.o.len(),
                self.h.len(),
                self.l.len(),
                self.c.len()
            ));
        }

        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let Some(open_time) = from_secs(self.t[i]) else {
                continue;
            };
            let Some(close_time) = open_time.checked_add_signed(timeframe_delta(timeframe)) else {
                continue;
            };
            out.push(Candle {
                symbol: symbol.clone(),
                timeframe,
                open_time,
                close_time,
                open: self.o[i].into(),
                high: self.h[i].into(),
                low: self.l[i].into(),
                close: self.c[i].into(),
                volume: Decimal::ZERO,
            });
        }
        Ok(out)
    }
}

pub(crate) fn timeframe_delta(timeframe: Timeframe) -> chrono::TimeDelta {
    chrono::TimeDelta::milliseconds(timeframe.millis())
}
