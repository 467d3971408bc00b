//! Wire types for candle sources.

use crate::shared::serde_util::FlexDecimal;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ─── Fallback spot exchange ──────────────────────────────────────────────────

/// One Binance kline, sent as a 12-element array:
///
/// `[openTime, open, high, low, close, volume, closeTime, quoteVolume,
///   trades, takerBuyBase, takerBuyQuote, ignore]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotKline(
    pub i64,
    pub Decimal,
    pub Decimal,
    pub Decimal,
    pub Decimal,
    pub Decimal,
    pub i64,
    pub Decimal,
    pub u64,
    pub Decimal,
    pub Decimal,
    pub String,
);

impl SpotKline {
    /// Open time, epoch milliseconds.
    pub fn open_time(&self) -> i64 {
        self.0
    }

    pub fn open(&self) -> Decimal {
        self.1
    }

    pub fn high(&self) -> Decimal {
        self.2
    }

    pub fn low(&self) -> Decimal {
        self.3
    }

    pub fn close(&self) -> Decimal {
        self.4
    }

    pub fn volume(&self) -> Decimal {
        self.5
    }
}

// ─── Reya candle history ─────────────────────────────────────────────────────

/// Columnar response of `GET /v2/candleHistory/{symbol}/{resolution}`.
///
/// Times are epoch seconds; Reya reports no volume.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReyaCandleHistory {
    pub t: Vec<i64>,
    pub o: Vec<FlexDecimal>,
    pub h: Vec<FlexDecimal>,
    pub l: Vec<FlexDecimal>,
    pub c: Vec<FlexDecimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kline_from_array() {
        let json = r#"[
            1499040000000, "0.01634790", "0.80000000", "0.01575800", "0.01577100",
            "148976.11427815", 1499644799999, "2434.19055334", 308,
            "1756.87402397", "28.46694368", "0"
        ]"#;
        let k: SpotKline = serde_json::from_str(json).unwrap();
        assert_eq!(k.open_time(), 1_499_040_000_000);
        assert_eq!(k.high(), Decimal::new(8, 1));
        assert_eq!(k.8, 308);
    }

    #[test]
    fn test_history_columns_accept_numbers() {
        let json = r#"{"t":[1700000000,1700003600],"o":[1,"2"],"h":[3,4],"l":[0.5,1],"c":["2",3]}"#;
        let h: ReyaCandleHistory = serde_json::from_str(json).unwrap();
        assert_eq!(h.t.len(), 2);
        assert_eq!(Decimal::from(h.o[1]), Decimal::from(2));
    }
}
