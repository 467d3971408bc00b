//! Ticker and funding-rate views of a market.

use crate::shared::Symbol;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Latest prices for a market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: Symbol,
    pub timestamp: DateTime<Utc>,
    /// Pool (mark) price.
    pub last: Option<Decimal>,
    pub mark_price: Option<Decimal>,
    pub index_price: Option<Decimal>,
    /// 24h volume in quote units.
    pub quote_volume: Option<Decimal>,
    /// Absolute 24h price change.
    pub change: Option<Decimal>,
    /// 24h price change in percent of the opening price.
    pub percentage: Option<Decimal>,
    pub open_interest: Option<Decimal>,
}

/// Current funding rate of a perpetual market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRate {
    pub symbol: Symbol,
    pub funding_rate: Decimal,
    pub mark_price: Option<Decimal>,
    pub index_price: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
    /// Next funding settlement.
    pub funding_timestamp: DateTime<Utc>,
    #[serde(with = "interval_secs")]
    pub interval: Duration,
}

/// Funding accrues hourly on Reya.
pub const FUNDING_INTERVAL: Duration = Duration::from_secs(3_600);

mod interval_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
