//! Shared newtypes and utilities used across all domain modules.
//!
//! The identifier newtypes are serialization-transparent: they serialize and
//! deserialize identically to the raw strings the backends send, so they can
//! be used directly in wire types without conversion overhead.

pub mod serde_util;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

// ─── Symbol ──────────────────────────────────────────────────────────────────

/// Canonical trading-pair identifier in `BASE/QUOTE` form (e.g. `"BTC/USD"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base asset (`"BTC"` for `"BTC/USD"`).
    pub fn base(&self) -> &str {
        self.0.split('/').next().unwrap_or(&self.0)
    }

    /// Quote asset (`"USD"` for `"BTC/USD"`). Empty when the symbol has no `/`.
    pub fn quote(&self) -> &str {
        self.0.split_once('/').map(|(_, q)| q).unwrap_or("")
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ─── NativeId ────────────────────────────────────────────────────────────────

/// Exchange-native instrument identifier (e.g. `"BTCRUSDPERP"` on Reya,
/// `"BTCUSDT"` on the fallback spot exchange).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NativeId(String);

impl NativeId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NativeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NativeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NativeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ─── AccountId ───────────────────────────────────────────────────────────────

/// Account identifier. On Reya this is the owning wallet address; every
/// account-scoped REST endpoint is keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ─── OrderId ─────────────────────────────────────────────────────────────────

/// Client-assigned order identifier. The adapter keys its order history by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ─── Side ────────────────────────────────────────────────────────────────────

/// Order or position side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Parse Reya's single-letter side code: `B` (bid/buy) or `A` (ask/sell).
    pub fn from_wire(code: &str) -> Option<Self> {
        match code {
            "B" | "b" => Some(Side::Buy),
            "A" | "a" => Some(Side::Sell),
            _ => None,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Side::Buy)
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

// ─── Timeframe ───────────────────────────────────────────────────────────────

/// Candle timeframe. Every variant has a fixed duration, so
/// `open_time + timeframe == close_time` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "2h")]
    Hour2,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "12h")]
    Hour12,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "1w")]
    Week1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 10] = [
        Self::Minute1,
        Self::Minute5,
        Self::Minute15,
        Self::Minute30,
        Self::Hour1,
        Self::Hour2,
        Self::Hour4,
        Self::Hour12,
        Self::Day1,
        Self::Week1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "1m",
            Self::Minute5 => "5m",
            Self::Minute15 => "15m",
            Self::Minute30 => "30m",
            Self::Hour1 => "1h",
            Self::Hour2 => "2h",
            Self::Hour4 => "4h",
            Self::Hour12 => "12h",
            Self::Day1 => "1d",
            Self::Week1 => "1w",
        }
    }

    /// Duration of one candle in seconds.
    pub fn seconds(&self) -> u64 {
        match self {
            Self::Minute1 => 60,
            Self::Minute5 => 300,
            Self::Minute15 => 900,
            Self::Minute30 => 1_800,
            Self::Hour1 => 3_600,
            Self::Hour2 => 7_200,
            Self::Hour4 => 14_400,
            Self::Hour12 => 43_200,
            Self::Day1 => 86_400,
            Self::Week1 => 604_800,
        }
    }

    pub fn millis(&self) -> i64 {
        self.seconds() as i64 * 1_000
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.seconds())
    }

    /// Offset of the candle grid from the Unix epoch, in milliseconds.
    ///
    /// Weekly candles open on Monday 00:00 UTC; the epoch was a Thursday.
    pub fn grid_offset_millis(&self) -> i64 {
        match self {
            Self::Week1 => 4 * 86_400_000,
            _ => 0,
        }
    }

    /// Whether `millis` is an open time on this timeframe's grid.
    pub fn is_aligned(&self, millis: i64) -> bool {
        (millis - self.grid_offset_millis()).rem_euclid(self.millis()) == 0
    }

    /// Smallest grid point `>= millis`.
    pub fn align_up(&self, millis: i64) -> i64 {
        let step = self.millis();
        let offset = self.grid_offset_millis();
        let rem = (millis - offset).rem_euclid(step);
        if rem == 0 {
            millis
        } else {
            millis + (step - rem)
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|tf| tf.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown timeframe '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_base_quote() {
        let s = Symbol::from("BTC/USD");
        assert_eq!(s.base(), "BTC");
        assert_eq!(s.quote(), "USD");

        let bare = Symbol::from("BTC");
        assert_eq!(bare.base(), "BTC");
        assert_eq!(bare.quote(), "");
    }

    #[test]
    fn test_symbol_serde_is_transparent() {
        let s = Symbol::from("ETH/USD");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"ETH/USD\"");
        let back: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }

    #[test]
    fn test_side_from_wire() {
        assert_eq!(Side::from_wire("B"), Some(Side::Buy));
        assert_eq!(Side::from_wire("A"), Some(Side::Sell));
        assert_eq!(Side::from_wire("X"), None);
    }

    #[test]
    fn test_timeframe_parse_and_seconds() {
        let tf: Timeframe = "1h".parse().unwrap();
        assert_eq!(tf, Timeframe::Hour1);
        assert_eq!(tf.seconds(), 3600);
        assert_eq!(tf.millis(), 3_600_000);
        assert!("1M".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_timeframe_ordering_follows_duration() {
        for pair in Timeframe::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].seconds() < pair[1].seconds());
        }
    }

    #[test]
    fn test_align_up() {
        let tf = Timeframe::Hour1;
        assert_eq!(tf.align_up(0), 0);
        assert_eq!(tf.align_up(1), 3_600_000);
        assert_eq!(tf.align_up(3_600_000), 3_600_000);
        assert!(tf.is_aligned(7_200_000));
        assert!(!tf.is_aligned(7_200_001));
    }

    #[test]
    fn test_weekly_grid_starts_on_monday() {
        // 2024-01-01 00:00 UTC was a Monday.
        let monday = 1_704_067_200_000;
        assert!(Timeframe::Week1.is_aligned(monday));
        assert_eq!(Timeframe::Week1.align_up(monday - 1), monday);
    }

    #[test]
    fn test_timeframe_serde() {
        let r: Timeframe = serde_json::from_str("\"1d\"").unwrap();
        assert_eq!(r, Timeframe::Day1);
        assert_eq!(serde_json::to_string(&Timeframe::Week1).unwrap(), "\"1w\"");
    }
}
