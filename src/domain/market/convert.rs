//! Conversion: market wire types → `Market`, `Ticker`, `FundingRate`.

use super::ticker::FUNDING_INTERVAL;
use super::wire;
use super::{CatalogEntry, FundingRate, Limits, Market, Precision, Ticker, ValidationError};
use super::SETTLEMENT_ASSET;
use crate::shared::serde_util::from_millis;
use crate::shared::Symbol;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use rust_decimal::Decimal;

impl TryFrom<(&CatalogEntry, wire::MarketDefinition)> for Market {
    type Error = ValidationError;

    fn try_from((entry, def): (&CatalogEntry, wire::MarketDefinition)) -> Result<Self, Self::Error> {
        if def.symbol != entry.native_id {
            return Err(ValidationError::SymbolMismatch {
                expected: entry.native_id.clone(),
                got: def.symbol,
            });
        }
        for (field, value) in [
            ("tickSize", def.tick_size),
            ("qtyStepSize", def.qty_step_size),
        ] {
            if value <= Decimal::ZERO {
                return Err(ValidationError::NonPositive { field, value });
            }
        }

        Ok(Market {
            symbol: entry.symbol.clone(),
            native_id: def.symbol,
            market_id: def.market_id,
            base: entry.symbol.base().to_string(),
            quote: entry.symbol.quote().to_string(),
            settle: SETTLEMENT_ASSET.to_string(),
            precision: Precision {
                price: def.tick_size,
                amount: def.qty_step_size,
            },
            limits: Limits {
                min_amount: def.min_order_qty,
                max_open_interest: def.oi_cap,
            },
            max_leverage: def.max_leverage,
            fallback_id: entry.fallback_id.clone(),
        })
    }
}

impl Ticker {
    pub(crate) fn from_wire(
        symbol: Symbol,
        price: &wire::PriceResponse,
        summary: &wire::MarketSummary,
    ) -> Self {
        let last = price.mark().or(summary.throttled_pool_price);
        let index_price = price
            .oracle_price
            .map(Decimal::from)
            .or(summary.throttled_oracle_price);
        let percentage = match (last, summary.px_change24h) {
            (Some(last), Some(change)) if last - change != Decimal::ZERO => {
                Some(change / (last - change) * Decimal::ONE_HUNDRED)
            }
            _ => None,
        };
        let updated = price.updated_at.max(summary.updated_at);

        Ticker {
            symbol,
            timestamp: from_millis(updated).unwrap_or_else(Utc::now),
            last,
            mark_price: last,
            index_price,
            quote_volume: summary.volume24h,
            change: summary.px_change24h,
            percentage,
            open_interest: summary.oi_qty,
        }
    }
}

impl FundingRate {
    pub(crate) fn from_summary(
        symbol: Symbol,
        summary: &wire::MarketSummary,
        now: DateTime<Utc>,
    ) -> Self {
        FundingRate {
            symbol,
            funding_rate: summary.funding_rate,
            mark_price: summary.throttled_pool_price,
            index_price: summary.throttled_oracle_price,
            timestamp: from_millis(summary.updated_at).unwrap_or(now),
            funding_timestamp: next_funding(now),
            interval: FUNDING_INTERVAL,
        }
    }
}

/// Start of the next whole funding hour strictly after `now`.
fn next_funding(now: DateTime<Utc>) -> DateTime<Utc> {
    let hour = TimeDelta::hours(1);
    now.duration_trunc(hour).map(|t| t + hour).unwrap_or(now + hour)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::NativeId;
    use chrono::TimeZone;

    fn definition(symbol: &str, tick: Decimal) -> wire::MarketDefinition {
        wire::MarketDefinition {
            symbol: NativeId::from(symbol),
            market_id: 1,
            min_order_qty: Decimal::new(1, 3),
            qty_step_size: Decimal::new(1, 3),
            tick_size: tick,
            liquidation_margin_parameter: None,
            initial_margin_parameter: None,
            max_leverage: 40,
            oi_cap: Some(Decimal::from(10_000)),
        }
    }

    fn summary() -> wire::MarketSummary {
        wire::MarketSummary {
            symbol: NativeId::from("BTCRUSDPERP"),
            updated_at: 1_747_927_089_946,
            long_oi_qty: None,
            short_oi_qty: None,
            oi_qty: Some(Decimal::from(154)),
            funding_rate: Decimal::new(-5, 4),
            funding_rate_velocity: None,
            volume24h: Some(Decimal::from(917_833)),
            px_change24h: Some(Decimal::from(100)),
            throttled_oracle_price: Some(Decimal::from(1_099)),
            throttled_pool_price: Some(Decimal::from(1_100)),
            prices_updated_at: None,
        }
    }

    #[test]
    fn test_market_from_definition() {
        let entry = CatalogEntry::new("BTC/USD", "BTCRUSDPERP", 1, Some("BTCUSDT"));
        let market = Market::try_from((&entry, definition("BTCRUSDPERP", Decimal::new(1, 2)))).unwrap();
        assert_eq!(market.base, "BTC");
        assert_eq!(market.quote, "USD");
        assert_eq!(market.settle, "RUSD");
        assert_eq!(market.price_decimals(), 2);
        assert_eq!(market.amount_decimals(), 3);
        assert_eq!(market.fallback_id, Some(NativeId::from("BTCUSDT")));
    }

    #[test]
    fn test_market_rejects_mismatch_and_zero_tick() {
        let entry = CatalogEntry::new("BTC/USD", "BTCRUSDPERP", 1, None);
        assert!(matches!(
            Market::try_from((&entry, definition("ETHRUSDPERP", Decimal::ONE))),
            Err(ValidationError::SymbolMismatch { .. })
        ));
        assert!(matches!(
            Market::try_from((&entry, definition("BTCRUSDPERP", Decimal::ZERO))),
            Err(ValidationError::NonPositive { field: "tickSize", .. })
        ));
    }

    #[test]
    fn test_ticker_change_percentage() {
        let price = wire::PriceResponse {
            symbol: NativeId::from("BTCRUSDPERP"),
            oracle_price: None,
            pool_price: None,
            updated_at: 0,
        };
        let ticker = Ticker::from_wire(Symbol::from("BTC/USD"), &price, &summary());
        assert_eq!(ticker.last, Some(Decimal::from(1_100)));
        assert_eq!(ticker.index_price, Some(Decimal::from(1_099)));
        assert_eq!(ticker.percentage, Some(Decimal::from(10)));
    }

    #[test]
    fn test_next_funding_is_next_whole_hour() {
        let now = Utc.with_ymd_and_hms(2025, 5, 22, 15, 17, 3).unwrap();
        let rate = FundingRate::from_summary(Symbol::from("BTC/USD"), &summary(), now);
        assert_eq!(
            rate.funding_timestamp,
            Utc.with_ymd_and_hms(2025, 5, 22, 16, 0, 0).unwrap()
        );
        assert_eq!(rate.interval.as_secs(), 3_600);

        let on_the_hour = Utc.with_ymd_and_hms(2025, 5, 22, 16, 0, 0).unwrap();
        assert_eq!(
            next_funding(on_the_hour),
            Utc.with_ymd_and_hms(2025, 5, 22, 17, 0, 0).unwrap()
        );
    }
}
