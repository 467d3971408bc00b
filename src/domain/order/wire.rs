//! Wire types for `GET /v2/wallet/{address}/openOrders`.

use crate::shared::NativeId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One resting (or conditional) order of the wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrderEntry {
    #[serde(default)]
    pub exchange_id: Option<u32>,
    pub symbol: NativeId,
    #[serde(default)]
    pub account_id: Option<u64>,
    pub order_id: String,
    pub qty: Decimal,
    #[serde(default)]
    pub exec_qty: Decimal,
    /// `B` (buy) or `A` (sell).
    pub side: String,
    #[serde(default)]
    pub limit_px: Option<Decimal>,
    /// `LIMIT`, `TP`, `SL`, ...
    pub order_type: String,
    #[serde(default)]
    pub trigger_px: Option<Decimal>,
    #[serde(default)]
    pub time_in_force: Option<String>,
    #[serde(default)]
    pub reduce_only: Option<bool>,
    /// `OPEN`, `FILLED`, `CANCELLED`, `REJECTED`.
    pub status: String,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub last_update_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_order_deserialize() {
        let json = r#"{
            "exchangeId": 1,
            "symbol": "BTCRUSDPERP",
            "accountId": 12345,
            "orderId": "123456789-123123123",
            "qty": "1.0",
            "execQty": "0.5",
            "side": "B",
            "limitPx": "43000.00",
            "orderType": "TP",
            "triggerPx": "50000.0",
            "timeInForce": "GTC",
            "reduceOnly": false,
            "status": "OPEN",
            "createdAt": 1747927089946,
            "lastUpdateAt": 1747927089946
        }"#;
        let o: OpenOrderEntry = serde_json::from_str(json).unwrap();
        assert_eq!(o.order_id, "123456789-123123123");
        assert_eq!(o.exec_qty, Decimal::new(5, 1));
        assert_eq!(o.trigger_px, Some(Decimal::from(50000)));
        assert_eq!(o.reduce_only, Some(false));
    }

    #[test]
    fn test_open_order_minimal() {
        let json = r#"{"symbol":"ETHRUSDPERP","orderId":"7","qty":"2","side":"A","orderType":"LIMIT","status":"OPEN"}"#;
        let o: OpenOrderEntry = serde_json::from_str(json).unwrap();
        assert_eq!(o.exec_qty, Decimal::ZERO);
        assert!(o.limit_px.is_none());
    }
}
