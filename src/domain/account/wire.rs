//! Wire types for wallet-scoped Reya endpoints.
//!
//! - `GET /v2/wallet/{address}/accountBalances`
//! - `GET /v2/wallet/{address}/positions`

use crate::shared::NativeId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One asset balance of one margin account owned by the wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalanceEntry {
    #[serde(default)]
    pub account_id: Option<u64>,
    pub asset: String,
    pub real_balance: Decimal,
}

/// A single position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionEntry {
    #[serde(default)]
    pub exchange_id: Option<u32>,
    pub symbol: NativeId,
    #[serde(default)]
    pub account_id: Option<u64>,
    pub qty: Decimal,
    /// `B` (long) or `A` (short).
    pub side: String,
    pub avg_entry_price: Decimal,
    #[serde(default)]
    pub avg_entry_funding_value: Option<Decimal>,
    #[serde(default)]
    pub last_trade_sequence_number: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_deserialize() {
        let json = r#"{
            "exchangeId": 1,
            "symbol": "BTCRUSDPERP",
            "accountId": 12345,
            "qty": "1.5",
            "side": "B",
            "avgEntryPrice": "43000.00",
            "avgEntryFundingValue": "100.25",
            "lastTradeSequenceNumber": 152954
        }"#;
        let p: PositionEntry = serde_json::from_str(json).unwrap();
        assert_eq!(p.qty, Decimal::new(15, 1));
        assert_eq!(p.side, "B");
        assert_eq!(p.account_id, Some(12345));
    }

    #[test]
    fn test_balance_deserialize() {
        let json = r#"[{"accountId":1,"asset":"RUSD","realBalance":"100.5"},{"accountId":1,"asset":"SRUSD","realBalance":"7"}]"#;
        let b: Vec<AccountBalanceEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(b[1].asset, "SRUSD");
    }
}
