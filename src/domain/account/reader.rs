//! Account state reader: pull-based balances, positions and open orders.
//!
//! Balances are restricted to the recognized-collateral allow-list: any other
//! asset in the backend response is left out, never reported as zero.
//! Backend failures propagate as errors, never as empty results.

use super::{Balance, Position};
use crate::domain::market::MarketCatalog;
use crate::domain::order::OpenOrder;
use crate::error::{AdapterError, AdapterResult, Backend};
use crate::ports::{AccountSource, MarketSource};
use crate::shared::{AccountId, NativeId};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

pub struct AccountStateReader {
    catalog: Arc<MarketCatalog>,
    accounts: Arc<dyn AccountSource>,
    markets: Arc<dyn MarketSource>,
    collateral: Vec<String>,
}

impl AccountStateReader {
    pub fn new(
        catalog: Arc<MarketCatalog>,
        accounts: Arc<dyn AccountSource>,
        markets: Arc<dyn MarketSource>,
        collateral: Vec<String>,
    ) -> Self {
        Self {
            catalog,
            accounts,
            markets,
            collateral,
        }
    }

    pub fn recognized_collateral(&self) -> &[String] {
        &self.collateral
    }

    fn recognized(&self, asset: &str) -> Option<&str> {
        self.collateral
            .iter()
            .find(|c| c.eq_ignore_ascii_case(asset))
            .map(String::as_str)
    }

    /// Balances of recognized collateral, summed across the wallet's margin
    /// accounts, in allow-list order.
    pub async fn get_balance(&self, account: &AccountId) -> AdapterResult<Vec<Balance>> {
        let entries = self.accounts.account_balances(account.as_str()).await?;

        let mut totals: HashMap<&str, Decimal> = HashMap::new();
        for entry in &entries {
            match self.recognized(&entry.asset) {
                Some(asset) => *totals.entry(asset).or_default() += entry.real_balance,
                None => tracing::debug!(asset = %entry.asset, "Omitting unrecognized collateral"),
            }
        }

        Ok(self
            .collateral
            .iter()
            .filter_map(|asset| {
                totals.get(asset.as_str()).map(|&total| Balance {
                    account: account.clone(),
                    asset: asset.clone(),
                    free: total,
                    locked: None,
                    total,
                })
            })
            .collect())
    }

    /// Non-zero positions on catalog markets, with PnL against the current
    /// mark price.
    pub async fn get_positions(&self, account: &AccountId) -> AdapterResult<Vec<Position>> {
        let entries = self.accounts.positions(account.as_str()).await?;

        let mut marks: HashMap<NativeId, Decimal> = HashMap::new();
        let mut out = Vec::new();
        for entry in &entries {
            if entry.qty.is_zero() {
                continue;
            }
            let Some(market) = self.catalog.lookup_native(&entry.symbol) else {
                tracing::debug!(market = %entry.symbol, "Omitting position outside catalog");
                continue;
            };

            let mark = match marks.get(&entry.symbol) {
                Some(&mark) => mark,
                None => {
                    let mark = self.mark_price(&entry.symbol).await?;
                    marks.insert(entry.symbol.clone(), mark);
                    mark
                }
            };

            let position = Position::from_entry(market.symbol.clone(), entry, mark)
                .map_err(|e| AdapterError::unavailable(Backend::ReyaRest, e))?;
            out.extend(position);
        }
        Ok(out)
    }

    /// Open orders on catalog markets.
    pub async fn get_open_orders(&self, account: &AccountId) -> AdapterResult<Vec<OpenOrder>> {
        let entries = self.accounts.open_orders(account.as_str()).await?;
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(market) = self.catalog.lookup_native(&entry.symbol) else {
                tracing::debug!(market = %entry.symbol, "Omitting open order outside catalog");
                continue;
            };
            let order = OpenOrder::try_from_entry(market.symbol.clone(), entry)
                .map_err(|e| AdapterError::unavailable(Backend::ReyaRest, e))?;
            out.push(order);
        }
        Ok(out)
    }

    async fn mark_price(&self, native_id: &NativeId) -> AdapterResult<Decimal> {
        self.markets.prices(native_id).await?.mark().ok_or_else(|| {
            AdapterError::unavailable(
                Backend::ReyaRest,
                format!("no mark price for {}", native_id),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::wire::{AccountBalanceEntry, PositionEntry};
    use crate::domain::market::wire::{MarketDefinition, MarketSummary, PriceResponse};
    use crate::domain::order::wire::OpenOrderEntry;
    use crate::error::ErrorKind;
    use crate::shared::serde_util::FlexDecimal;
    use crate::shared::{Side, Symbol};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeAccounts {
        balances: Vec<AccountBalanceEntry>,
        positions: Vec<PositionEntry>,
        fail: bool,
    }

    #[async_trait]
    impl AccountSource for FakeAccounts {
        async fn account_balances(&self, _: &str) -> AdapterResult<Vec<AccountBalanceEntry>> {
            if self.fail {
                return Err(AdapterError::unavailable(Backend::ReyaRest, "503"));
            }
            Ok(self.balances.clone())
        }

        async fn positions(&self, _: &str) -> AdapterResult<Vec<PositionEntry>> {
            Ok(self.positions.clone())
        }

        async fn open_orders(&self, _: &str) -> AdapterResult<Vec<OpenOrderEntry>> {
            Ok(Vec::new())
        }
    }

    struct FakePrices {
        pool: Option<i64>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketSource for FakePrices {
        async fn market_definitions(&self) -> AdapterResult<Vec<MarketDefinition>> {
            unimplemented!()
        }

        async fn market_summary(&self, _: &NativeId) -> AdapterResult<MarketSummary> {
            unimplemented!()
        }

        async fn prices(&self, native_id: &NativeId) -> AdapterResult<PriceResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PriceResponse {
                symbol: native_id.clone(),
                oracle_price: None,
                pool_price: self.pool.map(|p| FlexDecimal(Decimal::from(p))),
                updated_at: 0,
            })
        }
    }

    fn balance(asset: &str, amount: i64) -> AccountBalanceEntry {
        AccountBalanceEntry {
            account_id: Some(1),
            asset: asset.to_string(),
            real_balance: Decimal::from(amount),
        }
    }

    fn position(symbol: &str, qty: i64, side: &str) -> PositionEntry {
        PositionEntry {
            exchange_id: Some(1),
            symbol: NativeId::from(symbol),
            account_id: Some(1),
            qty: Decimal::from(qty),
            side: side.to_string(),
            avg_entry_price: Decimal::from(100),
            avg_entry_funding_value: None,
            last_trade_sequence_number: None,
        }
    }

    fn reader(accounts: FakeAccounts, pool: Option<i64>) -> (AccountStateReader, Arc<FakePrices>) {
        let prices = Arc::new(FakePrices {
            pool,
            calls: AtomicUsize::new(0),
        });
        let reader = AccountStateReader::new(
            Arc::new(MarketCatalog::default()),
            Arc::new(accounts),
            prices.clone(),
            vec!["RUSD".to_string()],
        );
        (reader, prices)
    }

    #[tokio::test]
    async fn test_balance_keeps_only_recognized_collateral() {
        let accounts = FakeAccounts {
            balances: vec![balance("RUSD", 100), balance("WETH", 5)],
            ..Default::default()
        };
        let (reader, _) = reader(accounts, None);
        let balances = reader.get_balance(&AccountId::from("0xabc")).await.unwrap();

        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].asset, "RUSD");
        assert_eq!(balances[0].total, Decimal::from(100));
        assert_eq!(balances[0].free, Decimal::from(100));
        assert_eq!(balances[0].locked, None);
    }

    #[tokio::test]
    async fn test_balance_sums_across_accounts() {
        let accounts = FakeAccounts {
            balances: vec![balance("RUSD", 100), balance("rusd", 50)],
            ..Default::default()
        };
        let (reader, _) = reader(accounts, None);
        let balances = reader.get_balance(&AccountId::from("0xabc")).await.unwrap();
        assert_eq!(balances[0].total, Decimal::from(150));
    }

    #[tokio::test]
    async fn test_balance_failure_is_not_empty() {
        let accounts = FakeAccounts {
            fail: true,
            ..Default::default()
        };
        let (reader, _) = reader(accounts, None);
        let err = reader.get_balance(&AccountId::from("0xabc")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
    }

    #[tokio::test]
    async fn test_positions_filter_and_mark_once_per_market() {
        let accounts = FakeAccounts {
            positions: vec![
                position("BTCRUSDPERP", 1, "B"),
                position("BTCRUSDPERP", 2, "A"),
                position("ETHRUSDPERP", 0, "B"),
                position("SOLRUSDPERP", 3, "B"),
            ],
            ..Default::default()
        };
        let (reader, prices) = reader(accounts, Some(110));
        let positions = reader.get_positions(&AccountId::from("0xabc")).await.unwrap();

        assert_eq!(positions.len(), 2);
        assert!(positions.iter().all(|p| p.symbol == Symbol::from("BTC/USD")));
        assert_eq!(positions[0].side, Side::Buy);
        assert_eq!(positions[0].unrealized_pnl, Decimal::from(10));
        assert_eq!(positions[1].unrealized_pnl, Decimal::from(-20));
        assert_eq!(prices.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_positions_without_mark_fail() {
        let accounts = FakeAccounts {
            positions: vec![position("BTCRUSDPERP", 1, "B")],
            ..Default::default()
        };
        let (reader, _) = reader(accounts, None);
        let err = reader.get_positions(&AccountId::from("0xabc")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
    }
}
