//! Accounts sub-client: collateral balances and positions.

use crate::capability::Operation;
use crate::client::ReyaExchange;
use crate::domain::account::{Balance, Position};
use crate::error::AdapterResult;
use crate::shared::AccountId;

pub struct Accounts<'a> {
    pub(crate) client: &'a ReyaExchange,
}

impl<'a> Accounts<'a> {
    /// Recognized-collateral balances. `account` falls back to the
    /// configured wallet.
    pub async fn balance(&self, account: Option<&AccountId>) -> AdapterResult<Vec<Balance>> {
        self.client.gate(Operation::FetchBalance)?;
        let account = self.client.account_or_default(account)?;
        self.client
            .read(Operation::FetchBalance, || {
                self.client.accounts.get_balance(&account)
            })
            .await
    }

    pub async fn positions(&self, account: Option<&AccountId>) -> AdapterResult<Vec<Position>> {
        self.client.gate(Operation::FetchPositions)?;
        let account = self.client.account_or_default(account)?;
        self.client
            .read(Operation::FetchPositions, || {
                self.client.accounts.get_positions(&account)
            })
            .await
    }
}
