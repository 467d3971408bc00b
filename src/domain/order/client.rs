//! Orders sub-client: submit, cancel, query.
//!
//! Order actions are never retried by the facade: a second broadcast could
//! place a second order.

use crate::capability::Operation;
use crate::client::ReyaExchange;
use crate::domain::order::{OpenOrder, OrderRequest, OrderResult};
use crate::error::AdapterResult;
use crate::shared::{AccountId, OrderId};

pub struct Orders<'a> {
    pub(crate) client: &'a ReyaExchange,
}

impl<'a> Orders<'a> {
    pub async fn create(&self, request: OrderRequest) -> AdapterResult<OrderResult> {
        self.client.gate(Operation::CreateOrder)?;
        self.client.gateway.submit(request).await
    }

    pub async fn cancel(&self, id: &OrderId) -> AdapterResult<OrderResult> {
        self.client.gate(Operation::CancelOrder)?;
        self.client.gateway.cancel(id).await
    }

    pub async fn get(&self, id: &OrderId) -> AdapterResult<OrderResult> {
        self.client.gate(Operation::FetchOrder)?;
        self.client
            .read(Operation::FetchOrder, || self.client.gateway.query_status(id))
            .await
    }

    /// Resting orders of `account`, or of the configured default account.
    pub async fn open(&self, account: Option<&AccountId>) -> AdapterResult<Vec<OpenOrder>> {
        self.client.gate(Operation::FetchOpenOrders)?;
        let account = self.client.account_or_default(account)?;
        self.client
            .read(Operation::FetchOpenOrders, || {
                self.client.accounts.get_open_orders(&account)
            })
            .await
    }

    /// Always `Unsupported`: Reya exposes no history of closed orders.
    pub async fn canceled_and_closed(
        &self,
        _account: Option<&AccountId>,
    ) -> AdapterResult<Vec<OrderResult>> {
        self.client.unsupported(Operation::FetchCanceledAndClosedOrders)
    }
}
