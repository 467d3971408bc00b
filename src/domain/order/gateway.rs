//! Order gateway: validates requests, hands signing to the injected
//! [`Signer`], and owns each order's lifecycle record.
//!
//! The gateway never holds keys. Every signer call is all-or-nothing and
//! bounded by the configured order timeout; a call that outlives it resolves
//! the order to `failed` with [`FailureReason::Timeout`] instead of hanging.

use super::{FailureReason, OrderHistory, OrderRequest, OrderResult, OrderStatus, OrderType};
use crate::domain::market::MarketCatalog;
use crate::error::{AdapterError, AdapterResult};
use crate::ports::{
    AccountSource, BroadcastState, PlaceOrder, Signer, SignerAction, SignerFailure, TimeInForce,
    TxReceipt,
};
use crate::shared::{AccountId, OrderId};
use futures_util::future::{select, Either};
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Where non-terminal orders are re-read from.
pub struct StatusSource {
    pub source: Arc<dyn AccountSource>,
    pub account: AccountId,
}

pub struct OrderGateway {
    catalog: Arc<MarketCatalog>,
    signer: Option<Arc<dyn Signer>>,
    status: Option<StatusSource>,
    timeout: Duration,
    history: async_lock::Mutex<OrderHistory>,
    cancels: async_lock::Mutex<()>,
}

enum Outcome {
    Receipt(TxReceipt),
    Failed(SignerFailure),
    TimedOut,
}

impl OrderGateway {
    pub fn new(
        catalog: Arc<MarketCatalog>,
        signer: Option<Arc<dyn Signer>>,
        status: Option<StatusSource>,
        timeout: Duration,
        history_capacity: usize,
    ) -> Self {
        Self {
            catalog,
            signer,
            status,
            timeout,
            history: async_lock::Mutex::new(OrderHistory::new(history_capacity)),
            cancels: async_lock::Mutex::new(()),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Validate, record as `pending`, sign and broadcast.
    ///
    /// Backend outcomes (rejection, signing failure, timeout) come back as an
    /// `Ok` result with status `failed`; `Err` is reserved for requests that
    /// were never accepted.
    pub async fn submit(&self, request: OrderRequest) -> AdapterResult<OrderResult> {
        let entry = self.catalog.resolve(&request.symbol)?.clone();
        validate(&request)?;

        let mut result = {
            let mut history = self.history.lock().await;
            if let Some(existing) = history.get(&request.client_order_id) {
                if existing.matches(&request) {
                    return Ok(existing.clone());
                }
                return Err(AdapterError::invalid(format!(
                    "client order id '{}' already used for a different order",
                    request.client_order_id
                )));
            }
            let pending = OrderResult::pending(&request);
            history.insert(pending.clone());
            pending
        };

        let Some(signer) = self.signer.clone() else {
            result.fail(FailureReason::SigningFailure("no signer configured".to_string()));
            return Ok(self.record(result).await);
        };

        let action = SignerAction::Place(PlaceOrder {
            market_id: entry.market_id,
            native_id: entry.native_id,
            is_buy: request.side.is_buy(),
            qty: request.amount,
            limit_px: match request.order_type {
                OrderType::Limit => request.price,
                OrderType::Market => None,
            },
            time_in_force: match request.order_type {
                OrderType::Limit => TimeInForce::Gtc,
                OrderType::Market => TimeInForce::Ioc,
            },
            reduce_only: request.reduce_only,
            client_order_id: request.client_order_id.clone(),
        });

        match self.broadcast(signer.as_ref(), &action).await {
            Outcome::Receipt(receipt) => {
                tracing::info!(
                    client_order_id = %result.client_order_id,
                    tx = %receipt.tx_reference,
                    state = ?receipt.state,
                    "Order broadcast"
                );
                result.apply_receipt(receipt);
            }
            Outcome::Failed(failure) => {
                tracing::warn!(client_order_id = %result.client_order_id, error = %failure, "Order failed");
                result.fail(failure.into());
            }
            Outcome::TimedOut => {
                tracing::warn!(client_order_id = %result.client_order_id, "Order timed out");
                result.fail(FailureReason::Timeout {
                    after_ms: self.timeout_ms(),
                });
            }
        }
        Ok(self.record(result).await)
    }

    /// Cancel a tracked order.
    ///
    /// Terminal orders are returned unchanged without a backend call. A
    /// signer failure leaves the stored status untouched and surfaces as an
    /// error.
    pub async fn cancel(&self, id: &OrderId) -> AdapterResult<OrderResult> {
        let _serial = self.cancels.lock().await;

        let mut result = self.lookup(id).await?;
        if result.is_terminal() {
            return Ok(result);
        }
        let Some(exchange_order_id) = result.exchange_order_id.clone() else {
            return Err(AdapterError::invalid(format!(
                "order '{}' has no exchange order id yet (status {})",
                id, result.status
            )));
        };
        let entry = self.catalog.resolve(&result.symbol)?;
        let signer = self
            .signer
            .clone()
            .ok_or_else(|| AdapterError::SigningFailure("no signer configured".to_string()))?;

        let action = SignerAction::Cancel {
            exchange_order_id,
            native_id: entry.native_id.clone(),
        };
        match self.broadcast(signer.as_ref(), &action).await {
            Outcome::Receipt(mut receipt) => {
                if receipt.state == BroadcastState::Accepted {
                    receipt.state = BroadcastState::Cancelled;
                }
                result.apply_receipt(receipt);
                tracing::info!(client_order_id = %id, status = %result.status, "Order cancel confirmed");
                Ok(self.record(result).await)
            }
            Outcome::Failed(failure) => Err(AdapterError::SigningFailure(failure.to_string())),
            Outcome::TimedOut => Err(AdapterError::Timeout {
                operation: "cancelOrder".to_string(),
                after_ms: self.timeout_ms(),
            }),
        }
    }

    /// Current lifecycle record. Non-terminal orders are refreshed from the
    /// exchange's open-order list when a status source is configured.
    pub async fn query_status(&self, id: &OrderId) -> AdapterResult<OrderResult> {
        let mut result = self.lookup(id).await?;
        let Some(status) = &self.status else {
            return Ok(result);
        };
        let Some(exchange_order_id) = result.exchange_order_id.clone() else {
            return Ok(result);
        };
        if result.is_terminal() {
            return Ok(result);
        }

        let open = status.source.open_orders(status.account.as_str()).await?;
        let observed = open
            .iter()
            .find(|o| o.order_id == exchange_order_id)
            .and_then(|o| OrderStatus::from_wire(&o.status));
        match observed {
            Some(observed) if result.observe(observed) => Ok(self.record(result).await),
            // Re-read: a cancel may have landed while the list was in flight.
            _ => self.lookup(id).await,
        }
    }

    /// Tracked results in arrival order.
    pub async fn history(&self) -> Vec<OrderResult> {
        self.history.lock().await.iter().cloned().collect()
    }

    async fn lookup(&self, id: &OrderId) -> AdapterResult<OrderResult> {
        self.history
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AdapterError::invalid(format!("unknown order id '{}'", id)))
    }

    /// Store `result` unless the tracked entry already reached a terminal
    /// status in the meantime; either way the stored record is returned.
    async fn record(&self, result: OrderResult) -> OrderResult {
        self.history.lock().await.update(result)
    }

    async fn broadcast(&self, signer: &dyn Signer, action: &SignerAction) -> Outcome {
        match within(self.timeout, signer.sign_and_broadcast(action)).await {
            Some(Ok(receipt)) => Outcome::Receipt(receipt),
            Some(Err(failure)) => Outcome::Failed(failure),
            None => Outcome::TimedOut,
        }
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

fn validate(request: &OrderRequest) -> AdapterResult<()> {
    if request.client_order_id.is_empty() {
        return Err(AdapterError::invalid("client order id must not be empty"));
    }
    if request.amount <= Decimal::ZERO {
        return Err(AdapterError::invalid(format!(
            "amount must be positive, got {}",
            request.amount
        )));
    }
    if request.order_type == OrderType::Limit {
        match request.price {
            Some(p) if p > Decimal::ZERO => {}
            Some(p) => {
                return Err(AdapterError::invalid(format!(
                    "limit price must be positive, got {}",
                    p
                )))
            }
            None => return Err(AdapterError::invalid("limit order requires a price")),
        }
    }
    Ok(())
}

/// `None` if `fut` did not finish within `after`.
async fn within<F: Future>(after: Duration, fut: F) -> Option<F::Output> {
    let fut = std::pin::pin!(fut);
    match select(fut, futures_timer::Delay::new(after)).await {
        Either::Left((out, _)) => Some(out),
        Either::Right(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::wire::OpenOrderEntry;
    use crate::domain::account::wire::{AccountBalanceEntry, PositionEntry};
    use crate::error::ErrorKind;
    use crate::shared::{NativeId, Side};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSigner {
        calls: AtomicUsize,
        actions: Mutex<Vec<SignerAction>>,
        fail_with: Option<SignerFailure>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl Signer for RecordingSigner {
        async fn sign_and_broadcast(&self, action: &SignerAction) -> Result<TxReceipt, SignerFailure> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.actions.lock().unwrap().push(action.clone());
            if let Some(d) = self.delay {
                futures_timer::Delay::new(d).await;
            }
            if let Some(f) = &self.fail_with {
                return Err(f.clone());
            }
            let state = match action {
                SignerAction::Place(_) => BroadcastState::Accepted,
                SignerAction::Cancel { .. } => BroadcastState::Cancelled,
            };
            Ok(TxReceipt {
                tx_reference: format!("0xtx{}", n),
                exchange_order_id: Some("ex-1".to_string()),
                state,
            })
        }
    }

    struct OpenOrders(Vec<OpenOrderEntry>);

    #[async_trait]
    impl AccountSource for OpenOrders {
        async fn account_balances(&self, _: &str) -> AdapterResult<Vec<AccountBalanceEntry>> {
            Ok(Vec::new())
        }

        async fn positions(&self, _: &str) -> AdapterResult<Vec<PositionEntry>> {
            Ok(Vec::new())
        }

        async fn open_orders(&self, _: &str) -> AdapterResult<Vec<OpenOrderEntry>> {
            Ok(self.0.clone())
        }
    }

    /// Open orders that only answer once released.
    struct HeldOpenOrders {
        entries: Vec<OpenOrderEntry>,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl AccountSource for HeldOpenOrders {
        async fn account_balances(&self, _: &str) -> AdapterResult<Vec<AccountBalanceEntry>> {
            Ok(Vec::new())
        }

        async fn positions(&self, _: &str) -> AdapterResult<Vec<PositionEntry>> {
            Ok(Vec::new())
        }

        async fn open_orders(&self, _: &str) -> AdapterResult<Vec<OpenOrderEntry>> {
            self.release.notified().await;
            Ok(self.entries.clone())
        }
    }

    fn open_entry(status: &str) -> OpenOrderEntry {
        OpenOrderEntry {
            exchange_id: Some(1),
            symbol: NativeId::from("BTCRUSDPERP"),
            account_id: None,
            order_id: "ex-1".to_string(),
            qty: Decimal::ONE,
            exec_qty: Decimal::ONE,
            side: "B".to_string(),
            limit_px: Some(Decimal::from(50_000)),
            order_type: "LIMIT".to_string(),
            trigger_px: None,
            time_in_force: None,
            reduce_only: None,
            status: status.to_string(),
            created_at: None,
            last_update_at: None,
        }
    }

    fn gateway(signer: Arc<RecordingSigner>) -> OrderGateway {
        OrderGateway::new(
            Arc::new(MarketCatalog::default()),
            Some(signer),
            None,
            Duration::from_millis(200),
            16,
        )
    }

    fn limit(id: &str) -> OrderRequest {
        OrderRequest::limit("BTC/USD", Side::Buy, Decimal::ONE, Decimal::from(50_000), id)
    }

    #[tokio::test]
    async fn test_submit_limit_order() {
        let signer = Arc::new(RecordingSigner::default());
        let gw = gateway(signer.clone());

        let result = gw.submit(limit("c1")).await.unwrap();
        assert_eq!(result.status, OrderStatus::Submitted);
        assert_eq!(result.tx_reference.as_deref(), Some("0xtx0"));
        assert_eq!(result.exchange_order_id.as_deref(), Some("ex-1"));

        let actions = signer.actions.lock().unwrap();
        match &actions[0] {
            SignerAction::Place(p) => {
                assert_eq!(p.market_id, 1);
                assert_eq!(p.native_id, NativeId::from("BTCRUSDPERP"));
                assert_eq!(p.limit_px, Some(Decimal::from(50_000)));
                assert_eq!(p.time_in_force, TimeInForce::Gtc);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_validation_rejects_before_signing() {
        let signer = Arc::new(RecordingSigner::default());
        let gw = gateway(signer.clone());

        let mut no_price = limit("c1");
        no_price.price = None;
        let zero = OrderRequest::market("BTC/USD", Side::Sell, Decimal::ZERO, "c2");
        let empty = OrderRequest::market("BTC/USD", Side::Sell, Decimal::ONE, "");
        let unknown = OrderRequest::market("DOGE/USD", Side::Sell, Decimal::ONE, "c3");

        for req in [no_price, zero, empty] {
            assert_eq!(gw.submit(req).await.unwrap_err().kind(), ErrorKind::InvalidRequest);
        }
        assert_eq!(gw.submit(unknown).await.unwrap_err().kind(), ErrorKind::NotSupported);
        assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resubmit_same_id_is_idempotent() {
        let signer = Arc::new(RecordingSigner::default());
        let gw = gateway(signer.clone());

        let first = gw.submit(limit("c1")).await.unwrap();
        let second = gw.submit(limit("c1")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(signer.calls.load(Ordering::SeqCst), 1);

        let mut different = limit("c1");
        different.amount = Decimal::from(2);
        assert_eq!(gw.submit(different).await.unwrap_err().kind(), ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_signer_rejection_is_terminal_failure() {
        let signer = Arc::new(RecordingSigner {
            fail_with: Some(SignerFailure::Rejected("insufficient margin".into())),
            ..Default::default()
        });
        let gw = gateway(signer);

        let result = gw.submit(limit("c1")).await.unwrap();
        assert_eq!(result.status, OrderStatus::Failed);
        assert_eq!(
            result.failure,
            Some(FailureReason::Rejected("insufficient margin".into()))
        );
    }

    #[tokio::test]
    async fn test_slow_signer_times_out() {
        let signer = Arc::new(RecordingSigner {
            delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        let gw = OrderGateway::new(
            Arc::new(MarketCatalog::default()),
            Some(signer),
            None,
            Duration::from_millis(20),
            16,
        );

        let result = gw.submit(limit("c1")).await.unwrap();
        assert_eq!(result.status, OrderStatus::Failed);
        assert_eq!(result.failure, Some(FailureReason::Timeout { after_ms: 20 }));
    }

    #[tokio::test]
    async fn test_missing_signer_fails_order() {
        let gw = OrderGateway::new(
            Arc::new(MarketCatalog::default()),
            None,
            None,
            Duration::from_millis(20),
            16,
        );
        let result = gw.submit(limit("c1")).await.unwrap();
        assert!(matches!(result.failure, Some(FailureReason::SigningFailure(_))));
    }

    #[tokio::test]
    async fn test_double_cancel_calls_backend_once() {
        let signer = Arc::new(RecordingSigner::default());
        let gw = gateway(signer.clone());
        gw.submit(limit("c1")).await.unwrap();

        let id = OrderId::from("c1");
        let first = gw.cancel(&id).await.unwrap();
        let second = gw.cancel(&id).await.unwrap();

        assert_eq!(first.status, OrderStatus::Canceled);
        assert_eq!(first, second);
        // one place, one cancel
        assert_eq!(signer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancel_unknown_order() {
        let gw = gateway(Arc::new(RecordingSigner::default()));
        let err = gw.cancel(&OrderId::from("nope")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_query_status_refreshes_from_open_orders() {
        let signer = Arc::new(RecordingSigner::default());
        let gw = OrderGateway::new(
            Arc::new(MarketCatalog::default()),
            Some(signer),
            Some(StatusSource {
                source: Arc::new(OpenOrders(vec![open_entry("FILLED")])),
                account: AccountId::from("0xabc"),
            }),
            Duration::from_millis(200),
            16,
        );
        gw.submit(limit("c1")).await.unwrap();

        let result = gw.query_status(&OrderId::from("c1")).await.unwrap();
        assert_eq!(result.status, OrderStatus::Filled);
        assert_eq!(gw.history().await[0].status, OrderStatus::Filled);
    }

    #[tokio::test]
    async fn test_cancel_during_status_query_stays_canceled() {
        let signer = Arc::new(RecordingSigner::default());
        let source = Arc::new(HeldOpenOrders {
            entries: vec![open_entry("FILLED")],
            release: tokio::sync::Notify::new(),
        });
        let gw = OrderGateway::new(
            Arc::new(MarketCatalog::default()),
            Some(signer.clone()),
            Some(StatusSource {
                source: source.clone(),
                account: AccountId::from("0xabc"),
            }),
            Duration::from_millis(200),
            16,
        );
        gw.submit(limit("c1")).await.unwrap();
        let id = OrderId::from("c1");

        // The query reads the order, then waits on the open-order list while
        // the cancel completes.
        let (queried, canceled) = tokio::join!(gw.query_status(&id), async {
            let result = gw.cancel(&id).await;
            source.release.notify_one();
            result
        });

        let canceled = canceled.unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);
        assert_eq!(queried.unwrap().status, OrderStatus::Canceled);
        assert_eq!(gw.history().await[0].status, OrderStatus::Canceled);

        assert_eq!(gw.cancel(&id).await.unwrap(), canceled);
        // one place, one cancel
        assert_eq!(signer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancel_while_submit_in_flight() {
        let signer = Arc::new(RecordingSigner {
            delay: Some(Duration::from_millis(30)),
            ..Default::default()
        });
        let gw = gateway(signer.clone());
        let id = OrderId::from("c1");

        let (submitted, early_cancel) = tokio::join!(gw.submit(limit("c1")), gw.cancel(&id));

        // The pending order has no exchange id yet, so the cancel is refused
        // without reaching the signer.
        assert_eq!(early_cancel.unwrap_err().kind(), ErrorKind::InvalidRequest);
        assert_eq!(submitted.unwrap().status, OrderStatus::Submitted);
        assert_eq!(signer.calls.load(Ordering::SeqCst), 1);

        assert_eq!(gw.cancel(&id).await.unwrap().status, OrderStatus::Canceled);
    }
}
