//! Conversion: open-order wire entries → `OpenOrder`, order lifecycle
//! transitions from signer receipts.

use super::wire::OpenOrderEntry;
use super::{FailureReason, OpenOrder, OrderRequest, OrderResult, OrderStatus, OrderType};
use crate::ports::{BroadcastState, SignerFailure, TxReceipt};
use crate::shared::serde_util::from_millis;
use crate::shared::{Side, Symbol};
use chrono::Utc;

impl OrderStatus {
    /// Map an exchange order status. `None` for values the adapter does not know.
    pub(crate) fn from_wire(status: &str) -> Option<Self> {
        match status.to_ascii_uppercase().as_str() {
            "PENDING" => Some(OrderStatus::Pending),
            "OPEN" | "PARTIALLY_FILLED" => Some(OrderStatus::Submitted),
            "FILLED" => Some(OrderStatus::Filled),
            "CANCELLED" | "CANCELED" => Some(OrderStatus::Canceled),
            "REJECTED" => Some(OrderStatus::Failed),
            _ => None,
        }
    }
}

impl From<BroadcastState> for OrderStatus {
    fn from(state: BroadcastState) -> Self {
        match state {
            BroadcastState::Accepted => OrderStatus::Submitted,
            BroadcastState::Filled => OrderStatus::Filled,
            BroadcastState::Cancelled => OrderStatus::Canceled,
        }
    }
}

impl From<SignerFailure> for FailureReason {
    fn from(failure: SignerFailure) -> Self {
        match failure {
            SignerFailure::Rejected(m) => FailureReason::Rejected(m),
            SignerFailure::Signing(m) | SignerFailure::Broadcast(m) => {
                FailureReason::SigningFailure(m)
            }
        }
    }
}

impl OpenOrder {
    pub(crate) fn try_from_entry(symbol: Symbol, entry: OpenOrderEntry) -> Result<Self, String> {
        let side = Side::from_wire(&entry.side)
            .ok_or_else(|| format!("unknown order side '{}'", entry.side))?;
        let status = OrderStatus::from_wire(&entry.status)
            .ok_or_else(|| format!("unknown order status '{}'", entry.status))?;
        let order_type = if entry.order_type.eq_ignore_ascii_case("LIMIT") {
            OrderType::Limit
        } else {
            OrderType::Market
        };

        Ok(OpenOrder {
            id: entry.order_id,
            symbol,
            side,
            order_type,
            native_type: entry.order_type,
            price: entry.limit_px.or(entry.trigger_px),
            trigger_price: entry.trigger_px,
            amount: entry.qty,
            filled: entry.exec_qty,
            remaining: entry.qty - entry.exec_qty,
            status,
            reduce_only: entry.reduce_only.unwrap_or(false),
            timestamp: entry.created_at.and_then(from_millis),
        })
    }
}

impl OrderResult {
    pub(crate) fn pending(request: &OrderRequest) -> Self {
        OrderResult {
            client_order_id: request.client_order_id.clone(),
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: request.order_type,
            amount: request.amount,
            price: request.price,
            reduce_only: request.reduce_only,
            status: OrderStatus::Pending,
            tx_reference: None,
            exchange_order_id: None,
            failure: None,
            updated_at: Utc::now(),
        }
    }

    pub(crate) fn apply_receipt(&mut self, receipt: TxReceipt) {
        self.status = receipt.state.into();
        self.tx_reference = Some(receipt.tx_reference);
        if receipt.exchange_order_id.is_some() {
            self.exchange_order_id = receipt.exchange_order_id;
        }
        self.updated_at = Utc::now();
    }

    pub(crate) fn fail(&mut self, reason: FailureReason) {
        self.status = OrderStatus::Failed;
        self.failure = Some(reason);
        self.updated_at = Utc::now();
    }

    /// Adopt an exchange-reported status. Terminal results never move.
    pub(crate) fn observe(&mut self, status: OrderStatus) -> bool {
        if self.is_terminal() || self.status == status {
            return false;
        }
        if status == OrderStatus::Failed {
            self.failure = Some(FailureReason::Rejected("rejected by exchange".to_string()));
        }
        self.status = status;
        self.updated_at = Utc::now();
        true
    }
}
