//! Order domain: requests, lifecycle results, open orders.

pub mod client;
mod convert;
pub mod gateway;
pub mod state;
pub mod wire;

use crate::shared::{OrderId, Side, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use gateway::OrderGateway;
pub use state::OrderHistory;

// ─── OrderType ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            OrderType::Market => write!(f, "market"),
            OrderType::Limit => write!(f, "limit"),
        }
    }
}

// ─── OrderStatus ─────────────────────────────────────────────────────────────

/// `pending → submitted → {filled, canceled, failed}`.
///
/// `Unsupported` marks requests the adapter recognized but will never route.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Submitted,
    Filled,
    Canceled,
    Failed,
    Unsupported,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Failed | OrderStatus::Unsupported
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Submitted => "submitted",
            OrderStatus::Filled => "filled",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Failed => "failed",
            OrderStatus::Unsupported => "unsupported",
        };
        write!(f, "{}", s)
    }
}

/// Why an order ended up `failed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    Rejected(String),
    SigningFailure(String),
    Timeout { after_ms: u64 },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FailureReason::Rejected(m) => write!(f, "rejected by backend: {}", m),
            FailureReason::SigningFailure(m) => write!(f, "signing failure: {}", m),
            FailureReason::Timeout { after_ms } => {
                write!(f, "no confirmation within {}ms", after_ms)
            }
        }
    }
}

// ─── OrderRequest ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    /// Base units.
    pub amount: Decimal,
    /// Required for limit orders, ignored for market orders.
    pub price: Option<Decimal>,
    pub client_order_id: OrderId,
    #[serde(default)]
    pub reduce_only: bool,
}

impl OrderRequest {
    pub fn market(
        symbol: impl Into<Symbol>,
        side: Side,
        amount: Decimal,
        client_order_id: impl Into<OrderId>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            amount,
            price: None,
            client_order_id: client_order_id.into(),
            reduce_only: false,
        }
    }

    pub fn limit(
        symbol: impl Into<Symbol>,
        side: Side,
        amount: Decimal,
        price: Decimal,
        client_order_id: impl Into<OrderId>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Limit,
            amount,
            price: Some(price),
            client_order_id: client_order_id.into(),
            reduce_only: false,
        }
    }

    pub fn reduce_only(mut self) -> Self {
        self.reduce_only = true;
        self
    }
}

// ─── OrderResult ─────────────────────────────────────────────────────────────

/// Lifecycle record of one accepted order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderResult {
    pub client_order_id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub amount: Decimal,
    pub price: Option<Decimal>,
    pub reduce_only: bool,
    pub status: OrderStatus,
    /// Broadcast transaction reference from the signer.
    pub tx_reference: Option<String>,
    /// Exchange-assigned order id, needed for cancels.
    pub exchange_order_id: Option<String>,
    pub failure: Option<FailureReason>,
    pub updated_at: DateTime<Utc>,
}

impl OrderResult {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether `request` describes the same order this result was created for.
    pub fn matches(&self, request: &OrderRequest) -> bool {
        self.symbol == request.symbol
            && self.side == request.side
            && self.order_type == request.order_type
            && self.amount == request.amount
            && self.price == request.price
            && self.reduce_only == request.reduce_only
    }
}

// ─── OpenOrder ───────────────────────────────────────────────────────────────

/// A resting order as reported by the exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenOrder {
    /// Exchange order id.
    pub id: String,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    /// Raw exchange order type, e.g. `LIMIT`, `TP`, `SL`.
    pub native_type: String,
    pub price: Option<Decimal>,
    pub trigger_price: Option<Decimal>,
    pub amount: Decimal,
    pub filled: Decimal,
    pub remaining: Decimal,
    pub status: OrderStatus,
    pub reduce_only: bool,
    pub timestamp: Option<DateTime<Utc>>,
}
