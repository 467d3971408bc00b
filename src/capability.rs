//! Capability table: one declarative place that says how every canonical
//! operation is served.
//!
//! The facade consults this table before any dispatch. An `Unsupported`
//! entry short-circuits without touching a backend; `Delegated` routes to a
//! substitute backend; `Native` goes to the Reya component.

use serde::Serialize;

// ─── Operation ───────────────────────────────────────────────────────────────

/// Every operation of the uniform interface contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    FetchMarkets,
    FetchTicker,
    FetchFundingRate,
    FetchOrderBook,
    FetchOhlcv,
    FetchBalance,
    FetchPositions,
    FetchOpenOrders,
    CreateOrder,
    CancelOrder,
    FetchOrder,
    FetchCanceledAndClosedOrders,
    SetLeverage,
    FetchLeverage,
    SetMarginMode,
    Withdraw,
}

impl Operation {
    pub const ALL: [Operation; 16] = [
        Operation::FetchMarkets,
        Operation::FetchTicker,
        Operation::FetchFundingRate,
        Operation::FetchOrderBook,
        Operation::FetchOhlcv,
        Operation::FetchBalance,
        Operation::FetchPositions,
        Operation::FetchOpenOrders,
        Operation::CreateOrder,
        Operation::CancelOrder,
        Operation::FetchOrder,
        Operation::FetchCanceledAndClosedOrders,
        Operation::SetLeverage,
        Operation::FetchLeverage,
        Operation::SetMarginMode,
        Operation::Withdraw,
    ];

    /// Interface-contract name of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::FetchMarkets => "fetchMarkets",
            Operation::FetchTicker => "fetchTicker",
            Operation::FetchFundingRate => "fetchFundingRate",
            Operation::FetchOrderBook => "fetchOrderBook",
            Operation::FetchOhlcv => "fetchOHLCV",
            Operation::FetchBalance => "fetchBalance",
            Operation::FetchPositions => "fetchPositions",
            Operation::FetchOpenOrders => "fetchOpenOrders",
            Operation::CreateOrder => "createOrder",
            Operation::CancelOrder => "cancelOrder",
            Operation::FetchOrder => "fetchOrder",
            Operation::FetchCanceledAndClosedOrders => "fetchCanceledAndClosedOrders",
            Operation::SetLeverage => "setLeverage",
            Operation::FetchLeverage => "fetchLeverage",
            Operation::SetMarginMode => "setMarginMode",
            Operation::Withdraw => "withdraw",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─── Capability ──────────────────────────────────────────────────────────────

/// How an operation is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Capability {
    /// Served directly by Reya.
    Native,
    /// Served by a substitute backend.
    Delegated { via: &'static str },
    /// Recognized by the interface contract, no Reya equivalent.
    Unsupported { reason: &'static str },
}

impl Capability {
    pub fn is_supported(&self) -> bool {
        !matches!(self, Capability::Unsupported { .. })
    }
}

pub const NO_BACKEND_ENDPOINT: &str = "no backend endpoint";

/// The static table. Adding coverage for an operation means editing exactly
/// one line here.
const TABLE: [(Operation, Capability); 16] = [
    (Operation::FetchMarkets, Capability::Native),
    (Operation::FetchTicker, Capability::Native),
    (Operation::FetchFundingRate, Capability::Native),
    (Operation::FetchOrderBook, Capability::Native),
    (
        Operation::FetchOhlcv,
        Capability::Delegated {
            via: "fallback spot exchange (Reya has no efficient ranged candle history)",
        },
    ),
    (Operation::FetchBalance, Capability::Native),
    (Operation::FetchPositions, Capability::Native),
    (Operation::FetchOpenOrders, Capability::Native),
    (Operation::CreateOrder, Capability::Native),
    (Operation::CancelOrder, Capability::Native),
    (Operation::FetchOrder, Capability::Native),
    (
        Operation::FetchCanceledAndClosedOrders,
        Capability::Unsupported {
            reason: "no backend endpoint for historical canceled and closed orders",
        },
    ),
    (
        Operation::SetLeverage,
        Capability::Unsupported {
            reason: NO_BACKEND_ENDPOINT,
        },
    ),
    (
        Operation::FetchLeverage,
        Capability::Unsupported {
            reason: NO_BACKEND_ENDPOINT,
        },
    ),
    (
        Operation::SetMarginMode,
        Capability::Unsupported {
            reason: "margin mode is fixed by the exchange",
        },
    ),
    (
        Operation::Withdraw,
        Capability::Unsupported {
            reason: "withdrawals require the on-chain signer, which only handles order actions",
        },
    ),
];

/// Read-only view of the capability table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityTable;

impl CapabilityTable {
    pub fn get(&self, operation: Operation) -> Capability {
        TABLE
            .iter()
            .find(|(op, _)| *op == operation)
            .map(|(_, cap)| *cap)
            .unwrap_or(Capability::Unsupported {
                reason: NO_BACKEND_ENDPOINT,
            })
    }

    /// `has` map in the style of multi-exchange libraries.
    pub fn entries(&self) -> impl Iterator<Item = (Operation, Capability)> + '_ {
        TABLE.iter().copied()
    }
}
