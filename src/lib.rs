//! # Reya Unified
//!
//! Exposes the Reya perpetuals DEX through the operation set of a uniform
//! multi-exchange interface (markets, tickers, order books, candles,
//! balances, positions, orders).
//!
//! ## Architecture
//!
//! The crate is organized in layers:
//!
//! 1. **Core**: Newtypes, domain models, market catalog, capability table (always available)
//! 2. **Ports**: Traits for every backend the adapter talks to, so tests inject fakes
//! 3. **HTTP**: `ReyaHttp` for the Reya REST API, `BinanceKlines` for delegated candles
//! 4. **WebSocket**: `tokio-tungstenite` market-data transport (`ws-native`)
//! 5. **High-Level Client**: `ReyaExchange` with nested sub-clients and caching
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reya_unified::prelude::*;
//!
//! let exchange = ReyaExchange::builder()
//!     .config(AdapterConfig::from_env()?)
//!     .build()?;
//!
//! let markets = exchange.fetch_markets().await?;
//! let book = exchange.fetch_order_book(&Symbol::from("BTC/USD"), Some(10)).await?;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes used across all domains.
pub mod shared;

/// Domain modules (vertical slices): types, wire types, conversions, state.
pub mod domain;

/// Unified adapter error types.
pub mod error;

/// Network URL constants.
pub mod network;

/// Static table of how each operation is served.
pub mod capability;

/// Adapter configuration and `REYA_*` environment loading.
pub mod config;

/// Retry policy for idempotent reads.
pub mod retry;

// ── Layer 2: Ports ───────────────────────────────────────────────────────────

/// Backend traits: market data, account state, candles, signer.
pub mod ports;

// ── Layer 3: HTTP ────────────────────────────────────────────────────────────

/// REST clients for Reya and the fallback candle exchange.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 4: WebSocket ───────────────────────────────────────────────────────

/// Market-data WebSocket: messages, configuration, native transport.
pub mod ws;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `ReyaExchange`: the primary entry point.
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes
    pub use crate::shared::{AccountId, NativeId, OrderId, Side, Symbol, Timeframe};

    // Domain types: market
    pub use crate::domain::market::{
        CatalogEntry, FundingRate, Limits, Market, MarketCatalog, Precision, Ticker,
    };

    // Domain types: orderbook
    pub use crate::domain::orderbook::{OrderBookSnapshot, PriceLevel};

    // Domain types: candle
    pub use crate::domain::candle::Candle;

    // Domain types: account
    pub use crate::domain::account::{Balance, Leverage, Position};

    // Domain types: order
    pub use crate::domain::order::{
        FailureReason, OpenOrder, OrderRequest, OrderResult, OrderStatus, OrderType,
    };

    // Capabilities
    pub use crate::capability::{Capability, Operation};

    // Errors
    pub use crate::error::{AdapterError, AdapterResult, Backend, ErrorKind, NotSupportedCause};

    // Configuration
    pub use crate::config::AdapterConfig;
    pub use crate::retry::RetryConfig;

    // Network
    pub use crate::network::{DEFAULT_API_URL, DEFAULT_FALLBACK_URL, DEFAULT_WS_URL};

    // Ports
    pub use crate::ports::{
        AccountSource, FallbackCandleSource, MarketDataTransport, MarketSource,
        NativeCandleSource, Signer,
    };

    // High-level client + sub-clients
    pub use crate::client::{
        AccountsClient, CandlesClient, MarketsClient, OrderbooksClient, OrdersClient,
        ReyaExchange, ReyaExchangeBuilder,
    };

    // HTTP clients
    #[cfg(feature = "http")]
    pub use crate::http::{BinanceKlines, ReyaHttp};

    // WebSocket
    pub use crate::ws::WsConfig;
    #[cfg(feature = "ws-native")]
    pub use crate::ws::ReyaWsTransport;
}
