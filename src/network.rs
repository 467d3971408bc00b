//! Network URL constants.

/// Default Reya REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.reya.xyz";

/// Default Reya WebSocket URL.
pub const DEFAULT_WS_URL: &str = "wss://ws.reya.xyz";

/// Default fallback spot-exchange REST base URL (Binance public market data).
pub const DEFAULT_FALLBACK_URL: &str = "https://api.binance.com";
