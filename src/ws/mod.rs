//! WebSocket layer: Reya market-data message types and configuration.
//!
//! The transport itself is behind the `ws-native` feature
//! (`tokio-tungstenite`, native.rs). This module holds the protocol types
//! shared with tests.

#[cfg(feature = "ws-native")]
pub mod native;

use crate::domain::orderbook::wire::DepthMessage;
use crate::shared::NativeId;
use serde::{Deserialize, Serialize};

#[cfg(feature = "ws-native")]
pub use native::ReyaWsTransport;

/// Channel carrying depth messages for one market.
pub fn depth_channel(native_id: &NativeId) -> String {
    format!("/v2/market/{}/depth", native_id)
}

// ─── Outbound messages ───────────────────────────────────────────────────────

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageOut {
    Subscribe { channel: String },
    Unsubscribe { channel: String },
    /// Reply to a server `ping`.
    Pong,
}

// ─── Inbound messages ────────────────────────────────────────────────────────

/// Raw inbound message from the server.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageIn {
    #[serde(flatten)]
    pub kind: Kind,
}

/// The type of inbound WebSocket message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Kind {
    ChannelData(ChannelDataPayload),
    Subscribed { channel: String },
    Unsubscribed { channel: String },
    Ping,
    Pong,
    Error(WsErrorPayload),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelDataPayload {
    pub channel: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub data: DepthMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WsErrorPayload {
    pub message: String,
    #[serde(default)]
    pub channel: Option<String>,
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// Configuration for the market-data WebSocket.
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: String,
    pub reconnect: bool,
    pub max_reconnect_attempts: u32,
    pub base_reconnect_delay_ms: u32,
    pub max_reconnect_delay_ms: u32,
    /// Messages buffered between the socket task and the consumer.
    pub channel_capacity: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: crate::network::DEFAULT_WS_URL.to_string(),
            reconnect: true,
            max_reconnect_attempts: 10,
            base_reconnect_delay_ms: 1000,
            max_reconnect_delay_ms: 60_000,
            channel_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::orderbook::wire::DepthKind;

    #[test]
    fn test_subscribe_serializes() {
        let msg = MessageOut::Subscribe {
            channel: depth_channel(&NativeId::from("BTCRUSDPERP")),
        };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"subscribe","channel":"/v2/market/BTCRUSDPERP/depth"}"#
        );
        assert_eq!(serde_json::to_string(&MessageOut::Pong).unwrap(), r#"{"type":"pong"}"#);
    }

    #[test]
    fn test_channel_data_parses_depth() {
        let json = r#"{
            "type": "channel_data",
            "channel": "/v2/market/BTCRUSDPERP/depth",
            "timestamp": 1747927089946,
            "data": {
                "symbol": "BTCRUSDPERP",
                "type": "UPDATE",
                "bids": [{"px": "100.5", "qty": "2"}],
                "asks": [],
                "sequenceNumber": 42,
                "updatedAt": 1747927089946
            }
        }"#;
        let msg: MessageIn = serde_json::from_str(json).unwrap();
        match msg.kind {
            Kind::ChannelData(payload) => {
                assert_eq!(payload.data.kind, DepthKind::Update);
                assert_eq!(payload.data.sequence_number, 42);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_ping_and_unknown_types() {
        let ping: MessageIn = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(ping.kind, Kind::Ping));

        let other: MessageIn = serde_json::from_str(r#"{"type":"heartbeat"}"#).unwrap();
        assert!(matches!(other.kind, Kind::Other));
    }
}
