//! Native market-data transport: `tokio-tungstenite`.
//!
//! Every `open_stream` call gets its own background tokio task that:
//! - connects and subscribes to the market's depth channel
//! - answers server pings
//! - reconnects with exponential backoff and jitter, resubscribing each time
//! - exits as soon as the consumer drops the stream
//!
//! Snapshots for gap recovery go over REST.

use std::time::Duration;

use futures_util::stream::{BoxStream, SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use async_trait::async_trait;

use crate::domain::orderbook::wire::DepthMessage;
use crate::error::{AdapterResult, Backend, WsError};
use crate::http::ReyaHttp;
use crate::ports::MarketDataTransport;
use crate::shared::NativeId;
use crate::ws::{depth_channel, Kind, MessageIn, MessageOut, WsConfig};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Feed = mpsc::Sender<AdapterResult<DepthMessage>>;

// ─── Disconnect reasons for reconnection decision ────────────────────────────

enum DisconnectReason {
    ConsumerGone,
    Closed { code: u16, reason: String },
    Error(String),
}

// ─── Background task state ───────────────────────────────────────────────────

struct FeedState {
    config: WsConfig,
    channel: String,
    tx: Feed,
    reconnect_attempts: u32,
}

impl FeedState {
    fn should_reconnect(&self) -> bool {
        self.config.reconnect && self.reconnect_attempts < self.config.max_reconnect_attempts
    }

    /// Count one more reconnect attempt; `false` once the budget is spent.
    fn next_attempt(&mut self) -> bool {
        if !self.should_reconnect() {
            return false;
        }
        self.reconnect_attempts += 1;
        true
    }

    /// Only a confirmed subscribe restores the full reconnect budget.
    fn mark_subscribed(&mut self) {
        self.reconnect_attempts = 0;
    }

    /// Report a connection problem without blocking on a slow consumer.
    fn report(&self, err: WsError) {
        let _ = self.tx.try_send(Err(err.into()));
    }
}

// ─── Public transport ────────────────────────────────────────────────────────

/// Reya market-data WebSocket with REST snapshots.
#[derive(Clone)]
pub struct ReyaWsTransport {
    config: WsConfig,
    http: ReyaHttp,
}

impl ReyaWsTransport {
    pub fn new(config: WsConfig, http: ReyaHttp) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &WsConfig {
        &self.config
    }
}

#[async_trait]
impl MarketDataTransport for ReyaWsTransport {
    /// The socket task is spawned on first poll, so this must be polled from
    /// within a tokio runtime.
    fn open_stream(&self, native_id: &NativeId) -> BoxStream<'static, AdapterResult<DepthMessage>> {
        let config = self.config.clone();
        let channel = depth_channel(native_id);

        async_stream::stream! {
            let (tx, mut rx) = mpsc::channel(config.channel_capacity.max(1));
            tokio::spawn(run_feed(FeedState {
                config,
                channel,
                tx,
                reconnect_attempts: 0,
            }));
            while let Some(item) = rx.recv().await {
                yield item;
            }
        }
        .boxed()
    }

    async fn fetch_snapshot(&self, native_id: &NativeId) -> AdapterResult<DepthMessage> {
        self.http
            .get_depth(native_id.as_str())
            .await
            .map_err(|e| e.into_adapter(Backend::ReyaRest))
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_feed(mut state: FeedState) {
    loop {
        if state.tx.is_closed() {
            return;
        }

        // ── 1. Attempt connection ────────────────────────────────────────
        let (mut sink, stream) = match attempt_connect(&state.config.url).await {
            Ok(parts) => parts,
            Err(e) => {
                tracing::error!(channel = %state.channel, "WebSocket connection failed: {}", e);
                state.report(WsError::ConnectionFailed(e));
                if state.next_attempt() {
                    backoff_sleep(&state).await;
                    continue;
                }
                return;
            }
        };

        // ── 2. Subscribe ─────────────────────────────────────────────────
        let subscribe = MessageOut::Subscribe {
            channel: state.channel.clone(),
        };
        if let Err(e) = send_msg(&mut sink, &subscribe).await {
            tracing::warn!(channel = %state.channel, "Subscribe failed: {}", e);
            state.report(WsError::SendFailed(e));
            if state.next_attempt() {
                backoff_sleep(&state).await;
                continue;
            }
            return;
        }
        state.mark_subscribed();
        tracing::info!(channel = %state.channel, "Market data subscribed");

        // ── 3. Pump messages ─────────────────────────────────────────────
        let reason = run_connected(&state, sink, stream).await;

        // ── 4. Post-disconnect decision ──────────────────────────────────
        match reason {
            DisconnectReason::ConsumerGone => {
                tracing::debug!(channel = %state.channel, "Consumer dropped, closing feed");
                return;
            }
            DisconnectReason::Closed { code, reason } => {
                state.report(WsError::Closed {
                    code: Some(code),
                    reason,
                });
            }
            DisconnectReason::Error(reason) => {
                state.report(WsError::Closed { code: None, reason });
            }
        }
        if !state.next_attempt() {
            return;
        }
        backoff_sleep(&state).await;
    }
}

/// The inner connected loop: runs until the connection breaks or the
/// consumer goes away.
async fn run_connected(
    state: &FeedState,
    mut sink: SplitSink<WsStream, Message>,
    mut stream: SplitStream<WsStream>,
) -> DisconnectReason {
    loop {
        tokio::select! {
            // ── a) Incoming WS message ───────────────────────────────────
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let text_str: &str = text.as_ref();
                        match serde_json::from_str::<MessageIn>(text_str) {
                            Ok(msg_in) => match msg_in.kind {
                                Kind::ChannelData(payload) if payload.channel == state.channel => {
                                    if state.tx.send(Ok(payload.data)).await.is_err() {
                                        return DisconnectReason::ConsumerGone;
                                    }
                                }
                                Kind::Ping => {
                                    if let Err(e) = send_msg(&mut sink, &MessageOut::Pong).await {
                                        tracing::warn!("Failed to send pong: {}", e);
                                    }
                                }
                                Kind::Error(payload) => {
                                    tracing::warn!(channel = ?payload.channel, "Server error: {}", payload.message);
                                }
                                Kind::Subscribed { channel } => {
                                    tracing::debug!(%channel, "Subscription confirmed");
                                }
                                _ => {}
                            },
                            Err(e) => {
                                tracing::warn!("WS deserialization error: {} (raw: {})", e, text_str);
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        tracing::info!(code, %reason, "WebSocket closed by server");
                        return DisconnectReason::Closed { code, reason };
                    }
                    Some(Ok(_)) => {} // Binary, Pong, Frame: ignore
                    Some(Err(e)) => {
                        let reason = e.to_string();
                        tracing::error!("WebSocket error: {}", reason);
                        return DisconnectReason::Error(reason);
                    }
                    None => return DisconnectReason::Error("Stream ended".into()),
                }
            }

            // ── b) Consumer dropped the stream ───────────────────────────
            _ = state.tx.closed() => {
                let unsubscribe = MessageOut::Unsubscribe {
                    channel: state.channel.clone(),
                };
                let _ = send_msg(&mut sink, &unsubscribe).await;
                let _ = sink.close().await;
                return DisconnectReason::ConsumerGone;
            }
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Attempt to establish a WebSocket connection with a 30-second timeout.
async fn attempt_connect(
    url: &str,
) -> Result<(SplitSink<WsStream, Message>, SplitStream<WsStream>), String> {
    let (ws_stream, _) = tokio::time::timeout(Duration::from_secs(30), connect_async(url))
        .await
        .map_err(|_| "Connection timeout".to_string())?
        .map_err(|e| e.to_string())?;

    Ok(ws_stream.split())
}

/// Serialize and send a MessageOut over the sink.
async fn send_msg(sink: &mut SplitSink<WsStream, Message>, msg: &MessageOut) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json.into()))
        .await
        .map_err(|e| e.to_string())
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1006, "No close frame".into()),
    }
}

// ─── Reconnection backoff ────────────────────────────────────────────────────

fn reconnect_delay(config: &WsConfig, attempts: u32) -> Duration {
    let exp = attempts.saturating_sub(1).min(10);
    let base = config.base_reconnect_delay_ms.saturating_mul(1u32 << exp);
    let jitter = rand::random::<u32>() % 500;
    Duration::from_millis(base.saturating_add(jitter).min(config.max_reconnect_delay_ms) as u64)
}

async fn backoff_sleep(state: &FeedState) {
    let delay = reconnect_delay(&state.config, state.reconnect_attempts);

    tracing::info!(
        "Reconnect attempt {}/{} for {} in {}ms",
        state.reconnect_attempts,
        state.config.max_reconnect_attempts,
        state.channel,
        delay.as_millis()
    );

    tokio::time::sleep(delay).await;
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

    fn config() -> WsConfig {
        WsConfig {
            base_reconnect_delay_ms: 1000,
            max_reconnect_delay_ms: 5000,
            ..WsConfig::default()
        }
    }

    #[test]
    fn test_reconnect_delay_grows_and_caps() {
        let first = reconnect_delay(&config(), 1);
        assert!(first >= Duration::from_millis(1000) && first < Duration::from_millis(1500));

        let third = reconnect_delay(&config(), 3);
        assert!(third >= Duration::from_millis(4000));

        let tenth = reconnect_delay(&config(), 10);
        assert_eq!(tenth, Duration::from_millis(5000));
    }

    #[test]
    fn test_extract_close_with_frame() {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "goodbye".into(),
        };
        let (code, reason) = extract_close(Some(&frame));
        assert_eq!(code, 1000);
        assert_eq!(reason, "goodbye");
    }

    #[test]
    fn test_extract_close_no_frame() {
        assert_eq!(extract_close(None), (1006, "No close frame".to_string()));
    }

    #[test]
    fn test_reconnect_budget_survives_connect_without_subscribe() {
        let (tx, _rx) = mpsc::channel(1);
        let mut state = FeedState {
            config: WsConfig {
                max_reconnect_attempts: 3,
                ..config()
            },
            channel: "/v2/market/BTCRUSDPERP/depth".to_string(),
            tx,
            reconnect_attempts: 0,
        };

        // Each cycle connects, fails to subscribe and asks for another try.
        let mut retries = 0;
        while state.next_attempt() {
            retries += 1;
            assert!(retries <= 3, "reconnected past the budget");
        }
        assert_eq!(retries, 3);

        state.mark_subscribed();
        assert!(state.next_attempt());
    }

    #[tokio::test]
    async fn test_feed_exits_when_consumer_drops() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let state = FeedState {
            config: WsConfig {
                url: "ws://127.0.0.1:9".to_string(),
                ..config()
            },
            channel: "/v2/market/BTCRUSDPERP/depth".to_string(),
            tx,
            reconnect_attempts: 0,
        };
        // Returns immediately without dialing.
        tokio::time::timeout(Duration::from_secs(1), run_feed(state))
            .await
            .unwrap();
    }

    #[test]
    fn test_error_reported_as_stream_unavailable() {
        let err: AdapterError = WsError::Closed {
            code: Some(1001),
            reason: "going away".into(),
        }
        .into();
        assert_eq!(err.kind(), crate::error::ErrorKind::SourceUnavailable);
    }
}
