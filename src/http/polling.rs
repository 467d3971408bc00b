//! REST-polled depth feed, for deployments without a WebSocket runtime.
//!
//! Every poll yields a full `SNAPSHOT` message; the cache keeps only those
//! whose sequence number moved forward.

use crate::domain::orderbook::wire::DepthMessage;
use crate::error::{AdapterResult, Backend};
use crate::http::ReyaHttp;
use crate::ports::MarketDataTransport;
use crate::shared::NativeId;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct RestPollingTransport {
    http: ReyaHttp,
    interval: Duration,
}

impl RestPollingTransport {
    pub fn new(http: ReyaHttp, interval: Duration) -> Self {
        Self { http, interval }
    }
}

#[async_trait]
impl MarketDataTransport for RestPollingTransport {
    fn open_stream(&self, native_id: &NativeId) -> BoxStream<'static, AdapterResult<DepthMessage>> {
        let http = self.http.clone();
        let interval = self.interval;
        let symbol = native_id.as_str().to_string();

        async_stream::stream! {
            loop {
                yield http
                    .get_depth(&symbol)
                    .await
                    .map_err(|e| e.into_adapter(Backend::ReyaRest));
                futures_timer::Delay::new(interval).await;
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
