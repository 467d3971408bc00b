//! Binance public klines: the fallback candle source.

use crate::domain::candle::wire::SpotKline;
use crate::error::{AdapterResult, Backend, HttpError};
use crate::http::client::get_json;
use crate::ports::FallbackCandleSource;
use crate::shared::{NativeId, Timeframe};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;

/// Hard cap Binance applies to one klines request.
pub const KLINES_LIMIT: usize = 1000;

#[derive(Clone)]
pub struct BinanceKlines {
    base_url: String,
    client: Client,
}

impl BinanceKlines {
    pub fn new(base_url: &str) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// `endTime` is inclusive on Binance, so the exclusive `end` is sent as
    /// `end - 1ms`.
    pub(crate) fn klines_url(
        &self,
        pair: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> String {
        format!(
            "{}/api/v3/klines?symbol={}&interval={}&startTime={}&endTime={}&limit={}",
            self.base_url,
            urlencoding::encode(pair),
            timeframe.as_str(),
            start.timestamp_millis(),
            end.timestamp_millis() - 1,
            KLINES_LIMIT
        )
    }

    pub async fn get_klines(
        &self,
        pair: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SpotKline>, HttpError> {
        let url = self.klines_url(pair, timeframe, start, end);
        get_json(&self.client, &url).await
    }
}

#[async_trait]
impl FallbackCandleSource for BinanceKlines {
    fn max_candles_per_request(&self) -> usize {
        KLINES_LIMIT
    }

    async fn fetch_candles(
        &self,
        pair: &NativeId,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AdapterResult<Vec<SpotKline>> {
        self.get_klines(pair.as_str(), timeframe, start, end)
            .await
            .map_err(|e| e.into_adapter(Backend::Fallback))
    }
}
