//! Finnhub API client for intraday stock candles.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::CandleProvider;
use crate::error::SourceError;
use crate::types::{CandleInterval, OhlcPoint};

const FINNHUB_URL: &str = "https://finnhub.io/api/v1";
/// How far back a candle request reaches.
const LOOKBACK_DAYS: i64 = 30;

/// Finnhub `/stock/candle` response: one array per column.
#[derive(Debug, Clone, Deserialize)]
pub struct FinnhubCandles {
    /// Status, "ok" or "no_data"
    #[serde(rename = "s")]
    pub status: String,
    #[serde(rename = "t", default)]
    pub timestamps: Vec<i64>,
    #[serde(rename = "o", default)]
    pub open: Vec<f64>,
    #[serde(rename = "h", default)]
    pub high: Vec<f64>,
    #[serde(rename = "l", default)]
    pub low: Vec<f64>,
    #[serde(rename = "c", default)]
    pub close: Vec<f64>,
    #[serde(rename = "v", default)]
    pub volume: Vec<f64>,
}

impl FinnhubCandles {
    /// Zip the columns into candles, keeping the newest `count`.
    pub fn into_candles(self, symbol: &str, count: usize) -> Result<Vec<OhlcPoint>, SourceError> {
        if self.status != "ok" || self.close.is_empty() {
            return Err(SourceError::Empty(symbol.to_string()));
        }

        let len = self.timestamps.len();
        if [self.open.len(), self.high.len(), self.low.len(), self.close.len()]
            .iter()
            .any(|&n| n != len)
        {
            return Err(SourceError::Parse("column lengths differ".to_string()));
        }

        let candles: Vec<OhlcPoint> = (0..len)
            .map(|i| OhlcPoint {
                time: self.timestamps[i],
                open: self.open[i],
                high: self.high[i],
                low: self.low[i],
                close: self.close[i],
                volume: self.volume.get(i).copied(),
            })
            .collect();

        let skip = candles.len().saturating_sub(count);
        Ok(candles.into_iter().skip(skip).collect())
    }
}

/// Finnhub API client.
pub struct FinnhubClient {
    client: Client,
    api_key: String,
}

impl FinnhubClient {
    /// Create a new Finnhub client with a per-request timeout.
    pub fn new(api_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, api_key }
    }

    /// Candle request for the last `LOOKBACK_DAYS` up to `to`.
    fn candle_request(
        &self,
        symbol: &str,
        interval: CandleInterval,
        to: i64,
    ) -> Result<reqwest::Request, SourceError> {
        let from = to - LOOKBACK_DAYS * 24 * 60 * 60;
        let request = self
            .client
            .get(format!("{}/stock/candle", FINNHUB_URL))
            .query(&[
                ("symbol", symbol),
                ("resolution", interval.finnhub_resolution()),
                ("token", self.api_key.as_str()),
            ])
            .query(&[("from", from), ("to", to)])
            .build()?;
        Ok(request)
    }
}

#[async_trait]
impl CandleProvider for FinnhubClient {
    fn name(&self) -> &'static str {
        "Finnhub"
    }

    async fn fetch(
        &self,
        symbol: &str,
        interval: CandleInterval,
        count: usize,
    ) -> Result<Vec<OhlcPoint>, SourceError> {
        if self.api_key.is_empty() {
            return Err(SourceError::MissingApiKey("Finnhub"));
        }

        let request = self.candle_request(symbol, interval, chrono::Utc::now().timestamp())?;
        let response = self.client.execute(request).await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().to_string()));
        }

        let payload: FinnhubCandles = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        let candles = payload.into_candles(symbol, count)?;
        debug!("Finnhub: {} candles for {}", candles.len(), symbol);
        Ok(candles)
    }
}
