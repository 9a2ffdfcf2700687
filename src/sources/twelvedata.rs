//! Twelve Data API client, used as the secondary candle provider.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::CandleProvider;
use crate::error::SourceError;
use crate::types::{CandleInterval, OhlcPoint};

const TWELVEDATA_URL: &str = "https://api.twelvedata.com";

/// `/time_series` response. Values come newest first with numbers as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct TwelveDataSeries {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub values: Vec<TwelveDataValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwelveDataValue {
    pub datetime: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    #[serde(default)]
    pub volume: Option<String>,
}

fn parse_price(field: &str, raw: &str) -> Result<f64, SourceError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| SourceError::Parse(format!("invalid {}: {}", field, raw)))
}

fn parse_timestamp(raw: &str) -> Result<i64, SourceError> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc().timestamp());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| SourceError::Parse(format!("invalid datetime: {}", raw)))
}

impl TwelveDataValue {
    fn to_candle(&self) -> Result<OhlcPoint, SourceError> {
        Ok(OhlcPoint {
            time: parse_timestamp(&self.datetime)?,
            open: parse_price("open", &self.open)?,
            high: parse_price("high", &self.high)?,
            low: parse_price("low", &self.low)?,
            close: parse_price("close", &self.close)?,
            volume: self.volume.as_deref().and_then(|v| v.trim().parse().ok()),
        })
    }
}

impl TwelveDataSeries {
    /// Convert to candles in ascending time order.
    pub fn into_candles(self, symbol: &str) -> Result<Vec<OhlcPoint>, SourceError> {
        if self.status != "ok" {
            return Err(SourceError::Status(
                self.message.unwrap_or_else(|| self.status.clone()),
            ));
        }
        if self.values.is_empty() {
            return Err(SourceError::Empty(symbol.to_string()));
        }

        self.values.iter().rev().map(TwelveDataValue::to_candle).collect()
    }
}

/// Twelve Data API client.
pub struct TwelveDataClient {
    client: Client,
    api_key: String,
}

impl TwelveDataClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, api_key }
    }

    fn series_request(
        &self,
        symbol: &str,
        interval: CandleInterval,
        count: usize,
    ) -> Result<reqwest::Request, SourceError> {
        let request = self
            .client
            .get(format!("{}/time_series", TWELVEDATA_URL))
            .query(&[
                ("symbol", symbol),
                ("interval", interval.twelvedata_interval()),
                ("apikey", self.api_key.as_str()),
            ])
            .query(&[("outputsize", count)])
            .build()?;
        Ok(request)
    }
}

#[async_trait]
impl CandleProvider for TwelveDataClient {
    fn name(&self) -> &'static str {
        "TwelveData"
    }

    async fn fetch(
        &self,
        symbol: &str,
        interval: CandleInterval,
        count: usize,
    ) -> Result<Vec<OhlcPoint>, SourceError> {
        if self.api_key.is_empty() {
            return Err(SourceError::MissingApiKey("TwelveData"));
        }

        let request = self.series_request(symbol, interval, count)?;
        let response = self.client.execute(request).await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().to_string()));
        }

        let series: TwelveDataSeries = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        let candles = series.into_candles(symbol)?;
        debug!("TwelveData: {} candles for {}", candles.len(), symbol);
        Ok(candles)
    }
}
