//! Newsdata.io client for recent business headlines.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::HeadlineProvider;
use crate::error::SourceError;

const NEWSDATA_URL: &str = "https://newsdata.io/api/1/news";
const MAX_HEADLINES: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct NewsDataResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<NewsDataArticle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsDataArticle {
    #[serde(default)]
    pub title: Option<String>,
}

impl NewsDataResponse {
    /// First ten non-empty titles; nothing unless the status is "success".
    pub fn headlines(self) -> Vec<String> {
        if self.status != "success" {
            return Vec::new();
        }
        self.results
            .into_iter()
            .filter_map(|a| a.title)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .take(MAX_HEADLINES)
            .collect()
    }
}

pub struct NewsDataClient {
    client: Client,
    api_key: String,
}

impl NewsDataClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, api_key }
    }
}

#[async_trait]
impl HeadlineProvider for NewsDataClient {
    fn name(&self) -> &'static str {
        "NewsData"
    }

    async fn fetch_headlines(&self, symbol: &str) -> Result<Vec<String>, SourceError> {
        if self.api_key.is_empty() {
            return Err(SourceError::MissingApiKey("NewsData"));
        }

        let response = self
            .client
            .get(NEWSDATA_URL)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("q", symbol),
                ("language", "en"),
                ("category", "business"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().to_string()));
        }

        let body: NewsDataResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        let headlines = body.headlines();
        debug!("NewsData: {} headlines for {}", headlines.len(), symbol);
        Ok(headlines)
    }
}
