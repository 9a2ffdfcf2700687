//! External collaborators: market data, news headlines and headline classification.

pub mod finnhub;
pub mod newsdata;
pub mod openrouter;
pub mod twelvedata;

pub use finnhub::FinnhubClient;
pub use newsdata::NewsDataClient;
pub use openrouter::OpenRouterClassifier;
pub use twelvedata::TwelveDataClient;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::types::{Bias, CandleInterval, OhlcPoint};

/// Provider of historical candles.
#[async_trait]
pub trait CandleProvider: Send + Sync {
    /// Provider name used in source notes and logs.
    fn name(&self) -> &'static str;

    /// Fetch up to `count` candles in ascending time order.
    async fn fetch(
        &self,
        symbol: &str,
        interval: CandleInterval,
        count: usize,
    ) -> Result<Vec<OhlcPoint>, SourceError>;
}

/// Provider of recent news headlines.
#[async_trait]
pub trait HeadlineProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Up to ten recent headlines. An empty list is a valid answer.
    async fn fetch_headlines(&self, symbol: &str) -> Result<Vec<String>, SourceError>;
}

/// Classifier labelling a single headline.
#[async_trait]
pub trait HeadlineClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn classify(&self, headline: &str, symbol: &str) -> Result<Bias, SourceError>;
}

/// Candle providers tried in order until one returns a non-empty series.
#[derive(Default)]
pub struct CandleSourceChain {
    providers: Vec<Box<dyn CandleProvider>>,
}

impl CandleSourceChain {
    pub fn new(providers: Vec<Box<dyn CandleProvider>>) -> Self {
        Self { providers }
    }

    /// Append a provider to the end of the chain.
    pub fn with(mut self, provider: Box<dyn CandleProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Fetch from the first provider that answers.
    ///
    /// Returns the series (or None when every provider failed) and a note naming
    /// the provider that answered or listing each failure.
    pub async fn fetch(
        &self,
        symbol: &str,
        interval: CandleInterval,
        count: usize,
    ) -> (Option<Vec<OhlcPoint>>, String) {
        let mut failures = Vec::new();

        for provider in &self.providers {
            match provider.fetch(symbol, interval, count).await {
                Ok(candles) if !candles.is_empty() => {
                    debug!(
                        "{} returned {} candles for {}",
                        provider.name(),
                        candles.len(),
                        symbol
                    );
                    return (Some(candles), format!("Data from {}", provider.name()));
                }
                Ok(_) => {
                    warn!("{} returned no candles for {}", provider.name(), symbol);
                    failures.push(format!("{}: empty series", provider.name()));
                }
                Err(e) => {
                    warn!("{} failed for {}: {}", provider.name(), symbol, e);
                    failures.push(format!("{}: {}", provider.name(), e));
                }
            }
        }

        let note = if failures.is_empty() {
            "No candle providers configured".to_string()
        } else {
            format!("All providers failed ({})", failures.join("; "))
        };
        (None, note)
    }
}

/// Split the raw reply of a language model into a label.
///
/// The reply must name exactly one of the three labels, case-insensitively.
pub fn parse_label(reply: &str) -> Result<Bias, SourceError> {
    let lower = reply.to_lowercase();
    let found: Vec<Bias> = [
        ("bullish", Bias::Bullish),
        ("bearish", Bias::Bearish),
        ("neutral", Bias::Neutral),
    ]
    .into_iter()
    .filter(|(word, _)| lower.contains(word))
    .map(|(_, bias)| bias)
    .collect();

    match found.as_slice() {
        [bias] => Ok(*bias),
        _ => Err(SourceError::Ambiguous(reply.trim().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl CandleProvider for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch(
            &self,
            _symbol: &str,
            _interval: CandleInterval,
            _count: usize,
        ) -> Result<Vec<OhlcPoint>, SourceError> {
            Err(SourceError::Timeout(10))
        }
    }

    struct Empty;

    #[async_trait]
    impl CandleProvider for Empty {
        fn name(&self) -> &'static str {
            "empty"
        }

        async fn fetch(
            &self,
            _symbol: &str,
            _interval: CandleInterval,
            _count: usize,
        ) -> Result<Vec<OhlcPoint>, SourceError> {
            Ok(Vec::new())
        }
    }

    struct Fixed;

    #[async_trait]
    impl CandleProvider for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(
            &self,
            _symbol: &str,
            _interval: CandleInterval,
            count: usize,
        ) -> Result<Vec<OhlcPoint>, SourceError> {
            Ok((0..count)
                .map(|i| OhlcPoint {
                    time: i as i64,
                    open: 1.0,
                    high: 2.0,
                    low: 0.5,
                    close: 1.5,
                    volume: None,
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_chain_falls_through_to_working_provider() {
        let chain = CandleSourceChain::new(vec![Box::new(Failing), Box::new(Empty)])
            .with(Box::new(Fixed));
        let (candles, note) = chain.fetch("AAPL", CandleInterval::default(), 3).await;
        assert_eq!(candles.unwrap().len(), 3);
        assert_eq!(note, "Data from fixed");
    }

    #[tokio::test]
    async fn test_chain_reports_every_failure() {
        let chain = CandleSourceChain::new(vec![Box::new(Failing), Box::new(Empty)]);
        let (candles, note) = chain.fetch("AAPL", CandleInterval::default(), 3).await;
        assert!(candles.is_none());
        assert!(note.contains("failing"));
        assert!(note.contains("empty: empty series"));
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let chain = CandleSourceChain::default();
        assert!(chain.is_empty());
        let (candles, note) = chain.fetch("AAPL", CandleInterval::default(), 3).await;
        assert!(candles.is_none());
        assert_eq!(note, "No candle providers configured");
    }

    #[test]
    fn test_parse_label() {
        assert_eq!(parse_label("Bullish").unwrap(), Bias::Bullish);
        assert_eq!(parse_label("  bearish.\n").unwrap(), Bias::Bearish);
        assert_eq!(parse_label("NEUTRAL").unwrap(), Bias::Neutral);
        assert!(matches!(
            parse_label("Bullish or Bearish"),
            Err(SourceError::Ambiguous(_))
        ));
        assert!(parse_label("I cannot say").is_err());
    }
}
