//! Headline sentiment classifier.
//!
//! Each headline is labelled by the first classifier strategy that answers in
//! time; the keyword matcher always closes the chain. Labels are combined by
//! majority vote.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::sources::{HeadlineClassifier, HeadlineProvider};
use crate::types::{round_to, Bias, SentimentResult};

const BULLISH_WORDS: &[&str] = &[
    "up", "rises", "beats", "gains", "strong", "upgrade", "optimistic",
];
const BEARISH_WORDS: &[&str] = &[
    "down", "falls", "misses", "losses", "weak", "downgrade", "panic",
];

/// Default per-call budget for a classifier strategy.
pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(8);

/// Word-list classifier. Bullish words are checked first.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn label(&self, headline: &str) -> Bias {
        let lower = headline.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        if words.iter().any(|w| BULLISH_WORDS.contains(w)) {
            Bias::Bullish
        } else if words.iter().any(|w| BEARISH_WORDS.contains(w)) {
            Bias::Bearish
        } else {
            Bias::Neutral
        }
    }
}

#[async_trait]
impl HeadlineClassifier for KeywordClassifier {
    fn name(&self) -> &'static str {
        "keywords"
    }

    async fn classify(&self, headline: &str, _symbol: &str) -> Result<Bias, SourceError> {
        Ok(self.label(headline))
    }
}

/// Ordered classifier strategies, each bounded by a timeout, ending in keywords.
pub struct ClassifierChain {
    strategies: Vec<Box<dyn HeadlineClassifier>>,
    timeout: Duration,
    fallback: KeywordClassifier,
}

impl Default for ClassifierChain {
    fn default() -> Self {
        Self::keyword_only()
    }
}

impl ClassifierChain {
    pub fn new(strategies: Vec<Box<dyn HeadlineClassifier>>, timeout: Duration) -> Self {
        Self {
            strategies,
            timeout,
            fallback: KeywordClassifier,
        }
    }

    /// Chain with no fallible strategies.
    pub fn keyword_only() -> Self {
        Self::new(Vec::new(), DEFAULT_CLASSIFIER_TIMEOUT)
    }

    /// Label one headline. Never fails.
    pub async fn classify(&self, headline: &str, symbol: &str) -> Bias {
        for strategy in &self.strategies {
            match tokio::time::timeout(self.timeout, strategy.classify(headline, symbol)).await {
                Ok(Ok(bias)) => return bias,
                Ok(Err(e)) => {
                    debug!("{} failed for {}: {}; trying next", strategy.name(), symbol, e);
                }
                Err(_) => {
                    debug!(
                        "{} timed out after {} ms for {}; trying next",
                        strategy.name(),
                        self.timeout.as_millis(),
                        symbol
                    );
                }
            }
        }
        self.fallback.label(headline)
    }
}

/// Majority vote over headline labels.
///
/// Confidence is the majority's share, rounded to two decimals. Ties go to the
/// label seen first. No labels means neutral with full confidence.
pub fn classify_labels(labels: &[Bias]) -> SentimentResult {
    if labels.is_empty() {
        return SentimentResult::no_headlines();
    }

    // Tally in first-seen order so ties resolve to the earliest label.
    let mut counts: Vec<(Bias, usize)> = Vec::with_capacity(3);
    for label in labels {
        match counts.iter_mut().find(|(b, _)| b == label) {
            Some((_, n)) => *n += 1,
            None => counts.push((*label, 1)),
        }
    }

    let (sentiment, count) = counts
        .iter()
        .fold(counts[0], |best, &cur| if cur.1 > best.1 { cur } else { best });

    SentimentResult {
        sentiment,
        confidence: round_to(count as f64 / labels.len() as f64, 2),
        headline_count: labels.len(),
        reason: None,
        error: None,
    }
}

/// Sentiment component: headline retrieval plus classification.
pub struct SentimentClassifier {
    provider: Option<Box<dyn HeadlineProvider>>,
    chain: ClassifierChain,
}

impl Default for SentimentClassifier {
    fn default() -> Self {
        Self::new(None, ClassifierChain::keyword_only())
    }
}

impl SentimentClassifier {
    pub fn new(provider: Option<Box<dyn HeadlineProvider>>, chain: ClassifierChain) -> Self {
        Self { provider, chain }
    }

    /// Fetch headlines for `symbol`. Provider failures yield an empty list.
    pub async fn fetch_headlines(&self, symbol: &str) -> Vec<String> {
        let Some(provider) = &self.provider else {
            return Vec::new();
        };
        match provider.fetch_headlines(symbol).await {
            Ok(headlines) => headlines,
            Err(e) => {
                warn!("{} headlines unavailable for {}: {}", provider.name(), symbol, e);
                Vec::new()
            }
        }
    }

    /// Classify already-fetched headlines.
    pub async fn classify_headlines(&self, symbol: &str, headlines: &[String]) -> SentimentResult {
        let labels = join_all(headlines.iter().map(|h| self.chain.classify(h, symbol))).await;
        let result = classify_labels(&labels);
        debug!(
            "Sentiment for {}: {} ({:.2}) over {} headlines",
            symbol, result.sentiment, result.confidence, result.headline_count
        );
        result
    }

    /// Fetch and classify headlines for `symbol`.
    pub async fn classify_sentiment(&self, symbol: &str) -> SentimentResult {
        let headlines = self.fetch_headlines(symbol).await;
        self.classify_headlines(symbol, &headlines).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fixed(Bias);

    #[async_trait]
    impl HeadlineClassifier for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn classify(&self, _headline: &str, _symbol: &str) -> Result<Bias, SourceError> {
            Ok(self.0)
        }
    }

    struct Broken(Arc<AtomicUsize>);

    #[async_trait]
    impl HeadlineClassifier for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn classify(&self, _headline: &str, _symbol: &str) -> Result<Bias, SourceError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(SourceError::Ambiguous("maybe".to_string()))
        }
    }

    struct Slow;

    #[async_trait]
    impl HeadlineClassifier for Slow {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn classify(&self, _headline: &str, _symbol: &str) -> Result<Bias, SourceError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Bias::Bearish)
        }
    }

    struct Headlines(Vec<&'static str>);

    #[async_trait]
    impl HeadlineProvider for Headlines {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn fetch_headlines(&self, _symbol: &str) -> Result<Vec<String>, SourceError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct Offline;

    #[async_trait]
    impl HeadlineProvider for Offline {
        fn name(&self) -> &'static str {
            "offline"
        }

        async fn fetch_headlines(&self, symbol: &str) -> Result<Vec<String>, SourceError> {
            Err(SourceError::Empty(symbol.to_string()))
        }
    }

    #[test]
    fn test_keyword_labels() {
        let k = KeywordClassifier;
        assert_eq!(k.label("Shares rise as earnings beats forecast"), Bias::Bullish);
        assert_eq!(k.label("Stock falls after guidance"), Bias::Bearish);
        assert_eq!(k.label("Company holds annual meeting"), Bias::Neutral);
        // Bullish is checked first.
        assert_eq!(k.label("Strong dollar, weak yen"), Bias::Bullish);
        // Whole words only.
        assert_eq!(k.label("Quarterly update released"), Bias::Neutral);
        assert_eq!(k.label("PANIC selling"), Bias::Bearish);
    }

    #[test]
    fn test_classify_labels_majority() {
        let result = classify_labels(&[Bias::Bullish, Bias::Bearish, Bias::Bullish]);
        assert_eq!(result.sentiment, Bias::Bullish);
        assert_eq!(result.confidence, 0.67);
        assert_eq!(result.headline_count, 3);
    }

    #[test]
    fn test_classify_labels_tie_goes_to_first_seen() {
        let result = classify_labels(&[Bias::Bearish, Bias::Neutral, Bias::Neutral, Bias::Bearish]);
        assert_eq!(result.sentiment, Bias::Bearish);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn test_classify_labels_empty() {
        let result = classify_labels(&[]);
        assert_eq!(result.sentiment, Bias::Neutral);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.reason.as_deref(), Some("No headlines found."));
    }

    #[tokio::test]
    async fn test_chain_uses_first_answer() {
        let chain = ClassifierChain::new(
            vec![Box::new(Fixed(Bias::Bearish))],
            Duration::from_millis(100),
        );
        assert_eq!(chain.classify("Stock gains", "AAPL").await, Bias::Bearish);
    }

    #[tokio::test]
    async fn test_chain_falls_back_on_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = ClassifierChain::new(
            vec![Box::new(Broken(calls.clone()))],
            Duration::from_millis(100),
        );
        assert_eq!(chain.classify("Stock gains", "AAPL").await, Bias::Bullish);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_chain_falls_back_on_timeout() {
        let chain = ClassifierChain::new(vec![Box::new(Slow)], Duration::from_millis(20));
        assert_eq!(chain.classify("Neutral news", "AAPL").await, Bias::Neutral);
    }

    #[tokio::test]
    async fn test_classify_sentiment_with_provider() {
        let classifier = SentimentClassifier::new(
            Some(Box::new(Headlines(vec![
                "Apple gains on upgrade",
                "Apple rises again",
                "Apple misses on services",
            ]))),
            ClassifierChain::keyword_only(),
        );
        let result = classifier.classify_sentiment("AAPL").await;
        assert_eq!(result.sentiment, Bias::Bullish);
        assert_eq!(result.confidence, 0.67);
        assert_eq!(result.headline_count, 3);
    }

    #[tokio::test]
    async fn test_provider_failure_is_no_headlines() {
        let classifier =
            SentimentClassifier::new(Some(Box::new(Offline)), ClassifierChain::keyword_only());
        let result = classifier.classify_sentiment("AAPL").await;
        assert_eq!(result.sentiment, Bias::Neutral);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.headline_count, 0);
    }
}
