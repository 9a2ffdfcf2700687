//! Signal pipeline: candle series and headlines in, one signal record out.

use tracing::{info, warn};

use crate::config::{Config, PipelineConfig};
use crate::error::{AppError, Result};
use crate::services::signals::{
    aggregate, estimate_time_and_volatility, size_position, ClassifierChain, SentimentClassifier,
    SeriesAnalyzer, StructureAnalyzer, TrendClassifier,
};
use crate::sources::{
    CandleProvider, CandleSourceChain, FinnhubClient, HeadlineClassifier, HeadlineProvider,
    NewsDataClient, OpenRouterClassifier, TwelveDataClient,
};
use crate::types::{
    format_band, OhlcPoint, PipelineOutput, SentimentResult, SignalReport, StructureResult,
};

/// Entry price and zone for a structure result.
///
/// The entry is the structure's key level, else the latest close. The zone is
/// the order-block band when one was found, else a zero-width band at the entry.
pub fn entry_point(structure: &StructureResult, candles: &[OhlcPoint]) -> (f64, String) {
    let entry_price = structure
        .key_level
        .or_else(|| candles.last().map(|c| c.close))
        .unwrap_or(0.0);
    let entry_zone = structure
        .order_block
        .map(|ob| ob.zone())
        .unwrap_or_else(|| format_band(entry_price, entry_price));
    (entry_price, entry_zone)
}

/// Runs the analysis components for one symbol at a time.
///
/// Holds no per-run state; one engine can serve concurrent runs.
pub struct SignalEngine {
    candles: CandleSourceChain,
    sentiment: SentimentClassifier,
    trend: TrendClassifier,
    structure: StructureAnalyzer,
    config: PipelineConfig,
    candle_count: usize,
}

impl SignalEngine {
    pub fn new(
        candles: CandleSourceChain,
        sentiment: SentimentClassifier,
        config: PipelineConfig,
        candle_count: usize,
    ) -> Self {
        Self {
            candles,
            sentiment,
            trend: TrendClassifier::new(config.smoothers.clone()),
            structure: StructureAnalyzer,
            config,
            candle_count,
        }
    }

    /// Build an engine with every collaborator whose API key is configured.
    pub fn from_config(config: &Config) -> Self {
        let timeout = config.request_timeout();

        let mut providers: Vec<Box<dyn CandleProvider>> = Vec::new();
        if let Some(key) = &config.finnhub_api_key {
            providers.push(Box::new(FinnhubClient::new(key.clone(), timeout)));
        }
        if let Some(key) = &config.twelvedata_api_key {
            providers.push(Box::new(TwelveDataClient::new(key.clone(), timeout)));
        }
        if providers.is_empty() {
            warn!("No market-data API keys configured; every analysis will fail");
        }

        let mut classifiers: Vec<Box<dyn HeadlineClassifier>> = Vec::new();
        if let Some(key) = &config.openrouter_api_key {
            classifiers.push(Box::new(OpenRouterClassifier::new(
                key.clone(),
                config.openrouter_model.clone(),
                config.llm_timeout(),
            )));
        }

        let headlines: Option<Box<dyn HeadlineProvider>> =
            config.newsdata_api_key.as_ref().map(|key| {
                Box::new(NewsDataClient::new(key.clone(), timeout)) as Box<dyn HeadlineProvider>
            });

        Self::new(
            CandleSourceChain::new(providers),
            SentimentClassifier::new(
                headlines,
                ClassifierChain::new(classifiers, config.llm_timeout()),
            ),
            config.pipeline.clone(),
            config.candle_count,
        )
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Pure core: every component over `candles` with a precomputed sentiment.
    pub fn analyze_series(
        &self,
        symbol: &str,
        candles: &[OhlcPoint],
        sentiment: SentimentResult,
    ) -> PipelineOutput {
        let trend = self.trend.analyze(candles);
        if let Some(e) = &trend.error {
            warn!("{}: {} unavailable: {}", symbol, self.trend.id(), e);
        }
        let structure = self.structure.analyze(candles);
        if let Some(e) = &structure.error {
            warn!("{}: {} unavailable: {}", symbol, self.structure.id(), e);
        }

        let aggregated = aggregate(&trend, &sentiment, &structure);

        let (entry_price, entry_zone) = entry_point(&structure, candles);
        let target = self.config.target_params().predict(
            aggregated.final_bias,
            aggregated.bias_confidence,
            &structure.zones(),
            entry_price,
        );

        let time_volatility =
            estimate_time_and_volatility(candles, Some(&entry_zone), self.config.interval.minutes());
        if let Some(e) = &time_volatility.error {
            warn!("{}: timing unavailable: {}", symbol, e);
        }

        let risk = size_position(
            aggregated.bias_confidence,
            time_volatility.volatility,
            self.config.risk_tier.name(),
        );

        PipelineOutput {
            trend,
            structure,
            sentiment,
            aggregated,
            target,
            time_volatility,
            risk,
        }
    }

    /// Classify `headlines` and run every component over `candles`.
    pub async fn run_pipeline(
        &self,
        symbol: &str,
        candles: &[OhlcPoint],
        headlines: &[String],
    ) -> PipelineOutput {
        let sentiment = self.sentiment.classify_headlines(symbol, headlines).await;
        self.analyze_series(symbol, candles, sentiment)
    }

    /// Fetch candles and headlines for `symbol` and produce a signal report.
    ///
    /// Fails only when no provider returns a candle series.
    pub async fn run_full_analysis(&self, symbol: &str) -> Result<SignalReport> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(AppError::Config("empty symbol".to_string()));
        }

        let (candles, source_note) = self
            .candles
            .fetch(&symbol, self.config.interval, self.candle_count)
            .await;
        let candles = candles.ok_or_else(|| AppError::NoMarketData {
            symbol: symbol.clone(),
            note: source_note.clone(),
        })?;

        let headlines = self.sentiment.fetch_headlines(&symbol).await;
        let output = self.run_pipeline(&symbol, &candles, &headlines).await;
        let (entry_price, entry_zone) = entry_point(&output.structure, &candles);

        info!(
            "{}: {} ({:.2}) entry {:.4}, {}",
            symbol,
            output.aggregated.final_bias,
            output.aggregated.bias_confidence,
            entry_price,
            source_note
        );

        Ok(SignalReport::ok(
            &symbol,
            source_note,
            entry_price,
            entry_zone,
            output,
        ))
    }
}
