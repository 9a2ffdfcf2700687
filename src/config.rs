use std::env;
use std::time::Duration;

use chrono::NaiveTime;

use crate::services::schedule::parse_session_times;
use crate::services::signals::{Smoother, TargetParams};
use crate::types::{CandleInterval, RiskProfile};

/// Default session trigger times (UTC).
pub const DEFAULT_SESSION_TIMES: &str = "06:55,12:55,22:55";
pub const DEFAULT_OPENROUTER_MODEL: &str = "mistralai/mistral-7b-instruct:free";

/// Analysis parameters shared by every pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Nominal candle interval for fetching and time math.
    pub interval: CandleInterval,
    /// Reward-to-risk ratio for the stop-loss distance.
    pub risk_ratio: f64,
    /// Momentum multiplier for target projection.
    pub momentum: f64,
    /// Risk tier applied when confidence is neither low nor high.
    pub risk_tier: RiskProfile,
    /// Trend smoothers, tried in order.
    pub smoothers: Vec<Smoother>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            interval: CandleInterval::default(),
            risk_ratio: 2.0,
            momentum: 1.0,
            risk_tier: RiskProfile::Medium,
            smoothers: Smoother::default_order(),
        }
    }
}

impl PipelineConfig {
    pub fn target_params(&self) -> TargetParams {
        TargetParams {
            momentum: Some(self.momentum),
            risk_ratio: self.risk_ratio,
        }
    }

    fn from_vars(var: &impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            interval: var("CANDLE_INTERVAL_MINUTES")
                .and_then(|v| CandleInterval::from_str(&v))
                .unwrap_or(defaults.interval),
            risk_ratio: var("RISK_RATIO")
                .and_then(|v| v.parse().ok())
                .filter(|r: &f64| r.is_finite() && *r > 0.0)
                .unwrap_or(defaults.risk_ratio),
            momentum: var("MOMENTUM")
                .and_then(|v| v.parse().ok())
                .filter(|m: &f64| m.is_finite())
                .unwrap_or(defaults.momentum),
            risk_tier: var("RISK_TIER")
                .and_then(|v| RiskProfile::from_str(&v))
                .unwrap_or(defaults.risk_tier),
            smoothers: match var("TREND_SMOOTHER").and_then(|v| Smoother::from_str(&v)) {
                Some(Smoother::Ema) => vec![Smoother::Ema],
                _ => defaults.smoothers,
            },
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Finnhub API key for intraday candles.
    pub finnhub_api_key: Option<String>,
    /// Twelve Data API key, secondary candle provider.
    pub twelvedata_api_key: Option<String>,
    /// Newsdata.io API key for headlines.
    pub newsdata_api_key: Option<String>,
    /// OpenRouter API key for headline classification.
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    /// Candles requested per symbol.
    pub candle_count: usize,
    /// Timeout for market-data and news requests (ms).
    pub request_timeout_ms: u64,
    /// Timeout for a single classifier call (ms).
    pub llm_timeout_ms: u64,
    /// How long a cached report stays fresh (seconds).
    pub cache_ttl_secs: u64,
    /// Symbols swept on every session trigger.
    pub watchlist: Vec<String>,
    /// Daily UTC trigger times.
    pub session_times: Vec<NaiveTime>,
    pub pipeline: PipelineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_vars(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let key = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        let session_times = key("SESSION_TIMES")
            .map(|v| parse_session_times(&v))
            .filter(|times| !times.is_empty())
            .unwrap_or_else(|| parse_session_times(DEFAULT_SESSION_TIMES));

        Self {
            finnhub_api_key: key("FINNHUB_API_KEY"),
            twelvedata_api_key: key("TWELVEDATA_API_KEY"),
            newsdata_api_key: key("NEWSDATA_API_KEY"),
            openrouter_api_key: key("OPENROUTER_API_KEY"),
            openrouter_model: key("OPENROUTER_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
            candle_count: key("CANDLE_COUNT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(200),
            request_timeout_ms: key("REQUEST_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            llm_timeout_ms: key("LLM_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8_000),
            cache_ttl_secs: key("CACHE_TTL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            watchlist: key("WATCHLIST")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_uppercase())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            session_times,
            pipeline: PipelineConfig::from_vars(&key),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.finnhub_api_key.is_none());
        assert_eq!(config.openrouter_model, DEFAULT_OPENROUTER_MODEL);
        assert_eq!(config.candle_count, 200);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.llm_timeout(), Duration::from_secs(8));
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert!(config.watchlist.is_empty());
        assert_eq!(config.session_times.len(), 3);
        assert_eq!(config.pipeline, PipelineConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(vars(&[
            ("FINNHUB_API_KEY", "abc"),
            ("WATCHLIST", "aapl, msft,,eurusd "),
            ("CANDLE_COUNT", "120"),
            ("SESSION_TIMES", "09:30"),
            ("CANDLE_INTERVAL_MINUTES", "5"),
            ("RISK_RATIO", "3"),
            ("RISK_TIER", "Aggressive"),
            ("TREND_SMOOTHER", "ema"),
        ]));
        assert_eq!(config.finnhub_api_key.as_deref(), Some("abc"));
        assert_eq!(config.watchlist, vec!["AAPL", "MSFT", "EURUSD"]);
        assert_eq!(config.candle_count, 120);
        assert_eq!(
            config.session_times,
            vec![NaiveTime::from_hms_opt(9, 30, 0).unwrap()]
        );
        assert_eq!(config.pipeline.interval, CandleInterval::FiveMinutes);
        assert_eq!(config.pipeline.risk_ratio, 3.0);
        assert_eq!(config.pipeline.risk_tier, RiskProfile::Aggressive);
        assert_eq!(config.pipeline.smoothers, vec![Smoother::Ema]);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = Config::from_vars(vars(&[
            ("FINNHUB_API_KEY", "  "),
            ("CANDLE_COUNT", "lots"),
            ("SESSION_TIMES", "noon"),
            ("RISK_RATIO", "-1"),
            ("RISK_TIER", "reckless"),
            ("CANDLE_INTERVAL_MINUTES", "7"),
        ]));
        assert!(config.finnhub_api_key.is_none());
        assert_eq!(config.candle_count, 200);
        assert_eq!(config.session_times.len(), 3);
        assert_eq!(config.pipeline.risk_ratio, 2.0);
        assert_eq!(config.pipeline.risk_tier, RiskProfile::Medium);
        assert_eq!(config.pipeline.interval, CandleInterval::FifteenMinutes);
    }

    #[test]
    fn test_target_params() {
        let params = PipelineConfig::default().target_params();
        assert_eq!(params.momentum, Some(1.0));
        assert_eq!(params.risk_ratio, 2.0);
    }
}
