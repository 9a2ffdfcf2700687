//! Trend classifier.
//!
//! Denoises closes with a two-level db4 wavelet transform, smooths the
//! result recursively, and classifies the slope of the last few smoothed
//! points against a threshold scaled to the series' typical bar-to-bar move.

use tracing::debug;

use super::indicators::{linear_slope, mean_abs_change};
use super::smoothing::{self, Smoother};
use super::wavelet;
use super::SeriesAnalyzer;
use crate::error::AnalysisError;
use crate::types::{closes, round_to, Bias, OhlcPoint, TrendResult};

/// Minimum candles for a trend call.
pub const MIN_TREND_CANDLES: usize = 20;

const WAVELET_LEVELS: usize = 2;
const SLOPE_WINDOW: usize = 5;
const THRESHOLD_FACTOR: f64 = 0.05;
const CONFIDENCE_SCALE: f64 = 10.0;

pub struct TrendClassifier {
    smoothers: Vec<Smoother>,
}

impl Default for TrendClassifier {
    fn default() -> Self {
        Self {
            smoothers: Smoother::default_order(),
        }
    }
}

impl TrendClassifier {
    /// Classifier trying `smoothers` in order.
    pub fn new(smoothers: Vec<Smoother>) -> Self {
        Self { smoothers }
    }

    fn try_classify(&self, candles: &[OhlcPoint]) -> Result<TrendResult, AnalysisError> {
        if candles.len() < MIN_TREND_CANDLES {
            return Err(AnalysisError::InsufficientData {
                needed: MIN_TREND_CANDLES,
                got: candles.len(),
            });
        }

        let close_prices = closes(candles);
        if close_prices.iter().any(|p| !p.is_finite()) {
            return Err(AnalysisError::DegenerateInput(
                "non-finite close price".to_string(),
            ));
        }

        let (min, max) = close_prices
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(*p), hi.max(*p))
            });
        let price_range = max - min;
        if price_range == 0.0 {
            return Err(AnalysisError::NoPriceMovement);
        }

        let denoised = wavelet::denoise(&close_prices, WAVELET_LEVELS)?;
        let smoothed = smoothing::smooth(&self.smoothers, &denoised)?;

        let window = &smoothed[smoothed.len().saturating_sub(SLOPE_WINDOW)..];
        let slope = linear_slope(window).ok_or_else(|| {
            AnalysisError::DegenerateInput("too few smoothed points for a slope".to_string())
        })?;
        if !slope.is_finite() {
            return Err(AnalysisError::Numeric("slope is not finite".to_string()));
        }

        let normalized_slope = slope / (price_range / close_prices.len() as f64);
        let mut confidence = (normalized_slope.abs() * CONFIDENCE_SCALE).min(1.0);

        let threshold = THRESHOLD_FACTOR * mean_abs_change(&close_prices).unwrap_or(0.01);

        let trend_direction = if slope > threshold {
            Bias::Bullish
        } else if slope < -threshold {
            Bias::Bearish
        } else {
            // Confidence in neutrality.
            confidence = 1.0 - confidence;
            Bias::Neutral
        };

        debug!(
            "Trend {:?}: slope={:.6} threshold={:.6} confidence={:.2}",
            trend_direction, slope, threshold, confidence
        );

        Ok(TrendResult {
            trend_direction,
            confidence: round_to(confidence, 2),
            slope: Some(round_to(slope, 6)),
            threshold: Some(round_to(threshold, 6)),
            error: None,
        })
    }
}

impl SeriesAnalyzer for TrendClassifier {
    type Output = TrendResult;

    fn id(&self) -> &str {
        "trend"
    }

    fn min_periods(&self) -> usize {
        MIN_TREND_CANDLES
    }

    fn analyze(&self, candles: &[OhlcPoint]) -> TrendResult {
        self.try_classify(candles).unwrap_or_else(|e| {
            debug!("Trend classifier fell back to neutral: {}", e);
            TrendResult::unavailable(&e)
        })
    }
}

/// Classify the trend of `candles` with the default smoother order.
pub fn classify_trend(candles: &[OhlcPoint]) -> TrendResult {
    TrendClassifier::default().analyze(candles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candles_from_closes(closes: &[f64]) -> Vec<OhlcPoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcPoint {
                time: 1_700_000_000 + i as i64 * 900,
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: None,
            })
            .collect()
    }

    fn ramp(from: f64, to: f64, count: usize) -> Vec<f64> {
        (0..count)
            .map(|i| from + (to - from) * i as f64 / (count - 1) as f64)
            .collect()
    }

    #[test]
    fn test_trend_id_and_min_periods() {
        let classifier = TrendClassifier::default();
        assert_eq!(classifier.id(), "trend");
        assert_eq!(classifier.min_periods(), 20);
    }

    #[test]
    fn test_trend_insufficient_data() {
        let result = classify_trend(&candles_from_closes(&ramp(100.0, 110.0, 19)));
        assert_eq!(result.trend_direction, Bias::Neutral);
        assert_eq!(result.confidence, 0.0);
        assert!(result.error.unwrap().contains("Not enough data"));
    }

    #[test]
    fn test_trend_rising_series_is_bullish() {
        let result = classify_trend(&candles_from_closes(&ramp(100.0, 120.0, 30)));
        assert_eq!(result.trend_direction, Bias::Bullish);
        assert!(result.confidence > 0.5, "got {}", result.confidence);
        assert!(result.error.is_none());
        assert!(result.slope.unwrap() > result.threshold.unwrap());
    }

    #[test]
    fn test_trend_falling_series_is_bearish() {
        let result = classify_trend(&candles_from_closes(&ramp(120.0, 100.0, 30)));
        assert_eq!(result.trend_direction, Bias::Bearish);
        assert!(result.confidence > 0.5);
    }

    #[test]
    fn test_trend_ema_smoother_agrees() {
        let classifier = TrendClassifier::new(vec![Smoother::Ema]);
        let result = classifier.analyze(&candles_from_closes(&ramp(100.0, 120.0, 30)));
        assert_eq!(result.trend_direction, Bias::Bullish);
    }

    #[test]
    fn test_trend_flat_series_is_neutral() {
        let result = classify_trend(&candles_from_closes(&[100.0; 30]));
        assert_eq!(result.trend_direction, Bias::Neutral);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.error.as_deref(), Some("No price movement detected"));
    }

    #[test]
    fn test_trend_choppy_series_is_neutral() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i % 2) as f64).collect();
        let result = classify_trend(&candles_from_closes(&closes));
        assert_eq!(result.trend_direction, Bias::Neutral);
        assert!((0.0..=1.0).contains(&result.confidence));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_trend_confidence_bounded() {
        for (from, to) in [(100.0, 100.5), (1.0, 500.0), (50.0, 49.0)] {
            let result = classify_trend(&candles_from_closes(&ramp(from, to, 25)));
            assert!((0.0..=1.0).contains(&result.confidence));
        }
    }

    #[test]
    fn test_trend_without_smoothers_degrades() {
        let classifier = TrendClassifier::new(vec![]);
        let result = classifier.analyze(&candles_from_closes(&ramp(100.0, 120.0, 30)));
        assert_eq!(result.trend_direction, Bias::Neutral);
        assert!(result.error.is_some());
    }
}
