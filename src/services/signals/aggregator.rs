//! Weighted fusion of trend, sentiment and structure into one bias.

use tracing::debug;

use crate::types::{
    normalize_confidence, round_to, AggregatedSignal, Bias, ComponentScores, SentimentResult,
    StructureResult, TrendResult,
};

pub const TREND_WEIGHT: f64 = 0.5;
pub const SENTIMENT_WEIGHT: f64 = 0.2;
pub const STRUCTURE_WEIGHT: f64 = 0.3;

impl ComponentScores {
    fn add(&mut self, bias: Bias, weighted_confidence: f64) {
        match bias.score() {
            1 => self.bullish += weighted_confidence,
            -1 => self.bearish += weighted_confidence,
            _ => {}
        }
    }
}

/// Fuse the three component results.
///
/// The strictly larger bucket decides the bias and its value is the
/// confidence. Equal buckets give neutral with `1 - max(bullish, bearish)`.
pub fn aggregate(
    trend: &TrendResult,
    sentiment: &SentimentResult,
    structure: &StructureResult,
) -> AggregatedSignal {
    let mut scores = ComponentScores::default();

    scores.add(
        trend.trend_direction,
        normalize_confidence(trend.confidence) * TREND_WEIGHT,
    );
    scores.add(
        sentiment.sentiment,
        normalize_confidence(sentiment.confidence) * SENTIMENT_WEIGHT,
    );
    // Structure has no graded confidence: a break counts in full.
    let structure_confidence = if structure.structure_bias.is_directional() {
        1.0
    } else {
        0.0
    };
    scores.add(
        structure.structure_bias,
        structure_confidence * STRUCTURE_WEIGHT,
    );

    let (final_bias, confidence) = if scores.bullish > scores.bearish {
        (Bias::Bullish, scores.bullish)
    } else if scores.bearish > scores.bullish {
        (Bias::Bearish, scores.bearish)
    } else {
        (Bias::Neutral, 1.0 - scores.bullish.max(scores.bearish))
    };

    debug!(
        "Aggregated {} ({:.2}) from bullish={:.3} bearish={:.3}",
        final_bias, confidence, scores.bullish, scores.bearish
    );

    AggregatedSignal {
        final_bias,
        bias_confidence: round_to(confidence.min(1.0), 2),
        component_scores: scores,
    }
}
