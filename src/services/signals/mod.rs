//! Signal-fusion components.
//!
//! Each component derives a partial judgment from a candle series (or from
//! headlines), the aggregator fuses them into one bias, and the target,
//! timing and risk calculators turn that bias into tradeable levels.

pub mod aggregator;
pub mod indicators;
pub mod risk;
pub mod sentiment;
pub mod smoothing;
pub mod structure;
pub mod targets;
pub mod timing;
pub mod trend;
pub mod wavelet;

pub use aggregator::aggregate;
pub use risk::size_position;
pub use sentiment::{classify_labels, ClassifierChain, KeywordClassifier, SentimentClassifier};
pub use smoothing::Smoother;
pub use structure::{analyze_structure, find_swings, StructureAnalyzer};
pub use targets::{predict_targets, TargetParams};
pub use timing::estimate_time_and_volatility;
pub use trend::{classify_trend, TrendClassifier};

use crate::types::OhlcPoint;

/// Trait for components that analyze a candle series.
///
/// Implementations never fail: below `min_periods` or on any internal
/// error they return a neutral result carrying an error tag.
pub trait SeriesAnalyzer: Send + Sync {
    type Output;

    /// Unique identifier for this component.
    fn id(&self) -> &str;

    /// Minimum number of candles required for a directional result.
    fn min_periods(&self) -> usize;

    /// Analyze the series.
    fn analyze(&self, candles: &[OhlcPoint]) -> Self::Output;
}
