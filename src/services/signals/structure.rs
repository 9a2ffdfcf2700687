//! Market structure analyzer.
//!
//! Finds swing points, checks whether the latest close broke the
//! second-most-recent swing (break of structure), locates the order block
//! that preceded the break, and picks a liquidity zone from recent extremes.

use tracing::debug;

use super::SeriesAnalyzer;
use crate::error::AnalysisError;
use crate::types::{
    Bias, BreakOfStructure, OhlcPoint, OrderBlock, StructureResult, SwingKind, SwingPoint,
};

/// Minimum candles for structure analysis.
pub const MIN_STRUCTURE_CANDLES: usize = 25;

/// Half-width of the swing window.
pub const SWING_HALF_WIDTH: usize = 5;

const ORDER_BLOCK_LOOKBACK: usize = 10;
const LIQUIDITY_LOOKBACK: usize = 20;

/// Find swing highs and lows using a centered window of `2n + 1` candles.
///
/// A candle is a swing high when its high is strictly greater than every other
/// high in the window, and a swing low when its low is strictly lower than every
/// other low. `n` shrinks to fit series shorter than `2n + 1`. Points are
/// returned in index order.
pub fn find_swings(candles: &[OhlcPoint], n: usize) -> Vec<SwingPoint> {
    let n = n.min(candles.len().saturating_sub(1) / 2);
    if n == 0 {
        return Vec::new();
    }

    let mut swings = Vec::new();
    for i in n..candles.len() - n {
        let window = &candles[i - n..=i + n];
        let center = &candles[i];

        let is_high = window
            .iter()
            .enumerate()
            .all(|(j, c)| j == n || c.high < center.high);
        let is_low = window
            .iter()
            .enumerate()
            .all(|(j, c)| j == n || c.low > center.low);

        if is_high {
            swings.push(SwingPoint {
                index: i,
                price: center.high,
                kind: SwingKind::High,
            });
        }
        if is_low {
            swings.push(SwingPoint {
                index: i,
                price: center.low,
                kind: SwingKind::Low,
            });
        }
    }
    swings
}

/// Second-most-recent swing of a kind; the latest may not be confirmed yet.
fn reference_swing(swings: &[SwingPoint], kind: SwingKind) -> Option<SwingPoint> {
    let mut of_kind = swings.iter().filter(|s| s.kind == kind).rev();
    of_kind.next()?;
    of_kind.next().copied()
}

/// Last candle of the opposite colour in the lookback window ending at `end`.
fn find_order_block(candles: &[OhlcPoint], end: usize, bos: BreakOfStructure) -> Option<OrderBlock> {
    let start = (end + 1).saturating_sub(ORDER_BLOCK_LOOKBACK);
    let window = candles.get(start..=end)?;

    let candle = match bos {
        BreakOfStructure::Bullish => window.iter().rev().find(|c| c.is_bearish())?,
        BreakOfStructure::Bearish => window.iter().rev().find(|c| c.is_bullish())?,
        BreakOfStructure::None => return None,
    };

    Some(OrderBlock {
        kind: bos.bias(),
        price_low: candle.low,
        price_high: candle.high,
    })
}

/// Recent extreme that attracts stop orders for the given bias.
fn liquidity_zone(candles: &[OhlcPoint], bias: Bias) -> Option<f64> {
    let recent = &candles[candles.len().saturating_sub(LIQUIDITY_LOOKBACK)..];
    if recent.is_empty() {
        return None;
    }
    let low = recent.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let high = recent.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);

    Some(match bias {
        Bias::Bullish => low,
        Bias::Bearish => high,
        Bias::Neutral => (low + high) / 2.0,
    })
}

#[derive(Default)]
pub struct StructureAnalyzer;

impl StructureAnalyzer {
    fn try_analyze(&self, candles: &[OhlcPoint]) -> Result<StructureResult, AnalysisError> {
        if candles.len() < MIN_STRUCTURE_CANDLES {
            return Err(AnalysisError::InsufficientData {
                needed: MIN_STRUCTURE_CANDLES,
                got: candles.len(),
            });
        }
        if candles
            .iter()
            .any(|c| !(c.open.is_finite() && c.high.is_finite() && c.low.is_finite() && c.close.is_finite()))
        {
            return Err(AnalysisError::DegenerateInput(
                "non-finite price in series".to_string(),
            ));
        }

        let swings = find_swings(candles, SWING_HALF_WIDTH);
        let current_close = candles[candles.len() - 1].close;

        let swing_high = reference_swing(&swings, SwingKind::High);
        let swing_low = reference_swing(&swings, SwingKind::Low);

        let bullish_break = swing_high.filter(|s| current_close > s.price);
        let bearish_break = swing_low.filter(|s| current_close < s.price);

        // When both sides broke, the more recent swing wins.
        let broken = match (bullish_break, bearish_break) {
            (Some(h), Some(l)) if l.index > h.index => Some((BreakOfStructure::Bearish, l)),
            (Some(h), _) => Some((BreakOfStructure::Bullish, h)),
            (None, Some(l)) => Some((BreakOfStructure::Bearish, l)),
            (None, None) => None,
        };

        let (bos_detected, key_level, order_block) = match broken {
            Some((bos, swing)) => (
                bos,
                swing.price,
                find_order_block(candles, swing.index, bos),
            ),
            None => (BreakOfStructure::None, current_close, None),
        };
        let structure_bias = bos_detected.bias();

        debug!(
            "Structure {:?}: {} swings, key level {:.4}, order block {:?}",
            bos_detected,
            swings.len(),
            key_level,
            order_block
        );

        Ok(StructureResult {
            structure_bias,
            bos_detected,
            order_block,
            key_level: Some(key_level),
            liquidity_zone: liquidity_zone(candles, structure_bias),
            swing_highs: swings.iter().filter(|s| s.kind == SwingKind::High).count(),
            swing_lows: swings.iter().filter(|s| s.kind == SwingKind::Low).count(),
            error: None,
        })
    }
}

impl SeriesAnalyzer for StructureAnalyzer {
    type Output = StructureResult;

    fn id(&self) -> &str {
        "structure"
    }

    fn min_periods(&self) -> usize {
        MIN_STRUCTURE_CANDLES
    }

    fn analyze(&self, candles: &[OhlcPoint]) -> StructureResult {
        self.try_analyze(candles).unwrap_or_else(|e| {
            debug!("Structure analyzer fell back to neutral: {}", e);
            StructureResult::unavailable(&e, candles.last().map(|c| c.close))
        })
    }
}

/// Analyze market structure of `candles`.
pub fn analyze_structure(candles: &[OhlcPoint]) -> StructureResult {
    StructureAnalyzer.analyze(candles)
}
