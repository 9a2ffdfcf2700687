//! Take-profit / stop-loss projection from bias and structure zones.

use tracing::debug;

use crate::types::{format_band, normalize_confidence, Bias, StructureZones, TargetResult};

pub const DEFAULT_MOMENTUM: f64 = 1.0;
pub const DEFAULT_RISK_RATIO: f64 = 2.0;
/// Floor on `momentum * confidence`.
pub const MIN_PRICE_MULTIPLIER: f64 = 0.01;
/// Target span, as a fraction of the entry, when no anchor lies beyond the entry.
pub const MIN_TARGET_SPAN: f64 = 0.01;

/// Momentum and reward-to-risk settings for target projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetParams {
    pub momentum: Option<f64>,
    pub risk_ratio: f64,
}

impl Default for TargetParams {
    fn default() -> Self {
        Self {
            momentum: None,
            risk_ratio: DEFAULT_RISK_RATIO,
        }
    }
}

impl TargetParams {
    pub fn predict(
        &self,
        bias: Bias,
        confidence: f64,
        zones: &StructureZones,
        entry_price: f64,
    ) -> TargetResult {
        predict_targets(
            bias,
            confidence,
            self.momentum,
            zones,
            entry_price,
            self.risk_ratio,
        )
    }
}

/// Project take-profit and stop-loss levels.
///
/// Bullish targets extend above the highest of the order-block top, the
/// liquidity zone and the entry; bearish targets mirror below the lowest.
/// Missing zones fall back to the entry price. When no anchor lies beyond
/// the entry, the span before the multiplier is [`MIN_TARGET_SPAN`] of the
/// entry. Neutral keeps every level at the entry.
pub fn predict_targets(
    bias: Bias,
    confidence: f64,
    momentum: Option<f64>,
    zones: &StructureZones,
    entry_price: f64,
    risk_ratio: f64,
) -> TargetResult {
    let confidence = normalize_confidence(confidence);
    let momentum = momentum
        .filter(|m| m.is_finite())
        .unwrap_or(DEFAULT_MOMENTUM);
    let risk_ratio = if risk_ratio.is_finite() && risk_ratio > 0.0 {
        risk_ratio
    } else {
        DEFAULT_RISK_RATIO
    };
    let price_multiplier = (momentum * confidence).max(MIN_PRICE_MULTIPLIER);

    let liquidity = zones.liquidity_zone.unwrap_or(entry_price);

    let (tp_level, sl_level) = match bias {
        Bias::Bullish => {
            let ob_high = zones.order_block.map(|z| z.upper()).unwrap_or(entry_price);
            let base_tp = ob_high.max(liquidity).max(entry_price);
            let tp_distance = target_span(base_tp, entry_price) * price_multiplier;
            (base_tp + tp_distance, entry_price - tp_distance / risk_ratio)
        }
        Bias::Bearish => {
            let ob_low = zones.order_block.map(|z| z.lower()).unwrap_or(entry_price);
            let base_tp = ob_low.min(liquidity).min(entry_price);
            let tp_distance = target_span(base_tp, entry_price) * price_multiplier;
            (base_tp - tp_distance, entry_price + tp_distance / risk_ratio)
        }
        Bias::Neutral => (entry_price, entry_price),
    };

    let intermediate = entry_price + 0.5 * (tp_level - entry_price);

    debug!(
        "Targets {}: entry={:.4} tp={:.4} sl={:.4} multiplier={:.3}",
        bias, entry_price, tp_level, sl_level, price_multiplier
    );

    TargetResult {
        bias,
        confidence,
        tp_level,
        sl_level,
        tp_zone: format_band(intermediate, tp_level),
        levels: vec![intermediate, tp_level],
    }
}

fn target_span(base_tp: f64, entry_price: f64) -> f64 {
    let span = (base_tp - entry_price).abs();
    if span > 0.0 {
        span
    } else {
        entry_price.abs() * MIN_TARGET_SPAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ZoneAnchor;

    fn zones(ob: Option<ZoneAnchor>, liquidity: Option<f64>) -> StructureZones {
        StructureZones {
            order_block: ob,
            liquidity_zone: liquidity,
        }
    }

    #[test]
    fn test_neutral_keeps_entry() {
        let z = zones(Some(ZoneAnchor::Band { low: 90.0, high: 95.0 }), Some(120.0));
        let result = predict_targets(Bias::Neutral, 0.9, None, &z, 101.25, 2.0);
        assert_eq!(result.tp_level, 101.25);
        assert_eq!(result.sl_level, 101.25);
        assert_eq!(result.levels, vec![101.25, 101.25]);
        assert_eq!(result.tp_zone, "101.2500 -- 101.2500");
    }

    #[test]
    fn test_bullish_uses_highest_anchor() {
        let z = zones(Some(ZoneAnchor::Band { low: 104.0, high: 106.0 }), Some(110.0));
        let result = predict_targets(Bias::Bullish, 0.5, Some(1.0), &z, 100.0, 2.0);
        // base 110, distance 10 * 0.5
        assert_eq!(result.tp_level, 115.0);
        assert_eq!(result.sl_level, 97.5);
        assert_eq!(result.levels, vec![107.5, 115.0]);
        assert_eq!(result.tp_zone, "107.5000 -- 115.0000");
    }

    #[test]
    fn test_bullish_levels_ordered() {
        let z = zones(Some(ZoneAnchor::Price(103.0)), None);
        for confidence in [0.05, 0.4, 0.8, 100.0] {
            let result = predict_targets(Bias::Bullish, confidence, None, &z, 100.0, 2.0);
            assert!(result.tp_level > 100.0);
            assert!(result.levels[0] > 100.0 && result.levels[0] < result.tp_level);
            assert!(result.sl_level < 100.0);
        }
    }

    #[test]
    fn test_bearish_uses_lowest_anchor() {
        let z = zones(Some(ZoneAnchor::Band { low: 94.0, high: 96.0 }), Some(97.0));
        let result = predict_targets(Bias::Bearish, 80.0, None, &z, 100.0, 4.0);
        // base 94, distance 6 * 0.8
        assert!((result.tp_level - 89.2).abs() < 1e-9);
        assert!((result.sl_level - 101.2).abs() < 1e-9);
        assert!(result.levels[0] < 100.0 && result.levels[0] > result.tp_level);
        assert_eq!(result.confidence, 0.8);
    }

    #[test]
    fn test_missing_zones_use_minimum_span() {
        let result = predict_targets(Bias::Bullish, 0.9, None, &StructureZones::default(), 50.0, 2.0);
        // span 0.5 * 0.9
        assert!((result.tp_level - 50.45).abs() < 1e-9);
        assert!((result.sl_level - 49.775).abs() < 1e-9);
    }

    #[test]
    fn test_anchors_behind_entry_still_project() {
        let z = zones(Some(ZoneAnchor::Band { low: 97.0, high: 99.0 }), Some(95.0));
        let bull = predict_targets(Bias::Bullish, 0.8, Some(1.0), &z, 100.0, 2.0);
        assert!((bull.tp_level - 100.8).abs() < 1e-9);
        assert!((bull.sl_level - 99.6).abs() < 1e-9);
        assert!(bull.levels[0] > 100.0 && bull.levels[0] < bull.tp_level);

        let z = zones(Some(ZoneAnchor::Price(104.0)), Some(101.0));
        let bear = predict_targets(Bias::Bearish, 0.8, Some(1.0), &z, 100.0, 2.0);
        assert!((bear.tp_level - 99.2).abs() < 1e-9);
        assert!((bear.sl_level - 100.4).abs() < 1e-9);
        assert!(bear.levels[0] < 100.0 && bear.levels[0] > bear.tp_level);
    }

    #[test]
    fn test_multiplier_floor() {
        let z = zones(None, Some(200.0));
        let result = predict_targets(Bias::Bullish, 0.0, Some(1.0), &z, 100.0, 2.0);
        // distance 100 * 0.01
        assert!((result.tp_level - 201.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_risk_ratio_defaults() {
        let z = zones(None, Some(110.0));
        let a = predict_targets(Bias::Bullish, 1.0, None, &z, 100.0, 0.0);
        let b = predict_targets(Bias::Bullish, 1.0, None, &z, 100.0, 2.0);
        assert_eq!(a.sl_level, b.sl_level);
    }

    #[test]
    fn test_params_default() {
        let params = TargetParams::default();
        assert_eq!(params.risk_ratio, 2.0);
        let z = zones(None, Some(110.0));
        let result = params.predict(Bias::Bullish, 1.0, &z, 100.0);
        assert_eq!(result.tp_level, 120.0);
        assert_eq!(result.sl_level, 95.0);
    }
}
