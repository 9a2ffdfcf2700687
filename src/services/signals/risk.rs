//! Tiered position sizing.

use tracing::debug;

use crate::types::{normalize_confidence, RiskDecision, RiskProfile, VolatilityTier};

const LOW_CONFIDENCE: f64 = 0.4;
const HIGH_CONFIDENCE: f64 = 0.75;

/// Pick a position-size tier from fused confidence and volatility.
///
/// First match wins: low confidence, then high volatility, force conservative;
/// high confidence goes aggressive; otherwise the requested tier applies.
/// An unrecognised tier is treated as medium.
pub fn size_position(
    confidence: f64,
    volatility: VolatilityTier,
    requested_tier: &str,
) -> RiskDecision {
    let confidence = normalize_confidence(confidence);

    let (profile, why) = if confidence < LOW_CONFIDENCE {
        (
            RiskProfile::Conservative,
            "Low confidence score (< 0.4).".to_string(),
        )
    } else if volatility == VolatilityTier::High {
        (
            RiskProfile::Conservative,
            "High market volatility.".to_string(),
        )
    } else if confidence > HIGH_CONFIDENCE {
        (
            RiskProfile::Aggressive,
            "High confidence score (> 0.75).".to_string(),
        )
    } else {
        (
            RiskProfile::from_str(requested_tier).unwrap_or_default(),
            format!(
                "Confidence score {} with {} volatility.",
                confidence, volatility
            ),
        )
    };

    debug!("Risk tier {} for confidence {:.2}", profile, confidence);

    RiskDecision {
        risk_profile: profile,
        suggested_lot_size: profile.lot_size(),
        reason: format!("{} Applying '{}' risk tier.", why, profile),
    }
}
