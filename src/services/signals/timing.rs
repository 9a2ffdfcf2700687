//! Time-to-zone estimates and ATR volatility tier.

use tracing::debug;

use super::indicators::Atr;
use crate::error::AnalysisError;
use crate::types::{OhlcPoint, TimeEstimate, VolatilityTier, ZoneAnchor};

/// Minimum candles for time estimation.
pub const MIN_TIMING_CANDLES: usize = 10;

const HIGH_VOLATILITY: f64 = 0.005;
const MODERATE_VOLATILITY: f64 = 0.002;
const NOT_AVAILABLE: &str = "N/A";

/// Volatility tier from 14-period ATR relative to the latest close.
///
/// Series too short for the ATR window read as low volatility.
pub fn volatility_tier(candles: &[OhlcPoint]) -> VolatilityTier {
    match Atr::default().relative(candles) {
        Some(r) if r > HIGH_VOLATILITY => VolatilityTier::High,
        Some(r) if r > MODERATE_VOLATILITY => VolatilityTier::Moderate,
        _ => VolatilityTier::Low,
    }
}

/// Distance from `price` to the nearest edge of `zone`; zero inside it.
fn distance_to_zone(price: f64, zone: &ZoneAnchor) -> f64 {
    if price < zone.lower() {
        zone.lower() - price
    } else if price > zone.upper() {
        price - zone.upper()
    } else {
        0.0
    }
}

fn format_entry_time(minutes: f64) -> String {
    if minutes < 60.0 {
        format!("in ~{} minutes", minutes as i64)
    } else {
        format!("in ~{:.1} hours", minutes / 60.0)
    }
}

fn unavailable(entry_zone: Option<&str>, volatility: VolatilityTier, error: Option<String>) -> TimeEstimate {
    TimeEstimate {
        estimated_entry_time: NOT_AVAILABLE.to_string(),
        tp_eta: NOT_AVAILABLE.to_string(),
        best_entry_zone: entry_zone.unwrap_or(NOT_AVAILABLE).to_string(),
        volatility,
        entry_minutes: None,
        tp_minutes: None,
        error,
    }
}

/// Estimate how long price needs to reach `entry_zone` and the take-profit.
///
/// Speed is the mean candle range per `interval_minutes`. The take-profit ETA
/// assumes twice the entry distance.
pub fn estimate_time_and_volatility(
    candles: &[OhlcPoint],
    entry_zone: Option<&str>,
    interval_minutes: u32,
) -> TimeEstimate {
    if candles.len() < MIN_TIMING_CANDLES {
        let e = AnalysisError::InsufficientData {
            needed: MIN_TIMING_CANDLES,
            got: candles.len(),
        };
        debug!("Time estimator unavailable: {}", e);
        return unavailable(entry_zone, VolatilityTier::Unknown, Some(e.to_string()));
    }

    let current_close = candles[candles.len() - 1].close;
    if !current_close.is_finite() {
        let e = AnalysisError::DegenerateInput("latest close is not finite".to_string());
        debug!("Time estimator unavailable: {}", e);
        return unavailable(entry_zone, VolatilityTier::Unknown, Some(e.to_string()));
    }

    let avg_candle_size =
        candles.iter().map(|c| c.high - c.low).sum::<f64>() / candles.len() as f64;
    if !avg_candle_size.is_finite() {
        let e = AnalysisError::Numeric("average candle size is not finite".to_string());
        debug!("Time estimator unavailable: {}", e);
        return unavailable(entry_zone, VolatilityTier::Unknown, Some(e.to_string()));
    }
    if avg_candle_size == 0.0 {
        return unavailable(entry_zone, VolatilityTier::Low, None);
    }

    let volatility = volatility_tier(candles);

    let zone = match entry_zone.filter(|z| *z != NOT_AVAILABLE) {
        Some(raw) => match ZoneAnchor::parse(raw) {
            Some(zone) => zone,
            None => {
                let e = AnalysisError::DegenerateInput(format!("unparseable entry zone {:?}", raw));
                debug!("Time estimator: {}", e);
                return unavailable(entry_zone, volatility, Some(e.to_string()));
            }
        },
        None => return unavailable(entry_zone, volatility, None),
    };

    let distance = distance_to_zone(current_close, &zone);
    let entry_minutes = distance / avg_candle_size * interval_minutes as f64;
    let tp_minutes = 2.0 * entry_minutes;

    debug!(
        "Time estimate: distance={:.4} avg_candle={:.4} entry={:.1}m volatility={}",
        distance, avg_candle_size, entry_minutes, volatility
    );

    TimeEstimate {
        estimated_entry_time: format_entry_time(entry_minutes),
        tp_eta: format!("within {:.1} hours", tp_minutes / 60.0),
        best_entry_zone: entry_zone.unwrap_or(NOT_AVAILABLE).to_string(),
        volatility,
        entry_minutes: Some(entry_minutes),
        tp_minutes: Some(tp_minutes),
        error: None,
    }
}
