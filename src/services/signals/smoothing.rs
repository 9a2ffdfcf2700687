//! Recursive smoothers for the denoised close series.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AnalysisError;

/// EMA smoothing factor used when the Kalman filter is skipped or fails.
pub const EMA_ALPHA: f64 = 0.1;

/// Recursive smoothing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Smoother {
    /// Scalar random-walk Kalman filter (unit process and observation noise).
    Kalman,
    /// Exponential moving average with [`EMA_ALPHA`].
    Ema,
}

impl Smoother {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "kalman" => Some(Self::Kalman),
            "ema" => Some(Self::Ema),
            _ => None,
        }
    }

    /// Default strategy order: Kalman first, EMA as fallback.
    pub fn default_order() -> Vec<Smoother> {
        vec![Smoother::Kalman, Smoother::Ema]
    }

    /// Smooth `data`. Fails on empty input or non-finite output.
    pub fn apply(&self, data: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        if data.is_empty() {
            return Err(AnalysisError::DegenerateInput(
                "nothing to smooth".to_string(),
            ));
        }
        let smoothed = match self {
            Smoother::Kalman => kalman_filter(data, 1.0, 1.0, 1.0),
            Smoother::Ema => ema(data, EMA_ALPHA),
        };
        if smoothed.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::Numeric(format!(
                "{:?} smoother produced non-finite values",
                self
            )));
        }
        Ok(smoothed)
    }
}

/// Try each smoother in order and return the first success.
pub fn smooth(order: &[Smoother], data: &[f64]) -> Result<Vec<f64>, AnalysisError> {
    let mut last_err = AnalysisError::DegenerateInput("no smoother configured".to_string());
    for smoother in order {
        match smoother.apply(data) {
            Ok(smoothed) => return Ok(smoothed),
            Err(e) => {
                debug!("{:?} smoother failed: {}, trying next", smoother, e);
                last_err = e;
            }
        }
    }
    Err(last_err)
}

/// Forward pass of a 1-D Kalman filter with identity transition and observation.
///
/// The state starts at the first observation with variance `initial_variance`.
fn kalman_filter(
    observations: &[f64],
    process_variance: f64,
    observation_variance: f64,
    initial_variance: f64,
) -> Vec<f64> {
    let mut state = observations[0];
    let mut variance = initial_variance;
    let mut out = Vec::with_capacity(observations.len());

    for (t, z) in observations.iter().enumerate() {
        if t > 0 {
            variance += process_variance;
        }
        let gain = variance / (variance + observation_variance);
        state += gain * (z - state);
        variance *= 1.0 - gain;
        out.push(state);
    }

    out
}

/// Exponential moving average seeded with the first value.
fn ema(data: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(data.len());
    let mut prev = data[0];
    out.push(prev);
    for v in &data[1..] {
        prev = alpha * v + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kalman_tracks_constant() {
        let data = vec![10.0; 20];
        let out = Smoother::Kalman.apply(&data).unwrap();
        assert!(out.iter().all(|v| (v - 10.0).abs() < 1e-12));
    }

    #[test]
    fn test_kalman_follows_ramp_with_lag() {
        let data: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let out = Smoother::Kalman.apply(&data).unwrap();
        let last = *out.last().unwrap();
        assert!(last < 29.0 && last > 27.0, "got {}", last);
    }

    #[test]
    fn test_ema_first_steps() {
        let out = Smoother::Ema.apply(&[10.0, 20.0, 20.0]).unwrap();
        assert_eq!(out[0], 10.0);
        assert!((out[1] - 11.0).abs() < 1e-12);
        assert!((out[2] - 11.9).abs() < 1e-12);
    }

    #[test]
    fn test_smooth_falls_back_on_failure() {
        let data = vec![1.0, f64::NAN, 2.0];
        // Both strategies propagate NaN, so the chain reports the last failure.
        assert!(matches!(
            smooth(&Smoother::default_order(), &data),
            Err(AnalysisError::Numeric(_))
        ));
        assert!(smooth(&[], &[1.0]).is_err());
    }

    #[test]
    fn test_smooth_empty_is_degenerate() {
        assert!(matches!(
            smooth(&Smoother::default_order(), &[]),
            Err(AnalysisError::DegenerateInput(_))
        ));
    }
}
