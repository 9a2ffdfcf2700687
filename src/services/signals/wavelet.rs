//! Daubechies-4 wavelet denoising.
//!
//! Multilevel discrete wavelet transform with half-sample symmetric
//! boundary extension. Denoising keeps only the coarsest approximation
//! band and reconstructs a series of the input length.

use crate::error::AnalysisError;

/// Minimum input length for a decomposition.
pub const MIN_DECOMPOSITION_LEN: usize = 8;

/// Decomposition low-pass filter for db4.
const DB4_DEC_LO: [f64; 8] = [
    -0.010597401784997278,
    0.032883011666982945,
    0.030841381835986965,
    -0.18703481171888114,
    -0.02798376941698385,
    0.6308807679295904,
    0.7148465705525415,
    0.23037781330885523,
];

const FILTER_LEN: usize = DB4_DEC_LO.len();

/// Reflect an out-of-range index back into `0..n` (half-sample symmetric).
fn symmetric_index(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period) as usize;
    if m < n {
        m
    } else {
        2 * n - 1 - m
    }
}

/// One level of the approximation (low-pass) analysis.
fn dwt_approx(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    let out_len = (n + FILTER_LEN - 1) / 2;

    (0..out_len)
        .map(|o| {
            let i = (2 * o + 1) as isize;
            DB4_DEC_LO
                .iter()
                .enumerate()
                .map(|(j, h)| h * signal[symmetric_index(i - j as isize, n)])
                .sum()
        })
        .collect()
}

/// One level of synthesis from approximation coefficients alone (details zeroed).
fn idwt_approx(coeffs: &[f64]) -> Vec<f64> {
    let m = coeffs.len();
    let out_len = (2 * m + 2).saturating_sub(FILTER_LEN);

    (0..out_len)
        .map(|n| {
            coeffs
                .iter()
                .enumerate()
                .filter_map(|(k, c)| {
                    let idx = (n + FILTER_LEN - 2).checked_sub(2 * k)?;
                    // Reconstruction filter is the reversed decomposition filter.
                    (idx < FILTER_LEN).then(|| c * DB4_DEC_LO[FILTER_LEN - 1 - idx])
                })
                .sum()
        })
        .collect()
}

/// Remove the high-frequency detail bands from `signal` over `levels` levels.
///
/// The result has the same length as the input: the reconstruction is
/// truncated, or padded with its last value when short.
pub fn denoise(signal: &[f64], levels: usize) -> Result<Vec<f64>, AnalysisError> {
    if signal.len() < MIN_DECOMPOSITION_LEN {
        return Err(AnalysisError::InsufficientData {
            needed: MIN_DECOMPOSITION_LEN,
            got: signal.len(),
        });
    }
    if levels == 0 {
        return Ok(signal.to_vec());
    }

    // Lengths of the approximation band at each level, finest first.
    let mut lengths = Vec::with_capacity(levels);
    let mut approx = signal.to_vec();
    for _ in 0..levels {
        approx = dwt_approx(&approx);
        lengths.push(approx.len());
    }

    let mut reconstructed = approx;
    for &target in lengths.iter().rev().skip(1) {
        reconstructed = idwt_approx(&reconstructed);
        if reconstructed.len() == target + 1 {
            reconstructed.pop();
        }
    }
    reconstructed = idwt_approx(&reconstructed);

    reconstructed.truncate(signal.len());
    if let Some(&last) = reconstructed.last() {
        reconstructed.resize(signal.len(), last);
    }

    if reconstructed.len() != signal.len() || reconstructed.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::Numeric(
            "wavelet reconstruction produced invalid values".to_string(),
        ));
    }

    Ok(reconstructed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_index_reflects() {
        assert_eq!(symmetric_index(-1, 5), 0);
        assert_eq!(symmetric_index(-2, 5), 1);
        assert_eq!(symmetric_index(5, 5), 4);
        assert_eq!(symmetric_index(6, 5), 3);
        assert_eq!(symmetric_index(2, 5), 2);
    }

    #[test]
    fn test_filter_sums_to_sqrt_two() {
        let sum: f64 = DB4_DEC_LO.iter().sum();
        assert!((sum - std::f64::consts::SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn test_denoise_preserves_length() {
        for len in [8, 9, 20, 25, 31, 200] {
            let signal: Vec<f64> = (0..len).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();
            let denoised = denoise(&signal, 2).unwrap();
            assert_eq!(denoised.len(), len);
        }
    }

    #[test]
    fn test_denoise_constant_signal_is_unchanged() {
        let signal = vec![42.0; 30];
        let denoised = denoise(&signal, 2).unwrap();
        for v in denoised {
            assert!((v - 42.0).abs() < 1e-9, "got {}", v);
        }
    }

    #[test]
    fn test_denoise_damps_alternating_noise() {
        let signal: Vec<f64> = (0..40).map(|i| 100.0 + (i % 2) as f64).collect();
        let denoised = denoise(&signal, 2).unwrap();
        // Interior points settle near the mean of the two levels.
        for v in &denoised[10..30] {
            assert!((v - 100.5).abs() < 0.1, "got {}", v);
        }
    }

    #[test]
    fn test_denoise_too_short() {
        let err = denoise(&[1.0, 2.0, 3.0], 2).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientData { needed: 8, got: 3 }
        );
    }
}
