//! Average True Range (ATR) indicator.

use crate::types::OhlcPoint;

/// ATR (Average True Range) indicator.
///
/// Measures market volatility as the simple rolling mean of true ranges:
/// TR = max(High-Low, |High-PrevClose|, |Low-PrevClose|)
///
/// The first candle has no previous close, so its true range is High-Low.
pub struct Atr {
    period: usize,
}

impl Default for Atr {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// True range for every candle in the series.
    pub fn true_ranges(candles: &[OhlcPoint]) -> Vec<f64> {
        candles
            .iter()
            .enumerate()
            .map(|(i, c)| c.true_range(i.checked_sub(1).map(|p| &candles[p])))
            .collect()
    }

    /// Mean of the last `period` true ranges. None if fewer candles than the period.
    pub fn calculate(&self, candles: &[OhlcPoint]) -> Option<f64> {
        if candles.len() < self.period {
            return None;
        }
        let true_ranges = Self::true_ranges(candles);
        let window = &true_ranges[true_ranges.len() - self.period..];
        Some(window.iter().sum::<f64>() / self.period as f64)
    }

    /// ATR as a fraction of the latest close.
    pub fn relative(&self, candles: &[OhlcPoint]) -> Option<f64> {
        let atr = self.calculate(candles)?;
        let current_price = candles.last()?.close;
        if current_price == 0.0 {
            return None;
        }
        Some(atr / current_price)
    }
}
