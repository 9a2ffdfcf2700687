use serde::{Deserialize, Serialize};

/// Nominal candle interval used for fetching and time math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CandleInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    #[default]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
}

impl CandleInterval {
    /// Get the interval from a string ("15m", "1h") or a bare minute count ("15").
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "1m" | "1" => Some(CandleInterval::OneMinute),
            "5m" | "5" => Some(CandleInterval::FiveMinutes),
            "15m" | "15" => Some(CandleInterval::FifteenMinutes),
            "30m" | "30" => Some(CandleInterval::ThirtyMinutes),
            "1h" | "60" => Some(CandleInterval::OneHour),
            _ => None,
        }
    }

    /// Length of one candle in minutes.
    pub fn minutes(&self) -> u32 {
        match self {
            CandleInterval::OneMinute => 1,
            CandleInterval::FiveMinutes => 5,
            CandleInterval::FifteenMinutes => 15,
            CandleInterval::ThirtyMinutes => 30,
            CandleInterval::OneHour => 60,
        }
    }

    /// Finnhub `resolution` query value.
    pub fn finnhub_resolution(&self) -> &'static str {
        match self {
            CandleInterval::OneMinute => "1",
            CandleInterval::FiveMinutes => "5",
            CandleInterval::FifteenMinutes => "15",
            CandleInterval::ThirtyMinutes => "30",
            CandleInterval::OneHour => "60",
        }
    }

    /// Twelve Data `interval` query value.
    pub fn twelvedata_interval(&self) -> &'static str {
        match self {
            CandleInterval::OneMinute => "1min",
            CandleInterval::FiveMinutes => "5min",
            CandleInterval::FifteenMinutes => "15min",
            CandleInterval::ThirtyMinutes => "30min",
            CandleInterval::OneHour => "1h",
        }
    }
}

/// OHLC (Open, High, Low, Close) candle. `time` is a unix timestamp in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcPoint {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl OhlcPoint {
    /// Close above open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Close below open.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// True range against the previous candle's close.
    pub fn true_range(&self, previous: Option<&OhlcPoint>) -> f64 {
        let hl = self.high - self.low;
        match previous {
            Some(prev) => {
                let hc = (self.high - prev.close).abs();
                let lc = (self.low - prev.close).abs();
                hl.max(hc).max(lc)
            }
            None => hl,
        }
    }
}

/// Close prices of a candle series.
pub fn closes(candles: &[OhlcPoint]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}
