use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::AnalysisError;

/// Directional call shared by every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl Bias {
    /// Parse from string, case-insensitive.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bullish" | "bull" => Some(Self::Bullish),
            "bearish" | "bear" => Some(Self::Bearish),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    /// +1 / -1 / 0.
    pub fn score(&self) -> i8 {
        match self {
            Bias::Bullish => 1,
            Bias::Bearish => -1,
            Bias::Neutral => 0,
        }
    }

    /// Get display label for this bias.
    pub fn label(&self) -> &'static str {
        match self {
            Bias::Bullish => "Bullish",
            Bias::Bearish => "Bearish",
            Bias::Neutral => "Neutral",
        }
    }

    pub fn is_directional(&self) -> bool {
        !matches!(self, Bias::Neutral)
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalize a confidence given either as a fraction or a percentage into [0, 1].
pub fn normalize_confidence(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let value = if value > 1.0 { value / 100.0 } else { value };
    value.clamp(0.0, 1.0)
}

/// Round to a fixed number of decimals.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Output of the trend classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub trend_direction: Bias,
    /// Confidence in [0, 1]. For a neutral call this is confidence in neutrality.
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slope: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrendResult {
    /// Neutral, zero-confidence result tagged with the failure.
    pub fn unavailable(error: &AnalysisError) -> Self {
        Self {
            trend_direction: Bias::Neutral,
            confidence: 0.0,
            slope: None,
            threshold: None,
            error: Some(error.to_string()),
        }
    }
}

/// Kind of swing extremum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingKind {
    High,
    Low,
}

/// A confirmed local extremum in a candle series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
    pub kind: SwingKind,
}

/// Break-of-structure outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BreakOfStructure {
    Bullish,
    Bearish,
    #[default]
    None,
}

impl BreakOfStructure {
    pub fn bias(&self) -> Bias {
        match self {
            BreakOfStructure::Bullish => Bias::Bullish,
            BreakOfStructure::Bearish => Bias::Bearish,
            BreakOfStructure::None => Bias::Neutral,
        }
    }
}

/// Candle range preceding a break of structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBlock {
    #[serde(rename = "type")]
    pub kind: Bias,
    pub price_low: f64,
    pub price_high: f64,
}

impl OrderBlock {
    /// Block as a two-endpoint band, e.g. `"1.0810 -- 1.0825"`.
    pub fn zone(&self) -> String {
        format_band(self.price_low, self.price_high)
    }

    pub fn as_anchor(&self) -> ZoneAnchor {
        ZoneAnchor::Band {
            low: self.price_low,
            high: self.price_high,
        }
    }
}

/// Output of the structure analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureResult {
    pub structure_bias: Bias,
    pub bos_detected: BreakOfStructure,
    pub order_block: Option<OrderBlock>,
    /// Broken swing price, or the current close when nothing broke.
    pub key_level: Option<f64>,
    pub liquidity_zone: Option<f64>,
    pub swing_highs: usize,
    pub swing_lows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StructureResult {
    /// Neutral result tagged with the failure. `last_close` is kept as key level when known.
    pub fn unavailable(error: &AnalysisError, last_close: Option<f64>) -> Self {
        Self {
            structure_bias: Bias::Neutral,
            bos_detected: BreakOfStructure::None,
            order_block: None,
            key_level: last_close,
            liquidity_zone: None,
            swing_highs: 0,
            swing_lows: 0,
            error: Some(error.to_string()),
        }
    }

    /// Zones the target engine anchors on.
    pub fn zones(&self) -> StructureZones {
        StructureZones {
            order_block: self.order_block.map(|ob| ob.as_anchor()),
            liquidity_zone: self.liquidity_zone,
        }
    }
}

/// Output of the sentiment classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResult {
    pub sentiment: Bias,
    pub confidence: f64,
    pub headline_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SentimentResult {
    /// Result for an empty headline set: neutral with full confidence in the absence of signal.
    pub fn no_headlines() -> Self {
        Self {
            sentiment: Bias::Neutral,
            confidence: 1.0,
            headline_count: 0,
            reason: Some("No headlines found.".to_string()),
            error: None,
        }
    }
}

/// Weighted bucket totals behind an aggregated signal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentScores {
    pub bullish: f64,
    pub bearish: f64,
}

/// Fused bias from trend, sentiment and structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSignal {
    pub final_bias: Bias,
    pub bias_confidence: f64,
    pub component_scores: ComponentScores,
}

/// A structure anchor given either as a price band or a bare price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZoneAnchor {
    Band { low: f64, high: f64 },
    Price(f64),
}

impl ZoneAnchor {
    /// Parse `"low -- high"` or a bare price. Endpoints may come in either order.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split("--").map(str::trim).collect();
        match parts.as_slice() {
            [price] => price.parse::<f64>().ok().filter(|p| p.is_finite()).map(ZoneAnchor::Price),
            [a, b] => {
                let a = a.parse::<f64>().ok().filter(|p| p.is_finite())?;
                let b = b.parse::<f64>().ok().filter(|p| p.is_finite())?;
                Some(ZoneAnchor::Band {
                    low: a.min(b),
                    high: a.max(b),
                })
            }
            _ => None,
        }
    }

    pub fn upper(&self) -> f64 {
        match *self {
            ZoneAnchor::Band { high, .. } => high,
            ZoneAnchor::Price(p) => p,
        }
    }

    pub fn lower(&self) -> f64 {
        match *self {
            ZoneAnchor::Band { low, .. } => low,
            ZoneAnchor::Price(p) => p,
        }
    }
}

impl fmt::Display for ZoneAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ZoneAnchor::Band { low, high } => f.write_str(&format_band(low, high)),
            ZoneAnchor::Price(p) => write!(f, "{:.4}", p),
        }
    }
}

/// Format a price band as `"low -- high"` with four decimals.
pub fn format_band(a: f64, b: f64) -> String {
    format!("{:.4} -- {:.4}", a.min(b), a.max(b))
}

/// Structure zones consumed by the target engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureZones {
    pub order_block: Option<ZoneAnchor>,
    pub liquidity_zone: Option<f64>,
}

/// Projected take-profit / stop-loss levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResult {
    pub bias: Bias,
    pub confidence: f64,
    pub tp_level: f64,
    pub sl_level: f64,
    pub tp_zone: String,
    /// Intermediate take-profit followed by the final one.
    pub levels: Vec<f64>,
}

/// Volatility bucket from ATR relative to price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityTier {
    Low,
    Moderate,
    High,
    /// Not enough candles to measure.
    Unknown,
}

impl VolatilityTier {
    pub fn name(&self) -> &'static str {
        match self {
            VolatilityTier::Low => "low",
            VolatilityTier::Moderate => "moderate",
            VolatilityTier::High => "high",
            VolatilityTier::Unknown => "unknown",
        }
    }
}

impl fmt::Display for VolatilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Time-to-zone estimates and volatility tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEstimate {
    pub estimated_entry_time: String,
    pub tp_eta: String,
    pub best_entry_zone: String,
    pub volatility: VolatilityTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tp_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Position-size tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskProfile {
    Conservative,
    #[default]
    Medium,
    Aggressive,
}

impl RiskProfile {
    /// Parse from string, case-insensitive.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "conservative" | "low" => Some(Self::Conservative),
            "medium" | "moderate" => Some(Self::Medium),
            "aggressive" | "high" => Some(Self::Aggressive),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RiskProfile::Conservative => "conservative",
            RiskProfile::Medium => "medium",
            RiskProfile::Aggressive => "aggressive",
        }
    }

    /// Suggested lot size for this tier.
    pub fn lot_size(&self) -> f64 {
        match self {
            RiskProfile::Conservative => 0.01,
            RiskProfile::Medium => 0.10,
            RiskProfile::Aggressive => 1.00,
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Position-size recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskDecision {
    pub risk_profile: RiskProfile,
    pub suggested_lot_size: f64,
    pub reason: String,
}

/// Every component's result for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    pub trend: TrendResult,
    pub structure: StructureResult,
    pub sentiment: SentimentResult,
    pub aggregated: AggregatedSignal,
    pub target: TargetResult,
    pub time_volatility: TimeEstimate,
    pub risk: RiskDecision,
}

/// Outcome of a full analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Ok,
    Error,
}

/// Signal record handed to the caller for caching, persistence or delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalReport {
    /// Unique report ID.
    pub id: Uuid,
    pub symbol: String,
    /// Unix timestamp (milliseconds) when generated.
    pub generated_at: i64,
    /// Which market-data provider answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<PipelineOutput>,
    pub status: ReportStatus,
    pub error_message: Option<String>,
}

impl SignalReport {
    /// Successful report.
    pub fn ok(
        symbol: &str,
        source_note: String,
        entry_price: f64,
        entry_zone: String,
        analysis: PipelineOutput,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.to_uppercase(),
            generated_at: chrono::Utc::now().timestamp_millis(),
            source_note: Some(source_note),
            entry_price: Some(entry_price),
            entry_zone: Some(entry_zone),
            analysis: Some(analysis),
            status: ReportStatus::Ok,
            error_message: None,
        }
    }

    /// Error envelope for a run that produced no analysis.
    pub fn failed(symbol: &str, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.to_uppercase(),
            generated_at: chrono::Utc::now().timestamp_millis(),
            source_note: None,
            entry_price: None,
            entry_zone: None,
            analysis: None,
            status: ReportStatus::Error,
            error_message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ReportStatus::Ok
    }

    /// Final fused bias, neutral for failed reports.
    pub fn final_bias(&self) -> Bias {
        self.analysis
            .as_ref()
            .map(|a| a.aggregated.final_bias)
            .unwrap_or_default()
    }

    /// Fused confidence, zero for failed reports.
    pub fn bias_confidence(&self) -> f64 {
        self.analysis
            .as_ref()
            .map(|a| a.aggregated.bias_confidence)
            .unwrap_or(0.0)
    }
}
