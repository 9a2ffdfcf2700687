use thiserror::Error;

/// Failures inside an analysis component.
///
/// These never cross a component boundary: each component renders them into
/// the `error` field of a neutral result instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Not enough data: need {needed} candles, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("No price movement detected")]
    NoPriceMovement,

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Numeric error: {0}")]
    Numeric(String),
}

/// Failures of an external collaborator (market data, news, classifier).
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Status(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("No data returned for {0}")]
    Empty(String),

    #[error("Missing API key for {0}")]
    MissingApiKey(&'static str),

    #[error("Ambiguous classifier output: {0}")]
    Ambiguous(String),
}

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("No market data for {symbol}: {note}")]
    NoMarketData { symbol: String, note: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
