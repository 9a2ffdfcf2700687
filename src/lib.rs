//! JetBuddy - signal-fusion engine turning candle series and headlines into trade signals

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

// Re-export commonly used types
pub use config::{Config, PipelineConfig};
pub use error::{AnalysisError, AppError, Result, SourceError};
pub use services::{AnalysisCache, SessionSchedule, SignalEngine};
pub use types::*;
