pub mod cache;
pub mod pipeline;
pub mod schedule;
pub mod signals;
pub mod sweep;

pub use cache::AnalysisCache;
pub use pipeline::{entry_point, SignalEngine};
pub use schedule::{parse_session_times, SessionSchedule};
pub use sweep::sweep;
