use std::sync::Arc;

use jetbuddy::services::sweep;
use jetbuddy::{AnalysisCache, Config, SessionSchedule, SignalEngine};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jetbuddy=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let engine = Arc::new(SignalEngine::from_config(&config));
    let cache = Arc::new(AnalysisCache::new(config.cache_ttl()));

    // One-shot mode: analyze the symbols given on the command line.
    let symbols: Vec<String> = std::env::args().skip(1).collect();
    if !symbols.is_empty() {
        let reports = sweep(engine, cache, &symbols).await;
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    if config.watchlist.is_empty() {
        anyhow::bail!("WATCHLIST is empty and no symbols were given");
    }

    let schedule = SessionSchedule::new(config.session_times.clone());
    info!(
        "Starting JetBuddy for {} symbols, sessions at {:?}",
        config.watchlist.len(),
        schedule.times()
    );

    loop {
        let now = chrono::Utc::now();
        let Some(next) = schedule.next_after(now) else {
            anyhow::bail!("no session times configured");
        };
        let wait = schedule.until_next(now).unwrap_or_default();
        info!("Next sweep at {}", next);
        tokio::time::sleep(wait).await;

        let reports = sweep(engine.clone(), cache.clone(), &config.watchlist).await;
        for report in reports.iter().filter(|r| r.is_ok()) {
            info!(
                "{}: {} ({:.2})",
                report.symbol,
                report.final_bias(),
                report.bias_confidence()
            );
        }
        cache.cleanup();
        if reports.iter().all(|r| !r.is_ok()) {
            warn!("Every symbol failed in this sweep");
        }
    }
}
