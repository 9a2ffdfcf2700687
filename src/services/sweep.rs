//! Concurrent watchlist sweep: one task per symbol, results into the cache.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::cache::AnalysisCache;
use super::pipeline::SignalEngine;
use crate::types::SignalReport;

/// Analyze every symbol concurrently and cache each report.
///
/// Failed runs are cached as error reports. Reports come back in input order.
pub async fn sweep(
    engine: Arc<SignalEngine>,
    cache: Arc<AnalysisCache>,
    symbols: &[String],
) -> Vec<SignalReport> {
    info!("Sweeping {} symbols", symbols.len());

    let handles: Vec<_> = symbols
        .iter()
        .map(|symbol| {
            let key = symbol_key(symbol);
            let engine = engine.clone();
            let symbol = symbol.clone();
            let handle = tokio::spawn(async move { engine.run_full_analysis(&symbol).await });
            (key, handle)
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for (symbol, handle) in handles {
        let report = match handle.await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                warn!("Analysis failed for {}: {}", symbol, e);
                SignalReport::failed(&symbol, e.to_string())
            }
            Err(e) => {
                error!("Analysis task for {} panicked: {}", symbol, e);
                SignalReport::failed(&symbol, format!("analysis task failed: {}", e))
            }
        };
        cache.insert(report.clone());
        reports.push(report);
    }

    let ok = reports.iter().filter(|r| r.is_ok()).count();
    info!("Sweep done: {} ok, {} failed", ok, reports.len() - ok);
    reports
}

fn symbol_key(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}
