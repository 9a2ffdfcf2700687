use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::types::SignalReport;

/// Longest TTL an entry can get; larger values are clamped.
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Latest signal report per symbol, each entry expiring after a TTL.
pub struct AnalysisCache {
    reports: DashMap<String, CachedReport>,
    ttl: Duration,
}

struct CachedReport {
    report: SignalReport,
    expires_at: Instant,
}

fn cache_key(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

impl AnalysisCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            reports: DashMap::new(),
            ttl,
        }
    }

    /// Fresh report for `symbol`, if any. Expired entries are dropped on read.
    pub fn get(&self, symbol: &str) -> Option<SignalReport> {
        let key = cache_key(symbol);
        if let Some(entry) = self.reports.get(&key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.report.clone());
            }
        }
        self.reports
            .remove_if(&key, |_, entry| entry.expires_at <= Instant::now());
        None
    }

    /// Store `report` under its symbol, replacing any previous one.
    pub fn insert(&self, report: SignalReport) {
        self.insert_with_ttl(report, self.ttl);
    }

    pub fn insert_with_ttl(&self, report: SignalReport, ttl: Duration) {
        self.reports.insert(
            cache_key(&report.symbol),
            CachedReport {
                report,
                expires_at: Instant::now() + ttl.min(MAX_CACHE_TTL),
            },
        );
    }

    pub fn remove(&self, symbol: &str) -> Option<SignalReport> {
        self.reports
            .remove(&cache_key(symbol))
            .map(|(_, entry)| entry.report)
    }

    /// All fresh reports, sorted by symbol.
    pub fn snapshot(&self) -> Vec<SignalReport> {
        let now = Instant::now();
        let mut reports: Vec<SignalReport> = self
            .reports
            .iter()
            .filter(|e| e.expires_at > now)
            .map(|e| e.report.clone())
            .collect();
        reports.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        reports
    }

    /// Remove all expired entries.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.reports.retain(|_, entry| entry.expires_at > now);
    }

    pub fn clear(&self) {
        self.reports.clear();
    }

    /// Number of entries (including expired).
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
