//! Scan history reporter: totals, latency, and daily trend.

use std::collections::HashMap;

use serde::Serialize;

use crate::history::logger::{self, ScanLogEntry};

// ---------------------------------------------------------------------------
// Aggregated report
// ---------------------------------------------------------------------------

/// Summary statistics for `dupdash history`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryReport {
    pub total_scans: usize,
    pub successful: usize,
    pub failed: usize,
    pub avg_latency_ms: f64,
    /// Most recent entry, successful or not.
    pub last_scan: Option<ScanLogEntry>,
    /// Failure counts keyed by error kind, most frequent first.
    pub failure_kinds: Vec<(String, usize)>,
    pub trends: Vec<TrendEntry>,
}

impl HistoryReport {
    /// Percentage of scans that succeeded, 0.0 when there are none.
    pub fn success_rate(&self) -> f64 {
        if self.total_scans == 0 {
            0.0
        } else {
            (self.successful as f64 / self.total_scans as f64) * 100.0
        }
    }
}

/// A single day in the scan trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendEntry {
    pub date: String,
    pub scans: usize,
    pub failures: usize,
    /// Group count of the last successful scan that day.
    pub groups: usize,
    pub total_pairs: usize,
}

// ---------------------------------------------------------------------------
// Report computation
// ---------------------------------------------------------------------------

/// Build the report from the scan log, optionally limited to `days` days.
pub fn compute_report(days: Option<u32>) -> HistoryReport {
    let entries = logger::read_entries_since_days(days);
    build_report(&entries)
}

/// Build the report from entries in log (chronological) order.
pub fn build_report(entries: &[ScanLogEntry]) -> HistoryReport {
    let total_scans = entries.len();
    let successful = entries.iter().filter(|e| e.success).count();

    let avg_latency_ms = if total_scans == 0 {
        0.0
    } else {
        entries.iter().map(|e| e.latency_ms as f64).sum::<f64>() / total_scans as f64
    };

    HistoryReport {
        total_scans,
        successful,
        failed: total_scans - successful,
        avg_latency_ms,
        last_scan: entries.last().cloned(),
        failure_kinds: failure_kinds(entries),
        trends: build_trends(entries),
    }
}

fn failure_kinds(entries: &[ScanLogEntry]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries.iter().filter(|e| !e.success) {
        let kind = entry.error_kind.as_deref().unwrap_or("unknown");
        *counts.entry(kind).or_default() += 1;
    }

    let mut kinds: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(kind, count)| (kind.to_string(), count))
        .collect();
    kinds.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    kinds
}

// ---------------------------------------------------------------------------
// Trends
// ---------------------------------------------------------------------------

/// Group entries by date (YYYY-MM-DD), ascending.
pub fn build_trends(entries: &[ScanLogEntry]) -> Vec<TrendEntry> {
    let mut daily: HashMap<String, Vec<&ScanLogEntry>> = HashMap::new();
    for entry in entries {
        // RFC 3339: the first 10 chars are the date
        let date = entry.timestamp.get(..10).unwrap_or("unknown").to_string();
        daily.entry(date).or_default().push(entry);
    }

    let mut trends: Vec<TrendEntry> = daily
        .into_iter()
        .map(|(date, group)| {
            let last_ok = group.iter().rev().find(|e| e.success);
            TrendEntry {
                date,
                scans: group.len(),
                failures: group.iter().filter(|e| !e.success).count(),
                groups: last_ok.map_or(0, |e| e.groups),
                total_pairs: last_ok.map_or(0, |e| e.total_pairs),
            }
        })
        .collect();

    trends.sort_by(|a, b| a.date.cmp(&b.date));
    trends
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
