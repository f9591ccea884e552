/// Scan history: one JSONL line per scan attempt, plus the reporter that
/// summarizes it for `dupdash history`.
pub mod logger;
pub mod reporter;

use std::time::Duration;

use crate::aggregate::ScanSummary;
use crate::client::FetchError;
use crate::config::schema::HistoryConfig;

pub use logger::ScanLogEntry;
pub use reporter::HistoryReport;

/// Record the outcome of one scan, if history is enabled.
pub fn record_scan(
    config: &HistoryConfig,
    source: &str,
    outcome: Result<ScanSummary, &FetchError>,
    elapsed: Duration,
) {
    if !config.enabled {
        return;
    }

    let latency_ms = elapsed.as_millis() as u64;
    let entry = match outcome {
        Ok(summary) => ScanLogEntry::success(source, summary, latency_ms),
        Err(err) => ScanLogEntry::failure(source, err, latency_ms),
    };
    logger::log_scan(&entry);
}
