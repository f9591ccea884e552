use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::aggregate::ScanSummary;
use crate::client::FetchError;

// ---------------------------------------------------------------------------
// Scan log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in the scan history log (`~/.dupdash/scan-log.jsonl`).
///
/// One line per scan attempt, successful or not. Used by the reporter for
/// `dupdash history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanLogEntry {
    pub timestamp: String,
    /// Where the data came from: scan URL or `file:<path>`.
    pub source: String,
    pub success: bool,
    #[serde(default)]
    pub categories: usize,
    #[serde(default)]
    pub groups: usize,
    #[serde(default)]
    pub total_pairs: usize,
    pub latency_ms: u64,
    /// Error kind (`network`, `timeout`, ...) for failed scans.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_kind: Option<String>,
    /// User-facing error message for failed scans.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl ScanLogEntry {
    pub fn success(source: &str, summary: ScanSummary, latency_ms: u64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            source: source.to_string(),
            success: true,
            categories: summary.categories,
            groups: summary.groups,
            total_pairs: summary.total_pairs,
            latency_ms,
            error_kind: None,
            error: None,
        }
    }

    pub fn failure(source: &str, err: &FetchError, latency_ms: u64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            source: source.to_string(),
            success: false,
            categories: 0,
            groups: 0,
            total_pairs: 0,
            latency_ms,
            error_kind: Some(err.kind().to_string()),
            error: Some(err.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging functions
// ---------------------------------------------------------------------------

/// Append a scan entry to the history log.
///
/// Best-effort. Failures are logged at debug and otherwise ignored.
pub fn log_scan(entry: &ScanLogEntry) {
    let Some(path) = scan_log_path() else {
        return;
    };
    if let Err(e) = append_entry(&path, entry) {
        log::debug!("could not write scan history: {e}");
    }
}

// ---------------------------------------------------------------------------
// Reading log entries
// ---------------------------------------------------------------------------

/// Read all scan entries from `~/.dupdash/scan-log.jsonl`.
pub fn read_all_entries() -> Vec<ScanLogEntry> {
    scan_log_path()
        .map(|path| read_entries(&path))
        .unwrap_or_default()
}

/// Read scan entries filtered to the last `days` days (all when `None`).
pub fn read_entries_since_days(days: Option<u32>) -> Vec<ScanLogEntry> {
    filter_since_days(read_all_entries(), days)
}

/// Keep entries newer than `days` days ago.
pub fn filter_since_days(entries: Vec<ScanLogEntry>, days: Option<u32>) -> Vec<ScanLogEntry> {
    let Some(days) = days else {
        return entries;
    };

    let cutoff = (Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();
    entries
        .into_iter()
        .filter(|e| e.timestamp >= cutoff)
        .collect()
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Read entries from a JSONL file.
///
/// Silently skips malformed lines. Returns an empty vec if the file does not
/// exist or cannot be read.
pub fn read_entries(path: &Path) -> Vec<ScanLogEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<ScanLogEntry>(&line).ok())
        .collect()
}

/// Append one entry as a JSON line, creating parent directories.
pub fn append_entry(path: &Path, entry: &ScanLogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Return the path to the scan log file.
pub fn scan_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".dupdash").join("scan-log.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
