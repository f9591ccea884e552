/// Data fetch client for the duplicate-scan service.
///
/// Talks to the scan service with the synchronous `ureq` HTTP client:
///
/// - **Scan**: `GET {base_url}{scan_endpoint}` returning the categorized
///   duplicate groups as JSON.
/// - **Health check**: `GET {base_url}{health_endpoint}`, healthy on 200.
///
/// Failures are normalized into [`FetchError`]. A JSON file can stand in
/// for the service through [`FileSource`], which is how offline reports and
/// tests feed the same pipeline.
pub mod error;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use error::FetchError;

/// Upper bound for a health check, so a stalled service cannot hold the
/// dashboard's request loop for the full scan timeout.
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

use crate::config::schema::ApiConfig;
use crate::model::CategorizedDuplicates;

// ---------------------------------------------------------------------------
// Source abstraction
// ---------------------------------------------------------------------------

/// Anything that can produce a fresh scan result.
pub trait DuplicatesSource {
    /// Fetch a complete result set. Each call is an independent scan.
    fn fetch(&self) -> Result<CategorizedDuplicates, FetchError>;

    /// Short human-readable origin, for logs and history entries.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Synchronous scan service client.
///
/// Created from an [`ApiConfig`]; holds no connection state, so it can be
/// cloned into a background scan thread.
#[derive(Debug, Clone)]
pub struct ScanClient {
    base_url: String,
    scan_endpoint: String,
    health_endpoint: String,
    timeout: Duration,
}

impl ScanClient {
    /// Build a client from the resolved config.
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            scan_endpoint: normalize_endpoint(&config.scan_endpoint),
            health_endpoint: normalize_endpoint(&config.health_endpoint),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Full scan URL.
    pub fn scan_url(&self) -> String {
        format!("{}{}", self.base_url, self.scan_endpoint)
    }

    /// Full health-check URL.
    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url, self.health_endpoint)
    }

    /// Run one scan and decode the categorized result.
    pub fn scan_api_duplicates(&self) -> Result<CategorizedDuplicates, FetchError> {
        let url = self.scan_url();
        log::debug!("[api request] GET {url}");

        let response = ureq::get(&url)
            .timeout(self.timeout)
            .set("Content-Type", "application/json")
            .call()
            .map_err(|e| {
                let err = FetchError::from(e);
                log::error!("[api response error] {url}: {err}");
                err
            })?;

        log::debug!("[api response] {} {url}", response.status());

        response
            .into_json::<CategorizedDuplicates>()
            .map_err(|e| {
                let err = FetchError::from_body_error(&e);
                log::error!("[api response error] {url}: {err}");
                err
            })
    }

    /// Timeout applied to health checks: the request timeout, capped at
    /// [`HEALTH_CHECK_TIMEOUT`].
    pub fn health_timeout(&self) -> Duration {
        self.timeout.min(HEALTH_CHECK_TIMEOUT)
    }

    /// Check whether the service answers its health endpoint with 200.
    ///
    /// Never fails: any error is logged and reported as unhealthy.
    pub fn health_check(&self) -> bool {
        let url = self.health_url();
        match ureq::get(&url).timeout(self.health_timeout()).call() {
            Ok(response) => response.status() == 200,
            Err(e) => {
                log::warn!("[api] health check failed: {}", FetchError::from(e));
                false
            }
        }
    }
}

impl DuplicatesSource for ScanClient {
    fn fetch(&self) -> Result<CategorizedDuplicates, FetchError> {
        self.scan_api_duplicates()
    }

    fn describe(&self) -> String {
        self.scan_url()
    }
}

/// Ensure an endpoint path starts with exactly one `/`.
fn normalize_endpoint(endpoint: &str) -> String {
    format!("/{}", endpoint.trim_start_matches('/'))
}

// ---------------------------------------------------------------------------
// File source
// ---------------------------------------------------------------------------

/// Reads a previously saved scan result from a JSON file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DuplicatesSource for FileSource {
    fn fetch(&self) -> Result<CategorizedDuplicates, FetchError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            FetchError::Unknown(format!("failed to read {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            FetchError::Unknown(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_from_default_config() {
        let client = ScanClient::from_config(&ApiConfig::default());
        assert_eq!(client.scan_url(), "http://127.0.0.1:8080/api-duplicates-scan");
        assert_eq!(client.health_url(), "http://127.0.0.1:8080/health");
        assert_eq!(client.timeout, Duration::from_secs(30));
        assert_eq!(client.health_timeout(), HEALTH_CHECK_TIMEOUT);
    }

    #[test]
    fn short_request_timeout_also_bounds_health_check() {
        let config = ApiConfig {
            timeout_ms: 500,
            ..ApiConfig::default()
        };
        let client = ScanClient::from_config(&config);
        assert_eq!(client.health_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn client_normalizes_slashes() {
        let config = ApiConfig {
            base_url: "https://scanner.example/".into(),
            scan_endpoint: "api-duplicates-scan".into(),
            health_endpoint: "//health".into(),
            timeout_ms: 1000,
        };
        let client = ScanClient::from_config(&config);
        assert_eq!(client.scan_url(), "https://scanner.example/api-duplicates-scan");
        assert_eq!(client.health_url(), "https://scanner.example/health");
    }

    #[test]
    fn file_source_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        fs::write(
            &path,
            r#"{"Payment": [{"similarity_score_percentage": 97, "pairs": []}]}"#,
        )
        .unwrap();

        let source = FileSource::new(&path);
        let data = source.fetch().unwrap();
        assert_eq!(data.get("Payment").unwrap().len(), 1);
        assert!(source.describe().starts_with("file:"));
    }

    #[test]
    fn file_source_reports_missing_file() {
        let source = FileSource::new("/definitely/not/here.json");
        let err = source.fetch().unwrap_err();
        assert!(matches!(err, FetchError::Unknown(ref msg) if msg.contains("failed to read")));
    }

    #[test]
    fn file_source_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        fs::write(&path, "not json").unwrap();

        let err = FileSource::new(&path).fetch().unwrap_err();
        assert!(matches!(err, FetchError::Unknown(ref msg) if msg.contains("failed to parse")));
    }
}
