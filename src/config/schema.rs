/// Configuration schema and defaults for dupdash.
///
/// Defines the TOML-serializable configuration structure with the
/// `[api]`, `[dashboard]`, and `[history]` sections.
///
/// Every field has a sensible built-in default. Users only need to set the
/// values they want to override.
use serde::{Deserialize, Serialize};

/// Default scan service base URL.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Default analytics report embedded in the dashboard.
pub const DEFAULT_ANALYTICS_URL: &str =
    "https://lookerstudio.google.com/embed/reporting/1395c73f-e27d-44db-99a4-88e1344147e8/page/H7sNF";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level dupdash configuration.
///
/// Maps directly to the `~/.dupdash/config.toml` and `.dupdash.toml` file
/// schemas. All sections and fields are optional; missing values fall back
/// to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DupdashConfig {
    pub api: ApiConfig,
    pub dashboard: DashboardConfig,
    pub history: HistoryConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Scan service connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the duplicate-scan service.
    pub base_url: String,
    /// Path of the scan endpoint, relative to `base_url`.
    pub scan_endpoint: String,
    /// Path of the health endpoint, relative to `base_url`.
    pub health_endpoint: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            scan_endpoint: "/api-duplicates-scan".to_string(),
            health_endpoint: "/health".to_string(),
            timeout_ms: 30_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Presentation settings shared by the CLI and the web dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Address the web dashboard binds to.
    pub bind_addr: String,
    /// URL of the embedded analytics report.
    pub analytics_url: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
    /// Groups per page in list views. `0` shows every group.
    pub page_size: usize,
    /// Pairs shown per group before collapsing the rest.
    pub pairs_preview: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9747".to_string(),
            analytics_url: DEFAULT_ANALYTICS_URL.to_string(),
            open_browser: true,
            page_size: 12,
            pairs_preview: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// [history]
// ---------------------------------------------------------------------------

/// Scan history log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Append one JSONL entry per scan to `~/.dupdash/scan-log.jsonl`.
    pub enabled: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl DupdashConfig {
    /// The annotated TOML written by `dupdash config init`.
    pub fn default_toml() -> String {
        r#"# dupdash Configuration
# Duplicate APIs Detection dashboard
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (DUPDASH_*)
#   2. Project config (.dupdash.toml in current directory)
#   3. User global config (~/.dupdash/config.toml)
#   4. Built-in defaults

[api]
base_url = "http://127.0.0.1:8080"      # or DUPDASH_API_URL
scan_endpoint = "/api-duplicates-scan"
health_endpoint = "/health"
timeout_ms = 30000

[dashboard]
bind_addr = "127.0.0.1:9747"
analytics_url = "https://lookerstudio.google.com/embed/reporting/1395c73f-e27d-44db-99a4-88e1344147e8/page/H7sNF"
open_browser = true
page_size = 12                           # Groups per page (0 shows all)
pairs_preview = 5                        # Pairs shown per group before "N more"

[history]
enabled = true                           # ~/.dupdash/scan-log.jsonl
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
