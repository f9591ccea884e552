/// Configuration system for dupdash.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::DupdashConfig::default()`]
/// 2. **User global config**: `~/.dupdash/config.toml`
/// 3. **Project local config**: `.dupdash.toml` in the current working directory
/// 4. **Environment variables**: `DUPDASH_*` overrides (highest precedence)
///
/// Later layers override earlier ones at the key level: a project file that
/// only sets `[api] base_url` keeps every other value from the global file.
///
/// # Usage
///
/// ```rust,ignore
/// use dupdash::config;
///
/// let cfg = config::load();
/// let client = ScanClient::from_config(&cfg.api);
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::DupdashConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved dupdash configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. Unreadable or malformed files are skipped with a warning so a bad
/// config never blocks a scan.
pub fn load() -> DupdashConfig {
    let mut merged = defaults_value();

    for path in [global_config_path(), project_config_path()]
        .into_iter()
        .flatten()
    {
        if let Some(layer) = load_toml_file(&path) {
            merge_toml(&mut merged, layer);
        }
    }

    let mut config: DupdashConfig = match merged.try_into() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("ignoring config files: {e}");
            DupdashConfig::default()
        }
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Built-in defaults as a TOML value tree.
fn defaults_value() -> toml::Value {
    toml::Value::try_from(DupdashConfig::default())
        .unwrap_or_else(|_| toml::Value::Table(toml::map::Map::new()))
}

/// Read a TOML file as a raw value tree. Missing files yield `None`
/// silently; malformed ones yield `None` with a warning.
fn load_toml_file(path: &Path) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("ignoring malformed config {}: {e}", path.display());
            None
        }
    }
}

/// Deep-merge `overlay` into `base`. Tables merge key by key; any other
/// value in the overlay replaces the base value.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.dupdash/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".dupdash").join("config.toml"))
}

/// Path to the project local config: `.dupdash.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".dupdash.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `DUPDASH_API_URL`: scan service base URL
/// - `DUPDASH_SCAN_ENDPOINT`: scan endpoint path
/// - `DUPDASH_TIMEOUT_MS`: request timeout
/// - `DUPDASH_ANALYTICS_URL`: embedded analytics report URL
/// - `DUPDASH_BIND`: web dashboard bind address
/// - `DUPDASH_HISTORY`: scan history log (`1`/`true`/`yes`/`on`)
///
/// `lookup` abstracts `std::env::var` so tests can inject values.
fn apply_env_overrides(config: &mut DupdashConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("DUPDASH_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Some(val) = lookup("DUPDASH_SCAN_ENDPOINT")
        && !val.is_empty()
    {
        config.api.scan_endpoint = val;
    }
    if let Some(val) = lookup("DUPDASH_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Some(val) = lookup("DUPDASH_ANALYTICS_URL")
        && !val.is_empty()
    {
        config.dashboard.analytics_url = val;
    }
    if let Some(val) = lookup("DUPDASH_BIND")
        && !val.is_empty()
    {
        config.dashboard.bind_addr = val;
    }
    if let Some(val) = lookup("DUPDASH_HISTORY") {
        config.history.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
pub(crate) fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.dupdash/config.toml`.
///
/// Creates the `~/.dupdash/` directory if it doesn't exist. Returns an error
/// if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;
    init_config_at(&path, force)?;
    Ok(path)
}

fn init_config_at(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }

    fs::write(path, DupdashConfig::default_toml()).context("failed to write config file")?;
    Ok(())
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `api.base_url`. The value is parsed according
/// to the type of the existing key.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;
    set_config_value_at(&path, key, value)
}

fn set_config_value_at(path: &Path, key: &str, value: &str) -> Result<()> {
    // Start from defaults so every schema key is addressable even when the
    // file only sets a few of them.
    let mut root = defaults_value();
    if path.exists() {
        let content = fs::read_to_string(path).context("failed to read config file")?;
        let file_value: toml::Value =
            toml::from_str(&content).context("failed to parse config as TOML value")?;
        merge_toml(&mut root, file_value);
    }

    set_toml_value(&mut root, key, value)?;

    // Reject values the schema cannot hold before touching the file.
    let _: DupdashConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if key.is_empty() || parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("empty config key");
    }

    // Navigate to the parent table
    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::Array(_)) => {
            let items: Vec<toml::Value> = raw_value
                .split(',')
                .map(|s| toml::Value::String(s.trim().to_string()))
                .collect();
            toml::Value::Array(items)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let owned: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| {
            owned
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = DupdashConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("DUPDASH_API_URL", "https://scanner.example"),
                ("DUPDASH_TIMEOUT_MS", "5000"),
                ("DUPDASH_BIND", "0.0.0.0:8000"),
                ("DUPDASH_HISTORY", "off"),
            ]),
        );
        assert_eq!(config.api.base_url, "https://scanner.example");
        assert_eq!(config.api.timeout_ms, 5000);
        assert_eq!(config.dashboard.bind_addr, "0.0.0.0:8000");
        assert!(!config.history.enabled);
    }

    #[test]
    fn env_overrides_ignore_empty_and_invalid() {
        let mut config = DupdashConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[("DUPDASH_API_URL", ""), ("DUPDASH_TIMEOUT_MS", "soon")]),
        );
        assert_eq!(config, DupdashConfig::default());
    }

    #[test]
    fn merge_keeps_untouched_keys() {
        let mut base = defaults_value();
        let overlay: toml::Value = toml::from_str(
            r#"
[api]
timeout_ms = 1000
"#,
        )
        .unwrap();
        merge_toml(&mut base, overlay);

        let config: DupdashConfig = base.try_into().unwrap();
        assert_eq!(config.api.timeout_ms, 1000);
        assert_eq!(config.api.scan_endpoint, "/api-duplicates-scan");
    }

    #[test]
    fn set_toml_value_updates_string() {
        let mut root = defaults_value();
        set_toml_value(&mut root, "api.base_url", "https://x.example").unwrap();
        assert_eq!(root["api"]["base_url"].as_str(), Some("https://x.example"));
    }

    #[test]
    fn set_toml_value_updates_bool() {
        let mut root = defaults_value();
        set_toml_value(&mut root, "dashboard.open_browser", "no").unwrap();
        assert_eq!(root["dashboard"]["open_browser"].as_bool(), Some(false));
    }

    #[test]
    fn set_toml_value_updates_integer() {
        let mut root = defaults_value();
        set_toml_value(&mut root, "api.timeout_ms", "45000").unwrap();
        assert_eq!(root["api"]["timeout_ms"].as_integer(), Some(45000));
    }

    #[test]
    fn set_toml_value_rejects_unknown_keys() {
        let mut root = defaults_value();
        assert!(set_toml_value(&mut root, "nonexistent.key", "value").is_err());
        assert!(set_toml_value(&mut root, "api.nope", "value").is_err());
        assert!(set_toml_value(&mut root, "", "value").is_err());
    }

    #[test]
    fn set_toml_value_rejects_bad_integer() {
        let mut root = defaults_value();
        assert!(set_toml_value(&mut root, "api.timeout_ms", "fast").is_err());
    }

    #[test]
    fn set_config_value_at_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        set_config_value_at(&path, "api.base_url", "https://scan.example").unwrap();
        set_config_value_at(&path, "dashboard.page_size", "20").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let config: DupdashConfig = toml::from_str(&content).unwrap();
        assert_eq!(config.api.base_url, "https://scan.example");
        assert_eq!(config.dashboard.page_size, 20);
    }

    #[test]
    fn set_config_value_at_rejects_negative_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(set_config_value_at(&path, "dashboard.page_size", "-3").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn init_config_at_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        init_config_at(&path, false).unwrap();
        assert!(init_config_at(&path, false).is_err());
        init_config_at(&path, true).unwrap();

        let config: DupdashConfig = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config, DupdashConfig::default());
    }

    #[test]
    fn show_effective_config_returns_toml() {
        let toml_str = show_effective_config().unwrap();
        let _: DupdashConfig = toml::from_str(&toml_str).unwrap();
    }
}
