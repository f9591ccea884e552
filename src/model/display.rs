//! Display defaults for incomplete scan records.
//!
//! The scan service omits fields freely. Rendering code never shows an empty
//! cell: each accessor here substitutes a fixed fallback string instead.

use std::sync::LazyLock;

use regex::Regex;

use super::ApiDescriptor;

pub const UNKNOWN_API: &str = "Unknown API";
pub const UNKNOWN: &str = "Unknown";
pub const NO_DESCRIPTION: &str = "No description available";
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Descriptions longer than this are cut in list views.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 100;

/// First `NN%` in an explanation string.
static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)%").expect("percentage regex must compile"));

/// Extract the first percentage figure from free text.
pub fn extract_percentage(text: &str) -> Option<u32> {
    PERCENT_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl ApiDescriptor {
    pub fn display_name(&self) -> &str {
        present(self.name.as_deref()).unwrap_or(UNKNOWN_API)
    }

    pub fn display_version(&self) -> &str {
        present(self.version.as_deref()).unwrap_or(UNKNOWN)
    }

    pub fn display_description(&self) -> &str {
        present(self.description.as_deref()).unwrap_or(NO_DESCRIPTION)
    }

    pub fn display_category(&self) -> &str {
        present(self.category.as_deref()).unwrap_or(UNCATEGORIZED)
    }

    pub fn display_openapi_version(&self) -> &str {
        present(self.openapi_version.as_deref()).unwrap_or(UNKNOWN)
    }

    /// Description cut to [`DESCRIPTION_PREVIEW_CHARS`] characters.
    pub fn description_preview(&self) -> String {
        truncate_text(self.display_description(), DESCRIPTION_PREVIEW_CHARS)
    }

    /// Last path segment of the contract id without its `.json` suffix,
    /// e.g. `contracts/payments/pay-v2.json` → `pay-v2`.
    pub fn short_contract_id(&self) -> String {
        let id = self
            .contract_id
            .as_deref()
            .and_then(|id| id.rsplit('/').next())
            .map(|segment| segment.replace(".json", ""))
            .unwrap_or_default();
        if id.is_empty() { UNKNOWN.to_string() } else { id }
    }
}

/// Cut `text` to `max_chars` characters, appending `...` when shortened.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Tab and chart colour for a business category. Unknown categories and
/// the "All Categories" tab share the grey fallback.
pub fn category_color(category: &str) -> &'static str {
    match category {
        "Authentication" => "#3b82f6",
        "User Management" => "#8b5cf6",
        "Payment" => "#10b981",
        "Testing" => "#f59e0b",
        "Content Management" => "#ef4444",
        "Order Management" => "#06b6d4",
        _ => "#6b7280",
    }
}
