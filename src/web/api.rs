//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns a
//! `Response<Cursor<Vec<u8>>>` with JSON content.

use std::borrow::Cow;
use std::io::Cursor;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tiny_http::{Response, StatusCode};

use crate::aggregate::{self, CategoryStats, Statistics};
use crate::config;
use crate::history::{self, logger as history_logger};
use crate::model::display::category_color;
use crate::model::{ApiDescriptor, ApiPair, DuplicateGroup, Priority};
use crate::store::{self, Action, ScanError};

use super::{AppState, content_type_json, json_error};

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

/// Dashboard state for `GET /api/state`.
#[derive(Serialize)]
struct StateResponse<'a> {
    loading: bool,
    error: Option<&'a str>,
    last_scan_time: Option<String>,
    has_data: bool,
    statistics: Option<Statistics>,
    category_stats: CategoryStats,
    /// Tab order, "All Categories" first.
    categories: Vec<&'a str>,
    active_category: &'a str,
    search_term: &'a str,
    analytics_url: &'a str,
    /// Groups shown before "Show more".
    page_size: usize,
}

/// Filtered group list for `GET /api/duplicates`.
#[derive(Serialize)]
struct DuplicatesResponse<'a> {
    category: &'a str,
    search: &'a str,
    total: usize,
    groups: Vec<GroupResponse>,
}

#[derive(Debug, Serialize)]
struct GroupResponse {
    similarity_score_percentage: u32,
    priority: Priority,
    level: &'static str,
    color: &'static str,
    api_count: usize,
    pair_count: usize,
    /// Initial expand state in the group list.
    expanded: bool,
    pairs: Vec<PairResponse>,
}

#[derive(Debug, Serialize)]
struct PairResponse {
    source: ApiResponse,
    destination: ApiResponse,
    similarity_score: u32,
    explanation: Option<String>,
}

/// One API with display fallbacks already applied.
#[derive(Debug, Serialize)]
struct ApiResponse {
    name: String,
    version: String,
    description: String,
    description_preview: String,
    category: String,
    category_color: &'static str,
    openapi_version: String,
    contract_id: String,
}

#[derive(Serialize)]
struct BreakdownEntry {
    category: String,
    count: usize,
    color: &'static str,
}

/// Health API response.
#[derive(Serialize)]
struct HealthResponse {
    source: String,
    /// `None` when serving a saved file instead of the scan service.
    service_healthy: Option<bool>,
    config_exists: bool,
    history_enabled: bool,
    history_exists: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<Response<Cursor<Vec<u8>>>> {
    json_status(200, data)
}

fn json_status<T: Serialize>(status: u16, data: &T) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status)))
}

/// Read and decode a query parameter from a URL.
fn query_param(url: &str, key: &str) -> Option<String> {
    url.split('?').nth(1)?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        (k == key).then(|| decode_query_value(v))
    })
}

/// Decode a form-encoded value. Text that is not valid UTF-8 once decoded
/// is returned with only `+` replaced.
fn decode_query_value(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.replace('+', " "))
}

fn api_response(api: &ApiDescriptor) -> ApiResponse {
    let category = api.display_category().to_string();
    ApiResponse {
        name: api.display_name().to_string(),
        version: api.display_version().to_string(),
        description: api.display_description().to_string(),
        description_preview: api.description_preview(),
        category_color: category_color(&category),
        category,
        openapi_version: api.display_openapi_version().to_string(),
        contract_id: api.short_contract_id(),
    }
}

fn pair_response(pair: &ApiPair) -> Option<PairResponse> {
    let (source, destination) = (pair.source.as_ref()?, pair.destination.as_ref()?);
    Some(PairResponse {
        source: api_response(source),
        destination: api_response(destination),
        similarity_score: pair.effective_score(),
        explanation: pair.similarity_full_explanation_text.clone(),
    })
}

/// Render one group. The first group in the list and every high-similarity
/// group start expanded.
fn group_response(index: usize, group: &DuplicateGroup) -> GroupResponse {
    let priority = group.priority();
    GroupResponse {
        similarity_score_percentage: group.similarity_score_percentage,
        priority,
        level: priority.level(),
        color: priority.color(),
        api_count: group.api_count(),
        pair_count: group.pair_count(),
        expanded: index == 0 || priority == Priority::High,
        pairs: group.pairs.iter().filter_map(pair_response).collect(),
    }
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// Mark a scan as started and run it on a background thread.
///
/// The loading flag is set before this returns, so a second call made while
/// the thread is still fetching gets [`ScanError::InProgress`].
pub(crate) fn spawn_scan(state: &AppState) -> Result<JoinHandle<()>, ScanError> {
    store::lock(&state.store).begin_scan()?;

    let shared = Arc::clone(&state.store);
    let source = Arc::clone(&state.source);
    let history_config = state.config.history.clone();

    Ok(thread::spawn(move || {
        let origin = source.describe();
        log::info!("starting duplicates scan from {origin}");

        let started = Instant::now();
        let result = source.fetch();
        let elapsed = started.elapsed();

        let outcome = store::lock(&shared).finish_scan(result);
        match outcome {
            Ok(data) => history::record_scan(
                &history_config,
                &origin,
                Ok(aggregate::summarize(&data)),
                elapsed,
            ),
            Err(ScanError::Fetch(err)) => {
                history::record_scan(&history_config, &origin, Err(&err), elapsed)
            }
            Err(ScanError::InProgress) => {}
        }
    }))
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `POST /api/scan`: start a background scan.
pub fn post_scan(state: &AppState) -> Result<Response<Cursor<Vec<u8>>>> {
    match spawn_scan(state) {
        Ok(_) => json_status(202, &serde_json::json!({ "started": true })),
        Err(e) => Ok(json_error(409, &e.to_string())),
    }
}

/// `GET /api/state`: loading flag, error, statistics and tab counts.
pub fn get_state(state: &AppState) -> Result<Response<Cursor<Vec<u8>>>> {
    let guard = store::lock(&state.store);
    let view = guard.view();

    let resp = StateResponse {
        loading: view.loading,
        error: view.error,
        last_scan_time: view.last_scan_time.map(|t| t.to_rfc3339()),
        has_data: view.has_data,
        statistics: view.statistics,
        category_stats: view.category_stats,
        categories: aggregate::tab_categories(guard.data()),
        active_category: guard.active_category(),
        search_term: guard.search_term(),
        analytics_url: &state.config.dashboard.analytics_url,
        page_size: state.config.dashboard.page_size,
    };

    json_response(&resp)
}

/// `GET /api/duplicates?category=&search=`: visible groups, highest score
/// first. Given parameters become the store's active tab and search text.
pub fn get_duplicates(state: &AppState, url: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    let mut guard = store::lock(&state.store);
    if let Some(category) = query_param(url, "category").filter(|c| !c.is_empty()) {
        guard.dispatch(Action::SelectCategory(category));
    }
    if let Some(search) = query_param(url, "search") {
        guard.dispatch(Action::SetSearch(search));
    }

    let view = guard.view();
    let groups: Vec<GroupResponse> = view
        .visible_groups
        .iter()
        .filter(|group| group.is_renderable())
        .enumerate()
        .map(|(i, group)| group_response(i, group))
        .collect();

    let resp = DuplicatesResponse {
        category: guard.active_category(),
        search: guard.search_term(),
        total: groups.len(),
        groups,
    };

    json_response(&resp)
}

/// `GET /api/breakdown`: pair counts per category for the chart.
pub fn get_breakdown(state: &AppState) -> Result<Response<Cursor<Vec<u8>>>> {
    let guard = store::lock(&state.store);
    let entries: Vec<BreakdownEntry> = aggregate::compute_category_breakdown(guard.data())
        .into_iter()
        .map(|entry| BreakdownEntry {
            color: category_color(&entry.category),
            category: entry.category,
            count: entry.count,
        })
        .collect();

    json_response(&entries)
}

/// `POST /api/error/clear`: dismiss the error panel.
pub fn post_clear_error(state: &AppState) -> Result<Response<Cursor<Vec<u8>>>> {
    store::lock(&state.store).dispatch(Action::ClearError);
    json_response(&serde_json::json!({ "success": true }))
}

/// `POST /api/reset`: drop the current snapshot.
pub fn post_reset(state: &AppState) -> Result<Response<Cursor<Vec<u8>>>> {
    store::lock(&state.store).dispatch(Action::Reset);
    json_response(&serde_json::json!({ "success": true }))
}

/// `GET /api/health`: data source and local file status.
pub fn get_health(state: &AppState) -> Result<Response<Cursor<Vec<u8>>>> {
    let config_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);

    let history_exists = history_logger::scan_log_path()
        .map(|p| p.exists())
        .unwrap_or(false);

    let resp = HealthResponse {
        source: state.source.describe(),
        service_healthy: state.service.as_ref().map(|client| client.health_check()),
        config_exists,
        history_enabled: state.config.history.enabled,
        history_exists,
    };

    json_response(&resp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{DuplicatesSource, FetchError};
    use crate::config::schema::DupdashConfig;
    use crate::model::CategorizedDuplicates;

    struct StaticSource(Result<CategorizedDuplicates, FetchError>);

    impl DuplicatesSource for StaticSource {
        fn fetch(&self) -> Result<CategorizedDuplicates, FetchError> {
            self.0.clone()
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    fn state(result: Result<CategorizedDuplicates, FetchError>) -> AppState {
        let mut config = DupdashConfig::default();
        config.history.enabled = false;
        AppState::with_source(config, Arc::new(StaticSource(result)))
    }

    fn sample() -> CategorizedDuplicates {
        let pair = |a: &str, b: &str| ApiPair::new(ApiDescriptor::named(a), ApiDescriptor::named(b));
        let mut data = CategorizedDuplicates::new();
        data.insert(
            "Payment",
            vec![
                DuplicateGroup::new(60, vec![pair("Refunds", "Refund Service")]),
                DuplicateGroup::new(97, vec![pair("Pay", "Payments"), pair("Charge", "Charges")]),
            ],
        );
        data
    }

    #[test]
    fn query_param_decodes_values() {
        let url = "/api/duplicates?category=All%20Categories&search=order+history";
        assert_eq!(query_param(url, "category").as_deref(), Some("All Categories"));
        assert_eq!(query_param(url, "search").as_deref(), Some("order history"));
        assert_eq!(query_param(url, "missing"), None);
        assert_eq!(query_param("/api/duplicates", "search"), None);
        assert_eq!(query_param("/api/duplicates?search", "search").as_deref(), Some(""));
    }

    #[test]
    fn query_values_decode_utf8_and_keep_bad_escapes() {
        assert_eq!(decode_query_value("Zahlungs%C3%BCbersicht"), "Zahlungsübersicht");
        assert_eq!(decode_query_value("100%"), "100%");
        assert_eq!(decode_query_value("%zz"), "%zz");
        assert_eq!(decode_query_value("a+b%2Bc"), "a b+c");
        // decodes to invalid UTF-8
        assert_eq!(decode_query_value("%FF+x"), "%FF x");
    }

    #[test]
    fn group_response_applies_fallbacks_and_expansion() {
        let mut group = DuplicateGroup::new(90, vec![ApiPair::new(ApiDescriptor::default(), ApiDescriptor::named("B"))]);
        group.pairs.push(ApiPair::default());

        let first = group_response(0, &group);
        assert!(first.expanded);
        assert_eq!(first.level, "MEDIUM");
        assert_eq!(first.pair_count, 2);
        // pairs missing a side are not rendered
        assert_eq!(first.pairs.len(), 1);
        assert_eq!(first.pairs[0].source.name, "Unknown API");
        assert_eq!(first.pairs[0].source.category, "Uncategorized");

        assert!(!group_response(1, &group).expanded);
        let high = DuplicateGroup::new(95, vec![]);
        assert!(group_response(3, &high).expanded);
    }

    #[test]
    fn spawn_scan_loads_snapshot() {
        let state = state(Ok(sample()));
        spawn_scan(&state).unwrap().join().unwrap();

        let guard = store::lock(&state.store);
        assert!(guard.has_data());
        assert!(!guard.is_loading());
        assert_eq!(guard.view().statistics.unwrap().total_duplicates, 3);
    }

    #[test]
    fn spawn_scan_rejects_second_scan_while_loading() {
        let state = state(Ok(sample()));
        store::lock(&state.store).begin_scan().unwrap();
        assert!(matches!(spawn_scan(&state), Err(ScanError::InProgress)));
    }

    #[test]
    fn spawn_scan_records_failure() {
        let state = state(Err(FetchError::Network));
        spawn_scan(&state).unwrap().join().unwrap();

        let guard = store::lock(&state.store);
        assert_eq!(guard.error(), Some("Network error. Please check your connection."));
        assert!(!guard.is_loading());
    }

    #[test]
    fn state_response_serializes() {
        let state = state(Ok(sample()));
        spawn_scan(&state).unwrap().join().unwrap();
        let guard = store::lock(&state.store);
        let view = guard.view();
        let resp = StateResponse {
            loading: view.loading,
            error: view.error,
            last_scan_time: None,
            has_data: view.has_data,
            statistics: view.statistics,
            category_stats: view.category_stats,
            categories: aggregate::tab_categories(guard.data()),
            active_category: guard.active_category(),
            search_term: guard.search_term(),
            analytics_url: "https://example.test/report",
            page_size: 12,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"totalDuplicates\":3"));
        assert!(json.contains("\"category_stats\":{\"All Categories\":3,\"Payment\":3}"));
        assert!(json.contains("\"categories\":[\"All Categories\",\"Payment\"]"));
        assert!(json.contains("\"page_size\":12"));
    }
}
