//! Dashboard state container.
//!
//! Holds the one in-memory scan snapshot plus the UI state around it
//! (loading flag, last error, last scan time, active tab, search text).
//! State changes go through [`DashboardStore::dispatch`]; rendering code
//! reads a derived [`DashboardView`].
//!
//! The snapshot is an `Arc` that is swapped whole when a scan completes, so
//! a reader holding the previous snapshot keeps a consistent copy.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::aggregate::{self, CategoryCount, CategoryStats, Statistics};
use crate::client::{DuplicatesSource, FetchError};
use crate::filter;
use crate::model::{ALL_CATEGORIES, CategorizedDuplicates, DuplicateGroup};

/// State transitions.
#[derive(Debug, Clone)]
pub enum Action {
    ScanStarted,
    ScanSucceeded {
        data: Arc<CategorizedDuplicates>,
        at: DateTime<Local>,
    },
    ScanFailed(String),
    ClearError,
    /// Drop the snapshot, error and scan time. Tab and search are kept.
    Reset,
    SelectCategory(String),
    SetSearch(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("scan already in progress")]
    InProgress,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Clone)]
pub struct DashboardStore {
    data: Option<Arc<CategorizedDuplicates>>,
    loading: bool,
    error: Option<String>,
    last_scan_time: Option<DateTime<Local>>,
    active_category: String,
    search_term: String,
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            last_scan_time: None,
            active_category: ALL_CATEGORIES.to_string(),
            search_term: String::new(),
        }
    }
}

impl DashboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one state transition.
    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::ScanStarted => {
                self.loading = true;
                self.error = None;
            }
            Action::ScanSucceeded { data, at } => {
                self.data = Some(data);
                self.last_scan_time = Some(at);
                self.loading = false;
            }
            Action::ScanFailed(message) => {
                self.error = Some(message);
                self.loading = false;
            }
            Action::ClearError => self.error = None,
            Action::Reset => {
                self.data = None;
                self.error = None;
                self.last_scan_time = None;
            }
            Action::SelectCategory(category) => self.active_category = category,
            Action::SetSearch(term) => self.search_term = term,
        }
    }

    /// Mark a scan as started, refusing while another one is outstanding.
    pub fn begin_scan(&mut self) -> Result<(), ScanError> {
        if self.loading {
            return Err(ScanError::InProgress);
        }
        self.dispatch(Action::ScanStarted);
        Ok(())
    }

    /// Record the outcome of a scan started with [`begin_scan`](Self::begin_scan).
    pub fn finish_scan(
        &mut self,
        result: Result<CategorizedDuplicates, FetchError>,
    ) -> Result<Arc<CategorizedDuplicates>, ScanError> {
        match result {
            Ok(data) => {
                let summary = aggregate::summarize(&data);
                log::info!(
                    "scan completed: {} categories, {} groups, {} pairs",
                    summary.categories,
                    summary.groups,
                    summary.total_pairs
                );
                let snapshot = Arc::new(data);
                self.dispatch(Action::ScanSucceeded {
                    data: Arc::clone(&snapshot),
                    at: Local::now(),
                });
                Ok(snapshot)
            }
            Err(err) => {
                log::error!("scan failed: {err}");
                self.dispatch(Action::ScanFailed(err.to_string()));
                Err(ScanError::Fetch(err))
            }
        }
    }

    /// Run a complete scan synchronously.
    pub fn scan(
        &mut self,
        source: &dyn DuplicatesSource,
    ) -> Result<Arc<CategorizedDuplicates>, ScanError> {
        self.begin_scan()?;
        log::info!("starting duplicates scan from {}", source.describe());
        let result = source.fetch();
        self.finish_scan(result)
    }

    pub fn data(&self) -> Option<&CategorizedDuplicates> {
        self.data.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_scan_time(&self) -> Option<DateTime<Local>> {
        self.last_scan_time
    }

    pub fn active_category(&self) -> &str {
        &self.active_category
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// True once a scan returned at least one category.
    pub fn has_data(&self) -> bool {
        self.data.as_ref().is_some_and(|data| !data.is_empty())
    }

    /// Derived values for rendering.
    pub fn view(&self) -> DashboardView<'_> {
        let data = self.data();
        DashboardView {
            statistics: aggregate::compute_statistics(data),
            category_breakdown: aggregate::compute_category_breakdown(data),
            category_stats: aggregate::compute_category_stats(data),
            has_data: self.has_data(),
            categories: data.map(|d| d.categories().collect()).unwrap_or_default(),
            visible_groups: filter::visible_groups(data, &self.active_category, &self.search_term),
            loading: self.loading,
            error: self.error.as_deref(),
            last_scan_time: self.last_scan_time,
        }
    }
}

/// Everything the presentation layer needs, derived from one store state.
#[derive(Debug)]
pub struct DashboardView<'a> {
    pub statistics: Option<Statistics>,
    pub category_breakdown: Vec<CategoryCount>,
    pub category_stats: CategoryStats,
    pub has_data: bool,
    pub categories: Vec<&'a str>,
    /// Groups for the active tab and search, highest score first.
    pub visible_groups: Vec<&'a DuplicateGroup>,
    pub loading: bool,
    pub error: Option<&'a str>,
    pub last_scan_time: Option<DateTime<Local>>,
}

// ---------------------------------------------------------------------------
// Shared store
// ---------------------------------------------------------------------------

/// Store shared between the web server and background scan threads.
pub type SharedStore = Arc<Mutex<DashboardStore>>;

pub fn shared() -> SharedStore {
    Arc::new(Mutex::new(DashboardStore::new()))
}

/// Lock the store, recovering the state if a previous holder panicked.
pub fn lock(store: &Mutex<DashboardStore>) -> MutexGuard<'_, DashboardStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ApiDescriptor, ApiPair};

    struct StaticSource(Result<CategorizedDuplicates, FetchError>);

    impl DuplicatesSource for StaticSource {
        fn fetch(&self) -> Result<CategorizedDuplicates, FetchError> {
            self.0.clone()
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    fn sample() -> CategorizedDuplicates {
        let mut data = CategorizedDuplicates::new();
        let pair = |a: &str, b: &str| ApiPair::new(ApiDescriptor::named(a), ApiDescriptor::named(b));
        data.insert(
            ALL_CATEGORIES,
            vec![
                DuplicateGroup::new(60, vec![pair("Orders", "Order History")]),
                DuplicateGroup::new(97, vec![pair("Login", "Sign In")]),
            ],
        );
        data.insert("Authentication", vec![DuplicateGroup::new(97, vec![pair("Login", "Sign In")])]);
        data.insert("Order Management", vec![DuplicateGroup::new(60, vec![pair("Orders", "Order History")])]);
        data
    }

    #[test]
    fn new_store_is_empty() {
        let store = DashboardStore::new();
        assert!(!store.has_data());
        assert!(!store.is_loading());
        assert_eq!(store.active_category(), ALL_CATEGORIES);
        let view = store.view();
        assert!(view.statistics.is_none());
        assert!(view.visible_groups.is_empty());
    }

    #[test]
    fn successful_scan_replaces_snapshot() {
        let mut store = DashboardStore::new();
        store.scan(&StaticSource(Ok(sample()))).unwrap();

        assert!(store.has_data());
        assert!(!store.is_loading());
        assert!(store.last_scan_time().is_some());
        assert_eq!(store.view().categories.len(), 3);

        let mut smaller = CategorizedDuplicates::new();
        smaller.insert("Testing", vec![]);
        store.scan(&StaticSource(Ok(smaller))).unwrap();
        let categories: Vec<&str> = store.data().unwrap().categories().collect();
        assert_eq!(categories, vec!["Testing"]);
    }

    #[test]
    fn failed_scan_keeps_previous_snapshot() {
        let mut store = DashboardStore::new();
        store.scan(&StaticSource(Ok(sample()))).unwrap();

        let err = store.scan(&StaticSource(Err(FetchError::Server))).unwrap_err();
        assert_eq!(err, ScanError::Fetch(FetchError::Server));
        assert_eq!(store.error(), Some("Server error occurred. Please try again later."));
        assert!(store.has_data());
        assert!(!store.is_loading());
    }

    #[test]
    fn begin_scan_rejects_concurrent_scan() {
        let mut store = DashboardStore::new();
        store.begin_scan().unwrap();
        assert_eq!(store.begin_scan(), Err(ScanError::InProgress));
        assert_eq!(
            store.scan(&StaticSource(Ok(sample()))).unwrap_err(),
            ScanError::InProgress
        );
    }

    #[test]
    fn scan_start_clears_previous_error() {
        let mut store = DashboardStore::new();
        store.dispatch(Action::ScanFailed("boom".into()));
        store.begin_scan().unwrap();
        assert!(store.error().is_none());
    }

    #[test]
    fn clear_error_and_reset() {
        let mut store = DashboardStore::new();
        store.scan(&StaticSource(Ok(sample()))).unwrap();
        store.dispatch(Action::ScanFailed("boom".into()));
        store.dispatch(Action::ClearError);
        assert!(store.error().is_none());
        assert!(store.has_data());

        store.dispatch(Action::SetSearch("login".into()));
        store.dispatch(Action::Reset);
        assert!(!store.has_data());
        assert!(store.last_scan_time().is_none());
        assert_eq!(store.search_term(), "login");
    }

    #[test]
    fn view_follows_tab_and_search() {
        let mut store = DashboardStore::new();
        store.scan(&StaticSource(Ok(sample()))).unwrap();

        let scores: Vec<u32> = store
            .view()
            .visible_groups
            .iter()
            .map(|g| g.similarity_score_percentage)
            .collect();
        assert_eq!(scores, vec![97, 60]);

        store.dispatch(Action::SetSearch("ORDER".into()));
        assert_eq!(store.view().visible_groups.len(), 1);

        store.dispatch(Action::SelectCategory("Authentication".into()));
        assert!(store.view().visible_groups.is_empty());

        store.dispatch(Action::SelectCategory("Missing".into()));
        store.dispatch(Action::SetSearch(String::new()));
        assert!(store.view().visible_groups.is_empty());
    }

    #[test]
    fn view_category_stats_total_real_categories() {
        let mut store = DashboardStore::new();
        store.scan(&StaticSource(Ok(sample()))).unwrap();
        let view = store.view();
        assert_eq!(view.category_stats.get(ALL_CATEGORIES), Some(2));
        assert_eq!(view.category_breakdown.len(), 2);
        assert_eq!(view.statistics.unwrap().total_duplicates, 4);
    }

    #[test]
    fn shared_store_recovers_from_poison() {
        let store = shared();
        let clone = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = clone.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(store.is_poisoned());
        assert!(lock(&store).begin_scan().is_ok());
        assert!(lock(&store).is_loading());
    }

    #[test]
    fn old_snapshot_survives_replacement() {
        let mut store = DashboardStore::new();
        let first = store.scan(&StaticSource(Ok(sample()))).unwrap();
        store.scan(&StaticSource(Ok(CategorizedDuplicates::new()))).unwrap();

        assert_eq!(first.len(), 3);
        assert!(!store.has_data());
    }
}
