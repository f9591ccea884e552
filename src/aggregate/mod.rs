//! Duplicate aggregation: summary statistics and per-category breakdowns.
//!
//! Everything here is a pure function of a [`CategorizedDuplicates`]
//! snapshot. Absent data (no scan yet) is modelled as `None` and yields
//! `None` or an empty result, never an error.
//!
//! - **Statistics**: pair totals bucketed by similarity priority
//! - **Breakdown**: pair counts per real category, for charts
//! - **Category stats**: tab badge counts with a derived "All Categories" total

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::model::{ALL_CATEGORIES, CategorizedDuplicates, DuplicateGroup, Priority};

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Pair counts across the whole scan, split by similarity priority.
///
/// `total_duplicates` includes pairs below the low threshold, which appear in
/// none of the three buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_duplicates: usize,
    pub high_similarity: usize,
    pub medium_similarity: usize,
    pub low_similarity: usize,
}

impl Statistics {
    fn record(&mut self, group: &DuplicateGroup) {
        let pairs = group.pair_count();
        self.total_duplicates += pairs;
        match group.priority() {
            Priority::High => self.high_similarity += pairs,
            Priority::Medium => self.medium_similarity += pairs,
            Priority::Low => self.low_similarity += pairs,
            Priority::NonPriority => {}
        }
    }

    /// Pairs that fell below the low threshold.
    pub fn uncounted(&self) -> usize {
        self.total_duplicates
            .saturating_sub(self.high_similarity + self.medium_similarity + self.low_similarity)
    }
}

/// Compute statistics over every group under every key of `data`.
///
/// Keys are taken as received, so a payload that repeats its groups under
/// [`ALL_CATEGORIES`] counts them once per key.
pub fn compute_statistics(data: Option<&CategorizedDuplicates>) -> Option<Statistics> {
    let data = data?;
    let mut stats = Statistics::default();
    for group in data.groups() {
        stats.record(group);
    }
    Some(stats)
}

// ---------------------------------------------------------------------------
// Category breakdown
// ---------------------------------------------------------------------------

/// Pair count for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

fn pair_total(groups: &[DuplicateGroup]) -> usize {
    groups.iter().map(DuplicateGroup::pair_count).sum()
}

/// Per-category pair counts for real categories, in payload order.
///
/// Skips the synthetic [`ALL_CATEGORIES`] key and categories without pairs.
pub fn compute_category_breakdown(data: Option<&CategorizedDuplicates>) -> Vec<CategoryCount> {
    let Some(data) = data else {
        return Vec::new();
    };

    data.iter()
        .filter(|(category, _)| *category != ALL_CATEGORIES)
        .map(|(category, groups)| CategoryCount {
            category: category.to_string(),
            count: pair_total(groups),
        })
        .filter(|entry| entry.count > 0)
        .collect()
}

// ---------------------------------------------------------------------------
// Category stats for navigation tabs
// ---------------------------------------------------------------------------

/// Ordered tab badge counts, "All Categories" first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryStats {
    entries: Vec<CategoryCount>,
}

impl CategoryStats {
    pub fn get(&self, category: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.category == category)
            .map(|entry| entry.count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryCount> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CategoryStats {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.category, &entry.count)?;
        }
        map.end()
    }
}

/// Badge counts for the category tabs.
///
/// The "All Categories" count is the sum of the per-category counts, not
/// the size of whatever the service stored under that key. It is present
/// whenever data is.
pub fn compute_category_stats(data: Option<&CategorizedDuplicates>) -> CategoryStats {
    let Some(data) = data else {
        return CategoryStats::default();
    };

    let breakdown = compute_category_breakdown(Some(data));
    let total = breakdown.iter().map(|entry| entry.count).sum();

    let mut entries = Vec::with_capacity(breakdown.len() + 1);
    entries.push(CategoryCount {
        category: ALL_CATEGORIES.to_string(),
        count: total,
    });
    entries.extend(breakdown);

    CategoryStats { entries }
}

/// Tab order: "All Categories" first, then every other key as received.
pub fn tab_categories(data: Option<&CategorizedDuplicates>) -> Vec<&str> {
    let Some(data) = data else {
        return Vec::new();
    };

    std::iter::once(ALL_CATEGORIES)
        .chain(data.categories().filter(|c| *c != ALL_CATEGORIES))
        .collect()
}

// ---------------------------------------------------------------------------
// Scan summary
// ---------------------------------------------------------------------------

/// Size of a scan result, used for logs and the scan history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub categories: usize,
    pub groups: usize,
    pub total_pairs: usize,
}

pub fn summarize(data: &CategorizedDuplicates) -> ScanSummary {
    ScanSummary {
        categories: data.len(),
        groups: data.total_groups(),
        total_pairs: data.groups().map(DuplicateGroup::pair_count).sum(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
