//! Filter and search over a scan snapshot.
//!
//! Produces the slice of groups the presentation layer shows for the active
//! category tab and search box. Results borrow from the snapshot; nothing
//! here clones or mutates groups.

use crate::model::{ApiPair, CategorizedDuplicates, DuplicateGroup};

/// Groups under `active_category`, narrowed by `search_term`.
///
/// A blank (whitespace-only) term keeps the category's groups unchanged.
/// Otherwise a group survives when at least one of its pairs has a source
/// or destination name, description or category containing the term,
/// ignoring case. Input order is kept; there is no relevance ranking.
pub fn filter_groups<'a>(
    data: Option<&'a CategorizedDuplicates>,
    active_category: &str,
    search_term: &str,
) -> Vec<&'a DuplicateGroup> {
    let Some(data) = data else {
        return Vec::new();
    };

    let groups = data.get(active_category).unwrap_or_default();

    if search_term.trim().is_empty() {
        return groups.iter().collect();
    }

    let needle = search_term.to_lowercase();
    groups
        .iter()
        .filter(|group| group_matches(group, &needle))
        .collect()
}

/// Whether any pair in the group matches an already-lowercased needle.
pub fn group_matches(group: &DuplicateGroup, needle: &str) -> bool {
    group.pairs.iter().any(|pair| pair_matches(pair, needle))
}

fn pair_matches(pair: &ApiPair, needle: &str) -> bool {
    searchable_fields(pair).any(|field| field.to_lowercase().contains(needle))
}

/// The six searchable fields of a pair. Absent fields are skipped rather
/// than matched against their display fallbacks.
fn searchable_fields(pair: &ApiPair) -> impl Iterator<Item = &str> {
    let source = pair.source.as_ref();
    let destination = pair.destination.as_ref();

    [
        source.and_then(|a| a.name.as_deref()),
        destination.and_then(|a| a.name.as_deref()),
        source.and_then(|a| a.description.as_deref()),
        destination.and_then(|a| a.description.as_deref()),
        source.and_then(|a| a.category.as_deref()),
        destination.and_then(|a| a.category.as_deref()),
    ]
    .into_iter()
    .flatten()
}

/// Copy of `groups` ordered by similarity percentage, highest first.
///
/// The sort is stable: groups with equal scores keep their relative order.
pub fn sort_groups_by_score_descending<'a>(
    groups: &[&'a DuplicateGroup],
) -> Vec<&'a DuplicateGroup> {
    let mut sorted = groups.to_vec();
    sorted.sort_by(|a, b| {
        b.similarity_score_percentage
            .cmp(&a.similarity_score_percentage)
    });
    sorted
}

/// Filter then sort, the order the group list is rendered in.
pub fn visible_groups<'a>(
    data: Option<&'a CategorizedDuplicates>,
    active_category: &str,
    search_term: &str,
) -> Vec<&'a DuplicateGroup> {
    sort_groups_by_score_descending(&filter_groups(data, active_category, search_term))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ApiDescriptor;

    fn pair(src: &str, dst: &str) -> ApiPair {
        ApiPair::new(ApiDescriptor::named(src), ApiDescriptor::named(dst))
    }

    fn sample() -> CategorizedDuplicates {
        let mut data = CategorizedDuplicates::new();
        data.insert(
            "Payment",
            vec![
                DuplicateGroup::new(60, vec![pair("Refunds", "Chargebacks")]),
                DuplicateGroup::new(97, vec![pair("Checkout", "Cart Payments")]),
                DuplicateGroup::new(60, vec![pair("Invoices", "Billing")]),
            ],
        );
        data
    }

    #[test]
    fn empty_without_data() {
        assert!(filter_groups(None, "Payment", "").is_empty());
    }

    #[test]
    fn missing_category_is_empty() {
        let data = sample();
        assert!(filter_groups(Some(&data), "Nonexistent", "").is_empty());
        assert!(filter_groups(Some(&data), "Nonexistent", "pay").is_empty());
    }

    #[test]
    fn blank_search_returns_category_unchanged() {
        let data = sample();
        let groups = filter_groups(Some(&data), "Payment", "   ");
        let expected: Vec<&DuplicateGroup> = data.get("Payment").unwrap().iter().collect();
        assert_eq!(groups, expected);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let data = sample();
        let groups = filter_groups(Some(&data), "Payment", "CHARGE");
        assert_eq!(groups.len(), 1);
        let destination = groups[0].pairs[0].destination.as_ref().unwrap();
        assert_eq!(destination.display_name(), "Chargebacks");
    }

    #[test]
    fn search_covers_description_and_category() {
        let mut data = CategorizedDuplicates::new();
        let described = ApiPair::new(
            ApiDescriptor {
                description: Some("Issues OAuth tokens".into()),
                ..ApiDescriptor::default()
            },
            ApiDescriptor::default(),
        );
        let categorized = ApiPair::new(
            ApiDescriptor::default(),
            ApiDescriptor {
                category: Some("User Management".into()),
                ..ApiDescriptor::default()
            },
        );
        data.insert(
            "Mixed",
            vec![
                DuplicateGroup::new(90, vec![described]),
                DuplicateGroup::new(90, vec![categorized]),
            ],
        );

        assert_eq!(filter_groups(Some(&data), "Mixed", "oauth").len(), 1);
        assert_eq!(filter_groups(Some(&data), "Mixed", "management").len(), 1);
    }

    #[test]
    fn missing_fields_do_not_match_fallback_text() {
        let mut data = CategorizedDuplicates::new();
        data.insert(
            "Misc",
            vec![DuplicateGroup::new(90, vec![ApiPair::new(
                ApiDescriptor::default(),
                ApiDescriptor::default(),
            )])],
        );
        assert!(filter_groups(Some(&data), "Misc", "unknown").is_empty());
    }

    #[test]
    fn group_without_pairs_never_matches_search() {
        let mut data = CategorizedDuplicates::new();
        data.insert("Misc", vec![DuplicateGroup::new(90, vec![])]);
        assert_eq!(filter_groups(Some(&data), "Misc", "").len(), 1);
        assert!(filter_groups(Some(&data), "Misc", "x").is_empty());
    }

    #[test]
    fn sort_is_descending_and_stable() {
        let data = sample();
        let groups = filter_groups(Some(&data), "Payment", "");
        let sorted = sort_groups_by_score_descending(&groups);

        let names: Vec<&str> = sorted
            .iter()
            .map(|g| g.pairs[0].source.as_ref().unwrap().display_name())
            .collect();
        assert_eq!(names, vec!["Checkout", "Refunds", "Invoices"]);
    }

    #[test]
    fn sort_leaves_input_untouched() {
        let data = sample();
        let groups = filter_groups(Some(&data), "Payment", "");
        let before = groups.clone();
        let _ = sort_groups_by_score_descending(&groups);
        assert_eq!(groups, before);
    }

    #[test]
    fn visible_groups_filters_then_sorts() {
        let data = sample();
        let visible = visible_groups(Some(&data), "Payment", "e");
        let scores: Vec<u32> = visible.iter().map(|g| g.similarity_score_percentage).collect();
        assert_eq!(scores, vec![97, 60, 60]);
    }
}
