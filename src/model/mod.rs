//! Typed data model for duplicate-scan results.
//!
//! The scan service returns a JSON object keyed by business category, each
//! holding a list of similarity groups:
//!
//! ```json
//! {
//!   "All Categories": [ { "similarity_score_percentage": 97, "pairs": [ ... ] } ],
//!   "Payment":        [ ... ]
//! }
//! ```
//!
//! Every field is optional on the wire. Missing values deserialize to empty
//! collections or `None` and are replaced by display defaults in
//! [`display`] rather than failing the whole payload.

pub mod display;
pub mod priority;

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use priority::Priority;

/// Synthetic category key holding every group regardless of category.
pub const ALL_CATEGORIES: &str = "All Categories";

// ---------------------------------------------------------------------------
// API descriptors and pairs
// ---------------------------------------------------------------------------

/// One API contract as described by the scan service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openapi_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<String>,
}

impl ApiDescriptor {
    /// Descriptor with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// A source API and the destination API the scan flagged as its duplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiPair {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ApiDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<ApiDescriptor>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub similarity_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_full_explanation_text: Option<String>,
}

impl ApiPair {
    /// Build a pair from two descriptors.
    pub fn new(source: ApiDescriptor, destination: ApiDescriptor) -> Self {
        Self {
            source: Some(source),
            destination: Some(destination),
            ..Self::default()
        }
    }

    /// The pair's similarity score.
    ///
    /// Uses the structured `similarity_score` when present. Otherwise falls
    /// back to the first `NN%` in the explanation text, and to `0` when the
    /// text is absent or carries no percentage.
    pub fn effective_score(&self) -> u32 {
        if let Some(score) = self.similarity_score {
            return score;
        }
        self.similarity_full_explanation_text
            .as_deref()
            .and_then(display::extract_percentage)
            .unwrap_or(0)
    }

    /// Whether both sides of the pair are present and the pair can be shown.
    pub fn is_renderable(&self) -> bool {
        self.source.is_some() && self.destination.is_some()
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// A cluster of API pairs sharing one similarity percentage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    #[serde(default, deserialize_with = "lenient_score")]
    pub similarity_score_percentage: u32,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub number_of_apis: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pairs: Vec<ApiPair>,
}

impl DuplicateGroup {
    pub fn new(similarity_score_percentage: u32, pairs: Vec<ApiPair>) -> Self {
        Self {
            similarity_score_percentage,
            number_of_apis: None,
            pairs,
        }
    }

    /// Number of pairs in the group.
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Number of distinct APIs involved. Falls back to two per pair when the
    /// service leaves `number_of_apis` unset or zero.
    pub fn api_count(&self) -> usize {
        match self.number_of_apis {
            Some(n) if n > 0 => n as usize,
            _ => self.pairs.len() * 2,
        }
    }

    pub fn priority(&self) -> Priority {
        Priority::from_score(self.similarity_score_percentage)
    }

    /// Groups without pairs carry nothing to display.
    pub fn is_renderable(&self) -> bool {
        !self.pairs.is_empty()
    }
}

/// Deserialize `null` the same way as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read a count or percentage from any JSON value. Floats are rounded,
/// numeric strings are parsed, and anything else (negative, non-numeric,
/// `null`) becomes `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_as_u32))
}

fn lenient_score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?.unwrap_or_default())
}

fn number_as_u32(value: &serde_json::Value) -> Option<u32> {
    let n = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then(|| n.round().min(f64::from(u32::MAX)) as u32)
}

// ---------------------------------------------------------------------------
// Categorized result set
// ---------------------------------------------------------------------------

/// The full scan result: category name → groups, in the order the service
/// sent them.
///
/// Backed by a vector of entries rather than a hash map so that category tab
/// order and "first group" semantics follow the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedDuplicates {
    entries: Vec<(String, Vec<DuplicateGroup>)>,
}

impl CategorizedDuplicates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the groups for a category. A new category is
    /// appended; an existing one keeps its position.
    pub fn insert(&mut self, category: impl Into<String>, groups: Vec<DuplicateGroup>) {
        let category = category.into();
        match self.entries.iter_mut().find(|(name, _)| *name == category) {
            Some(entry) => entry.1 = groups,
            None => self.entries.push((category, groups)),
        }
    }

    /// Groups for a category, if the category exists.
    pub fn get(&self, category: &str) -> Option<&[DuplicateGroup]> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, groups)| groups.as_slice())
    }

    pub fn contains(&self, category: &str) -> bool {
        self.get(category).is_some()
    }

    /// Iterate `(category, groups)` in payload order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DuplicateGroup])> {
        self.entries
            .iter()
            .map(|(name, groups)| (name.as_str(), groups.as_slice()))
    }

    /// Category names in payload order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Every group under every key, including the synthetic
    /// [`ALL_CATEGORIES`] key.
    pub fn groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.entries.iter().flat_map(|(_, groups)| groups.iter())
    }

    /// Number of category keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of groups across all keys.
    pub fn total_groups(&self) -> usize {
        self.entries.iter().map(|(_, groups)| groups.len()).sum()
    }
}

impl FromIterator<(String, Vec<DuplicateGroup>)> for CategorizedDuplicates {
    fn from_iter<I: IntoIterator<Item = (String, Vec<DuplicateGroup>)>>(iter: I) -> Self {
        let mut data = Self::new();
        for (category, groups) in iter {
            data.insert(category, groups);
        }
        data
    }
}

impl Serialize for CategorizedDuplicates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, groups) in &self.entries {
            map.serialize_entry(category, groups)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CategorizedDuplicates {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CategoriesVisitor;

        impl<'de> Visitor<'de> for CategoriesVisitor {
            type Value = CategorizedDuplicates;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of category name to duplicate groups")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut data = CategorizedDuplicates::new();
                while let Some((category, groups)) =
                    access.next_entry::<String, Option<Vec<DuplicateGroup>>>()?
                {
                    data.insert(category, groups.unwrap_or_default());
                }
                Ok(data)
            }
        }

        deserializer.deserialize_map(CategoriesVisitor)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
