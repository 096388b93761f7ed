use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::normalize::{canonical, normalize_tokens};

/// Tri-state value of a boolean catalog attribute such as "Contains Caffeine"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TriState {
    Yes,
    No,
    #[default]
    Unknown,
}

impl TriState {
    /// Parse a cell value. Anything that is not a recognizable yes/no is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        Self::recognize(raw).unwrap_or_default()
    }

    /// Strict parse: `None` unless the value is a known spelling of yes, no
    /// or unknown. Blank counts as unknown.
    pub fn recognize(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "1" => Some(TriState::Yes),
            "no" | "n" | "false" | "0" => Some(TriState::No),
            "" | "unknown" | "n/a" | "na" | "-" => Some(TriState::Unknown),
            _ => None,
        }
    }

    #[inline]
    pub fn is_known(self) -> bool {
        self != TriState::Unknown
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriState::Yes => write!(f, "Yes"),
            TriState::No => write!(f, "No"),
            TriState::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One menu item of the catalog
///
/// `combined_text` is derived from the category, base types and flavor tags
/// when the item is built and cannot be changed on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogItem {
    menu_name: String,
    category: String,
    base_type: BTreeSet<String>,
    flavor_tags: BTreeSet<String>,
    boolean_attributes: BTreeMap<String, TriState>,
    combined_text: String,
}

impl CatalogItem {
    /// Build an item from raw multi-valued cells (`"Black Tea, Milk Tea"`).
    #[must_use]
    pub fn new(
        menu_name: impl Into<String>,
        category: impl Into<String>,
        base_type: &str,
        flavor_tags: &str,
    ) -> Self {
        Self::from_tokens(
            menu_name,
            category,
            normalize_tokens(base_type),
            normalize_tokens(flavor_tags),
        )
    }

    #[must_use]
    pub fn from_tokens(
        menu_name: impl Into<String>,
        category: impl Into<String>,
        base_type: BTreeSet<String>,
        flavor_tags: BTreeSet<String>,
    ) -> Self {
        let category = category.into().trim().to_string();
        let combined_text = combine(&category, &base_type, &flavor_tags);
        Self {
            menu_name: menu_name.into().trim().to_string(),
            category,
            base_type,
            flavor_tags,
            boolean_attributes: BTreeMap::new(),
            combined_text,
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: TriState) -> Self {
        self.boolean_attributes.insert(name.into(), value);
        self
    }

    #[inline]
    pub fn menu_name(&self) -> &str {
        &self.menu_name
    }

    #[inline]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[inline]
    pub fn base_type(&self) -> &BTreeSet<String> {
        &self.base_type
    }

    #[inline]
    pub fn flavor_tags(&self) -> &BTreeSet<String> {
        &self.flavor_tags
    }

    /// Canonical `"A, B"` form of the base types
    pub fn base_type_canonical(&self) -> String {
        canonical(&self.base_type)
    }

    /// Canonical `"a, b"` form of the flavor tags
    pub fn flavor_tags_canonical(&self) -> String {
        canonical(&self.flavor_tags)
    }

    /// Stored value of a boolean attribute; absent attributes are `Unknown`
    pub fn attribute(&self, name: &str) -> TriState {
        self.boolean_attributes.get(name).copied().unwrap_or_default()
    }

    #[inline]
    pub fn attributes(&self) -> &BTreeMap<String, TriState> {
        &self.boolean_attributes
    }

    #[inline]
    pub fn combined_text(&self) -> &str {
        &self.combined_text
    }
}

fn combine(category: &str, base_type: &BTreeSet<String>, flavor_tags: &BTreeSet<String>) -> String {
    std::iter::once(category)
        .chain(base_type.iter().map(String::as_str))
        .chain(flavor_tags.iter().map(String::as_str))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Immutable, ordered set of catalog items
///
/// Built once from raw rows and then shared read-only (typically behind an
/// `Arc`) by every recommendation request.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    skipped: usize,
}

impl Catalog {
    #[must_use]
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items, skipped: 0 }
    }

    #[must_use]
    pub fn with_skipped(items: Vec<CatalogItem>, skipped: usize) -> Self {
        Self { items, skipped }
    }

    #[inline]
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of raw rows dropped as malformed while loading
    #[inline]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.iter()
    }

    /// First item with the given menu name
    pub fn get(&self, menu_name: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.menu_name == menu_name)
    }

    /// Selectable values a presentation layer can offer
    pub fn options(&self) -> CatalogOptions {
        let mut categories: Vec<String> = Vec::new();
        let mut base_types = BTreeSet::new();
        let mut flavor_tags = BTreeSet::new();
        let mut attributes = BTreeSet::new();

        for item in &self.items {
            if !item.category.is_empty() && !categories.contains(&item.category) {
                categories.push(item.category.clone());
            }
            base_types.extend(item.base_type.iter().cloned());
            flavor_tags.extend(item.flavor_tags.iter().cloned());
            attributes.extend(item.boolean_attributes.keys().cloned());
        }

        CatalogOptions {
            categories,
            base_types: base_types.into_iter().collect(),
            flavor_tags: flavor_tags.into_iter().collect(),
            attributes: attributes.into_iter().collect(),
        }
    }
}

impl FromIterator<CatalogItem> for Catalog {
    fn from_iter<I: IntoIterator<Item = CatalogItem>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Distinct categories (first-seen order), base types, flavor tags and
/// boolean attribute names (sorted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogOptions {
    pub categories: Vec<String>,
    pub base_types: Vec<String>,
    pub flavor_tags: Vec<String>,
    pub attributes: Vec<String>,
}
