//! Catalog normalization
//!
//! Turns raw, possibly ragged rows into [`CatalogItem`]s. Multi-valued cells
//! (base types, flavor tags) are split on commas, trimmed, deduplicated and
//! kept in ascending order so the canonical string is stable no matter how
//! the source listed them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::catalog::{Catalog, CatalogItem, TriState};
use crate::{Error, Result};

/// Delimiter between tokens of a multi-valued cell in canonical form
pub const TOKEN_DELIMITER: &str = ", ";

/// A catalog row as read from the source, before normalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub menu_name: Option<String>,
    pub category: Option<String>,
    pub base_type: Option<String>,
    pub flavor_tags: Option<String>,
    /// Boolean attribute columns, raw cell text keyed by column name
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new(menu_name: impl Into<String>) -> Self {
        Self {
            menu_name: Some(menu_name.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_base_type(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    #[must_use]
    pub fn with_flavor_tags(mut self, flavor_tags: impl Into<String>) -> Self {
        self.flavor_tags = Some(flavor_tags.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Split a multi-valued cell on commas into a sorted, deduplicated token set
pub fn normalize_tokens(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join tokens into their canonical `"A, B"` form
pub fn canonical<'a, I>(tokens: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    tokens
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(TOKEN_DELIMITER)
}

/// Canonical form of a raw multi-valued cell
pub fn normalize_field(raw: &str) -> String {
    canonical(&normalize_tokens(raw))
}

/// Normalize a single row. `row` is only used for error reporting.
///
/// Only a missing or blank menu name is an error; every other field degrades
/// to empty (text) or `Unknown` (attributes).
pub fn normalize_record(row: usize, raw: RawRecord) -> Result<CatalogItem> {
    let menu_name = match raw.menu_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            return Err(Error::MalformedRecord {
                row,
                reason: "missing menu name".to_string(),
            })
        }
    };

    let mut item = CatalogItem::from_tokens(
        menu_name,
        raw.category.unwrap_or_default(),
        normalize_tokens(raw.base_type.as_deref().unwrap_or_default()),
        normalize_tokens(raw.flavor_tags.as_deref().unwrap_or_default()),
    );
    for (name, value) in raw.attributes {
        item = item.with_attribute(name, TriState::parse(&value));
    }
    Ok(item)
}

/// Normalize every row into a catalog, skipping and counting malformed rows
pub fn normalize<I>(rows: I) -> Catalog
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut items = Vec::new();
    let mut skipped = 0;

    for (idx, raw) in rows.into_iter().enumerate() {
        match normalize_record(idx + 1, raw) {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!("Skipping catalog row: {}", e);
                skipped += 1;
            }
        }
    }

    Catalog::with_skipped(items, skipped)
}
