use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::TriState;
use crate::normalize::normalize_tokens;

/// A user's selections for one recommendation request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    pub selected_tags: BTreeSet<String>,
    /// May hold several comma-joined base types
    pub base_type: Option<String>,
    pub category: Option<String>,
    /// `Unknown` (or absent) means no constraint on that attribute
    pub preference_filters: BTreeMap<String, TriState>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let tag = tag.trim();
        if !tag.is_empty() {
            self.selected_tags.insert(tag.to_string());
        }
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        tags.into_iter().fold(self, |query, tag| query.with_tag(tag))
    }

    #[must_use]
    pub fn with_base_type(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_preference(mut self, attribute: impl Into<String>, value: TriState) -> Self {
        self.preference_filters.insert(attribute.into(), value);
        self
    }

    /// Requested base type tokens, empty when no base type was chosen
    pub fn base_type_tokens(&self) -> BTreeSet<String> {
        self.base_type.as_deref().map(normalize_tokens).unwrap_or_default()
    }

    /// Preferences that actually constrain the candidate set
    pub fn active_preferences(&self) -> impl Iterator<Item = (&str, TriState)> {
        self.preference_filters
            .iter()
            .filter(|(_, value)| value.is_known())
            .map(|(name, value)| (name.as_str(), *value))
    }

    /// Text projected into the similarity space: category, base types, then tags
    pub fn text(&self) -> String {
        let category = self.category.as_deref().map(str::trim).unwrap_or_default();
        let base_types = self.base_type_tokens();

        std::iter::once(category)
            .chain(base_types.iter().map(String::as_str))
            .chain(self.selected_tags.iter().map(String::as_str))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// No tags, base type or category selected
    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}
