// Hard filters applied to the catalog before any scoring
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::catalog::{Catalog, CatalogItem, TriState};
use crate::query::Query;

pub trait Filter {
    fn matches(&self, item: &CatalogItem) -> bool;
}

/// How a requested attribute value is compared with the stored one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanMatch {
    /// Stored value must equal the requested value
    #[default]
    Strict,
    /// A requested `No` accepts anything that is not `Yes`, so unknown values pass
    Lenient,
}

/// Keeps items whose base types intersect the requested ones
#[derive(Debug, Clone, Default)]
pub struct BaseTypeScope {
    tokens: BTreeSet<String>,
}

impl BaseTypeScope {
    pub fn new(tokens: BTreeSet<String>) -> Self {
        Self { tokens }
    }

    /// An empty scope places no restriction
    #[inline]
    pub fn is_unrestricted(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Filter for BaseTypeScope {
    fn matches(&self, item: &CatalogItem) -> bool {
        self.is_unrestricted()
            || item
                .base_type()
                .iter()
                .any(|have| self.tokens.iter().any(|want| have.eq_ignore_ascii_case(want)))
    }
}

/// Keeps items whose stored attribute matches the requested value
#[derive(Debug, Clone)]
pub struct AttributeFilter {
    name: String,
    value: TriState,
    mode: BooleanMatch,
}

impl AttributeFilter {
    pub fn new(name: impl Into<String>, value: TriState, mode: BooleanMatch) -> Self {
        Self {
            name: name.into(),
            value,
            mode,
        }
    }
}

impl Filter for AttributeFilter {
    fn matches(&self, item: &CatalogItem) -> bool {
        let stored = item.attribute(&self.name);
        match (self.mode, self.value) {
            (_, TriState::Unknown) => true,
            (BooleanMatch::Lenient, TriState::No) => stored != TriState::Yes,
            _ => stored == self.value,
        }
    }
}

/// Base type scope plus every active attribute filter of a query
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    scope: BaseTypeScope,
    attributes: Vec<AttributeFilter>,
}

impl CandidateFilter {
    pub fn from_query(query: &Query, mode: BooleanMatch) -> Self {
        Self {
            scope: BaseTypeScope::new(query.base_type_tokens()),
            attributes: query
                .active_preferences()
                .map(|(name, value)| AttributeFilter::new(name, value, mode))
                .collect(),
        }
    }

    /// Items that pass every filter, in catalog order
    pub fn apply<'a>(&self, catalog: &'a Catalog) -> Vec<&'a CatalogItem> {
        catalog.iter().filter(|item| self.matches(item)).collect()
    }
}

impl Filter for CandidateFilter {
    fn matches(&self, item: &CatalogItem) -> bool {
        self.scope.matches(item) && self.attributes.iter().all(|f| f.matches(item))
    }
}
