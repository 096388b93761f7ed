//! Explainability for recommendation scores
//!
//! Breaks an item's cosine score down into per-term contributions. Rows and
//! query are unit length, so the contributions sum to the score.

use serde::Serialize;
use teamatch_core::{Catalog, Query};

use crate::recommend::Recommender;

/// Share of the score contributed by one shared term
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermContribution {
    pub term: String,
    pub weight: f32,
}

/// A scored item with its per-term breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub menu_name: String,
    pub score: f32,
    /// Largest contribution first
    pub contributions: Vec<TermContribution>,
}

impl Explanation {
    /// Term that contributed most, if any term was shared
    pub fn top_term(&self) -> Option<&str> {
        self.contributions.first().map(|c| c.term.as_str())
    }
}

impl Recommender {
    /// Explain how `menu_name` scores for `query` among the candidates this
    /// recommender would consider. `None` if the item is not a candidate.
    pub fn explain(&self, catalog: &Catalog, query: &Query, menu_name: &str) -> Option<Explanation> {
        let scored = self.score(catalog, query)?;
        let idx = scored
            .candidates
            .iter()
            .position(|item| item.menu_name() == menu_name)?;
        let row = scored.model.row(idx)?;

        let mut contributions: Vec<TermContribution> = scored
            .query
            .entries()
            .iter()
            .filter_map(|&(dim, q_weight)| {
                let weight = q_weight * row.get(dim);
                let term = scored.model.term(dim)?;
                (weight > 0.0).then(|| TermContribution {
                    term: term.to_string(),
                    weight,
                })
            })
            .collect();
        contributions.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.term.cmp(&b.term))
        });

        Some(Explanation {
            menu_name: menu_name.to_string(),
            score: scored.scores[idx],
            contributions,
        })
    }
}
