//! Similarity recommender
//!
//! Scores the candidate subset of a catalog against a query with a TF-IDF
//! model fitted on that subset alone, then applies one of two cutoff
//! policies. Hard filters run before vectorization, so they change both
//! which items compete and which terms are distinguishing.

use serde::{Deserialize, Serialize};
use teamatch_core::{BooleanMatch, CandidateFilter, Catalog, CatalogItem, Query};
use tracing::debug;

use crate::tfidf::{SparseVector, TfidfModel};
use crate::tokenize::Tokenizer;

pub const DEFAULT_THRESHOLD: f32 = 0.3;
pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_NEIGHBORS: usize = 6;

/// How many scored candidates make it into the result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CutoffPolicy {
    /// Keep scores >= `threshold`, then cap at `top_n`
    Threshold { threshold: f32 },
    /// Always return the best `top_n`, whatever their scores
    TopN,
}

impl Default for CutoffPolicy {
    fn default() -> Self {
        CutoffPolicy::Threshold {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendOptions {
    pub policy: CutoffPolicy,
    pub top_n: usize,
    /// Restrict candidates to the query's base types before scoring
    pub base_type_scope: bool,
    pub boolean_match: BooleanMatch,
    pub stop_words: bool,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            policy: CutoffPolicy::default(),
            top_n: DEFAULT_TOP_N,
            base_type_scope: true,
            boolean_match: BooleanMatch::Strict,
            stop_words: false,
        }
    }
}

impl RecommendOptions {
    /// Threshold mode with the given bar
    pub fn threshold(threshold: f32) -> Self {
        Self {
            policy: CutoffPolicy::Threshold { threshold },
            ..Default::default()
        }
    }

    /// Top-N mode
    pub fn top_n(top_n: usize) -> Self {
        Self {
            policy: CutoffPolicy::TopN,
            top_n,
            ..Default::default()
        }
    }

    /// The `k` nearest items by cosine similarity over the whole catalog
    pub fn nearest_neighbors(k: usize) -> Self {
        Self {
            policy: CutoffPolicy::TopN,
            top_n: k,
            base_type_scope: false,
            stop_words: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    #[must_use]
    pub fn with_boolean_match(mut self, boolean_match: BooleanMatch) -> Self {
        self.boolean_match = boolean_match;
        self
    }

    #[must_use]
    pub fn with_base_type_scope(mut self, base_type_scope: bool) -> Self {
        self.base_type_scope = base_type_scope;
        self
    }

    #[must_use]
    pub fn with_stop_words(mut self, stop_words: bool) -> Self {
        self.stop_words = stop_words;
        self
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.top_n == 0 {
            return Err(OptionsError::ZeroTopN);
        }
        if let CutoffPolicy::Threshold { threshold } = self.policy {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(OptionsError::InvalidThreshold(threshold));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum OptionsError {
    #[error("top_n must be at least 1")]
    ZeroTopN,

    #[error("threshold {0} is outside [0, 1]")]
    InvalidThreshold(f32),
}

/// Why a result looks the way it does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Matched,
    /// Base type scope or boolean filters removed every item
    EmptyCandidateSet,
    /// Candidates existed but none cleared the similarity threshold
    NoQualifyingMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub menu_name: String,
    pub score: f32,
}

/// Ranked recommendations, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub items: Vec<Recommendation>,
    pub outcome: Outcome,
    /// Size of the candidate subset that was scored
    pub candidates: usize,
}

impl RecommendationResult {
    fn empty(outcome: Outcome, candidates: usize) -> Self {
        Self {
            items: Vec::new(),
            outcome,
            candidates,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn menu_names(&self) -> Vec<&str> {
        self.items.iter().map(|r| r.menu_name.as_str()).collect()
    }
}

/// The scored candidate subset of one request
pub(crate) struct Scored<'a> {
    pub candidates: Vec<&'a CatalogItem>,
    pub model: TfidfModel,
    pub query: SparseVector,
    pub scores: Vec<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct Recommender {
    options: RecommendOptions,
}

impl Recommender {
    pub fn new(options: RecommendOptions) -> Self {
        Self { options }
    }

    fn candidate_filter(&self, query: &Query) -> CandidateFilter {
        if self.options.base_type_scope {
            CandidateFilter::from_query(query, self.options.boolean_match)
        } else {
            let unscoped = Query {
                base_type: None,
                ..query.clone()
            };
            CandidateFilter::from_query(&unscoped, self.options.boolean_match)
        }
    }

    /// Filter, fit and score; `None` when no candidate survives the filters
    pub(crate) fn score<'a>(&self, catalog: &'a Catalog, query: &Query) -> Option<Scored<'a>> {
        let candidates = self.candidate_filter(query).apply(catalog);
        if candidates.is_empty() {
            return None;
        }

        let tokenizer = Tokenizer::with_stop_words(self.options.stop_words);
        let model = TfidfModel::fit(candidates.iter().map(|item| item.combined_text()), tokenizer);
        let query = model.transform(&query.text());
        let scores = model.similarities(&query);

        Some(Scored {
            candidates,
            model,
            query,
            scores,
        })
    }

    pub fn recommend(&self, catalog: &Catalog, query: &Query) -> RecommendationResult {
        let Some(scored) = self.score(catalog, query) else {
            debug!("No candidates left after filtering {} items", catalog.len());
            return RecommendationResult::empty(Outcome::EmptyCandidateSet, 0);
        };

        let candidates = scored.candidates.len();
        let mut ranked: Vec<(usize, f32)> = scored.scores.iter().copied().enumerate().collect();
        if let CutoffPolicy::Threshold { threshold } = self.options.policy {
            ranked.retain(|(_, score)| *score >= threshold);
            if ranked.is_empty() {
                debug!(
                    "None of {} candidates reached threshold {}",
                    candidates, threshold
                );
                return RecommendationResult::empty(Outcome::NoQualifyingMatch, candidates);
            }
        }

        // stable: equal scores keep catalog order
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(self.options.top_n);
        if ranked.is_empty() {
            debug!("top_n {} leaves nothing to recommend", self.options.top_n);
            return RecommendationResult::empty(Outcome::NoQualifyingMatch, candidates);
        }

        let items: Vec<Recommendation> = ranked
            .into_iter()
            .map(|(idx, score)| Recommendation {
                menu_name: scored.candidates[idx].menu_name().to_string(),
                score,
            })
            .collect();
        debug!(
            "Recommended {} of {} candidates (vocabulary {})",
            items.len(),
            candidates,
            scored.model.vocabulary_len()
        );

        RecommendationResult {
            items,
            outcome: Outcome::Matched,
            candidates,
        }
    }
}
