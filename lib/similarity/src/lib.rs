//! # teamatch Similarity
//!
//! Content-based recommendation over a normalized drink catalog.
//!
//! ## Features
//!
//! - **Per-request TF-IDF**: the model is fitted on the filtered candidate
//!   subset, so the vocabulary follows the filters
//! - **Two cutoff policies**: similarity threshold (strict relevance) or
//!   plain top-N (always show something)
//! - **Pre-filtering**: base type scope and boolean attribute filters run
//!   before scoring
//! - **Explainability**: per-term contribution breakdown
//!
//! ## Example
//!
//! ```rust
//! use teamatch_core::{Catalog, CatalogItem, Query};
//! use teamatch_similarity::{Outcome, RecommendOptions, Recommender};
//!
//! let catalog = Catalog::new(vec![
//!     CatalogItem::new("Mango Tea", "", "Fruit Tea", "mango, fruity"),
//!     CatalogItem::new("Thai Milk Tea", "", "Milk Tea", "creamy, sweet"),
//! ]);
//!
//! let recommender = Recommender::new(RecommendOptions::threshold(0.3));
//! let query = Query::new().with_tag("mango").with_base_type("Fruit Tea");
//! let result = recommender.recommend(&catalog, &query);
//!
//! assert_eq!(result.outcome, Outcome::Matched);
//! assert_eq!(result.menu_names(), vec!["Mango Tea"]);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Catalog   │────>│   Filters   │────>│   TF-IDF    │
//! │ (immutable) │     │ (pre-score) │     │ (per query) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │   Cutoff    │<────│   Cosine    │
//!                     │ (threshold) │     │  (scores)   │
//!                     └─────────────┘     └─────────────┘
//! ```

pub mod explain;
pub mod recommend;
pub mod tfidf;
pub mod tokenize;

pub use explain::{Explanation, TermContribution};
pub use recommend::{
    CutoffPolicy, OptionsError, Outcome, Recommendation, RecommendOptions, RecommendationResult,
    Recommender, DEFAULT_NEIGHBORS, DEFAULT_THRESHOLD, DEFAULT_TOP_N,
};
pub use tfidf::{SparseVector, TfidfModel};
pub use tokenize::{Tokenizer, ENGLISH_STOP_WORDS};
