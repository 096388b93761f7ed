//! # teamatch
//!
//! Content-based drink recommendations.
//!
//! teamatch loads a catalog of drinks tagged with flavors, base types and
//! Yes/No dietary attributes, and suggests the items closest to a user's
//! selections using TF-IDF vectors and cosine similarity.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! teamatch serve --catalog menu.csv --http-port 8080
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use teamatch::prelude::*;
//!
//! let catalog = normalize(vec![
//!     RawRecord::new("Mango Tea")
//!         .with_base_type("Fruit Tea")
//!         .with_flavor_tags("mango, fruity"),
//!     RawRecord::new("Thai Milk Tea")
//!         .with_base_type("Milk Tea")
//!         .with_flavor_tags("creamy, sweet")
//!         .with_attribute("Contains Caffeine", "Yes"),
//! ]);
//!
//! let query = Query::new().with_tag("mango").with_base_type("Fruit Tea");
//! let result = Recommender::default().recommend(&catalog, &query);
//! assert_eq!(result.menu_names(), vec!["Mango Tea"]);
//! ```
//!
//! ## Crate Structure
//!
//! - `teamatch-core` - Catalog model, normalization, CSV source, filters, feedback
//! - `teamatch-similarity` - TF-IDF model, recommender, explanations
//! - `teamatch-api` - REST API

// Re-export core types
pub use teamatch_core::{
    load_catalog, normalize, read_catalog, BooleanMatch, Catalog, CatalogItem, CatalogOptions,
    CatalogSchema, Error, FeedbackRecord, FeedbackSink, MemoryFeedbackSink, Query, RawRecord,
    Result, TriState,
};

// Re-export similarity
pub use teamatch_similarity::{
    CutoffPolicy, Explanation, Outcome, Recommendation, RecommendOptions, RecommendationResult,
    Recommender,
};

// Re-export API
pub use teamatch_api::{AppState, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        load_catalog, normalize, read_catalog, BooleanMatch, Catalog, CatalogItem, CatalogSchema,
        CutoffPolicy, FeedbackRecord, FeedbackSink, MemoryFeedbackSink, Outcome, Query, RawRecord,
        RecommendOptions, RecommendationResult, Recommender, TriState,
    };
}
