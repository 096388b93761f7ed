//! # teamatch Core
//!
//! Core library for the teamatch drink recommender.
//!
//! This crate provides the data model and everything that happens before
//! scoring:
//!
//! - [`CatalogItem`] / [`Catalog`] - normalized, immutable menu items
//! - [`normalize`](normalize::normalize) - raw rows to catalog items
//! - [`load_catalog`] - CSV catalog source
//! - [`Query`] - a user's selections
//! - [`CandidateFilter`] - base type scope and boolean attribute filters
//! - [`FeedbackSink`] - where feedback on recommendations goes
//!
//! ## Example
//!
//! ```rust
//! use teamatch_core::{normalize, RawRecord, Query, CandidateFilter, BooleanMatch};
//!
//! let catalog = normalize(vec![
//!     RawRecord::new("Mango Tea")
//!         .with_base_type("Fruit Tea")
//!         .with_flavor_tags("mango, fruity"),
//!     RawRecord::new("Thai Milk Tea")
//!         .with_base_type("Milk Tea, Black Tea, Milk Tea")
//!         .with_flavor_tags("creamy, sweet"),
//! ]);
//! assert_eq!(catalog.items()[1].base_type_canonical(), "Black Tea, Milk Tea");
//!
//! let query = Query::new().with_base_type("Milk Tea").with_tag("creamy");
//! let candidates = CandidateFilter::from_query(&query, BooleanMatch::Strict).apply(&catalog);
//! assert_eq!(candidates.len(), 1);
//! ```

pub mod catalog;
pub mod error;
pub mod feedback;
pub mod filter;
pub mod normalize;
pub mod query;
pub mod source;

pub use catalog::{Catalog, CatalogItem, CatalogOptions, TriState};
pub use error::{Error, Result};
pub use feedback::{new_user_id, FeedbackRecord, FeedbackSink, MemoryFeedbackSink};
pub use filter::{AttributeFilter, BaseTypeScope, BooleanMatch, CandidateFilter, Filter};
pub use normalize::{canonical, normalize, normalize_field, normalize_record, normalize_tokens, RawRecord};
pub use query::Query;
pub use source::{load_catalog, load_csv, read_catalog, read_csv, CatalogSchema};
