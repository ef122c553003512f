//! Fieldrank
//!
//! Researcher recommendations from a seed set of target authors. Each request
//! builds a bipartite author/field graph from the targets' declared fields and
//! from field-search results, embeds it with weighted random walks and
//! skip-gram, and ranks candidate authors by field overlap, similarity and
//! topical diversity.
//!
//! # Components
//!
//! - [`fetch`]: rate-limited, retrying, deduplicating field search ingestion
//! - [`graph`]: Author/Field graph store
//! - [`embed`]: walk + skip-gram embedding engine
//! - [`rank`]: multi-criterion ranking with a diversity pass
//! - [`cache`]: one-hour recommendation cache
//! - [`weighting`]: fields of interest for a target set
//! - [`recommender`]: the service tying them together
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fieldrank::{Recommender, RecommenderConfig, StaticFieldSearch, SystemClock, TargetAuthor};
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let search = StaticFieldSearch::from_json_file("catalog.json").unwrap();
//! let config = RecommenderConfig::default();
//! let recommender = Recommender::new(config, Arc::new(search), Arc::new(SystemClock));
//!
//! let targets = vec![TargetAuthor::new("Jane Doe", ["Artificial Intelligence"])];
//! let result = recommender.recommend(&targets).await;
//! println!("{}", serde_json::to_string_pretty(&result.payload).unwrap());
//! # }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod cache;
pub mod clock;
pub mod config;
pub mod embed;
pub mod fetch;
pub mod graph;
pub mod models;
pub mod ontology;
pub mod rank;
pub mod recommender;
pub mod weighting;

// Re-export main types for convenience
pub use graph::{
    Edge, EdgeId, EdgeWeight, GraphError, GraphResult, GraphStore, Node, NodeId, NodeKind,
};

pub use models::{
    normalize_targets, AuthorGroup, AuthorStub, FieldResults, FieldWeight, RecommendationPayload,
    RecommendedAuthor, TargetAuthor,
};

pub use embed::{EmbedError, EmbedResult, EmbeddingConfig, EmbeddingEngine, Embeddings};

pub use fetch::{
    FetchError, FetchPolicy, FetchResult, FieldFetcher, FieldSearch, HttpFieldSearch, RateScheduler,
    StaticFieldSearch,
};

pub use cache::{CacheKey, RecommendationCache, CACHE_TTL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{parse_or_default, ConfigError, ConfigResult, RecommenderConfig};
pub use ontology::FieldOntology;
pub use rank::{Ranker, Recommendation};
pub use recommender::{Recommendations, Recommender, TOP_PICKS};
pub use weighting::{weighted_fields, DEFAULT_FIELDS, DEFAULT_TOP_FIELDS};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
