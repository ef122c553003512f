//! Graph embeddings
//!
//! Node vectors come from weighted random walks over the author/field graph fed
//! to a skip-gram model. Embeddings are recomputed from scratch for every
//! request; a node missing from the latest computation simply has no vector.

use crate::algo::{
    build_view, train_skip_gram, weighted_random_walks, RandomWalkConfig, SkipGramConfig,
};
use crate::graph::{GraphStore, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Embed errors
#[derive(Error, Debug, PartialEq)]
pub enum EmbedError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The walk worker pool could not be created
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

pub type EmbedResult<T> = Result<T, EmbedError>;

/// Embedding hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Vector length
    pub dimensions: usize,
    /// Nodes per walk, start node included
    pub walk_length: usize,
    /// Walks started from every node
    pub num_walks: usize,
    /// Skip-gram context window
    pub window: usize,
    /// Negative samples per positive pair
    pub negative: usize,
    /// Passes over the walk corpus
    pub epochs: usize,
    pub learning_rate: f32,
    /// Walk workers; defaults to half the available cores, at least one
    pub workers: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: 32,
            walk_length: 15,
            num_walks: 100,
            window: 5,
            negative: 5,
            epochs: 1,
            learning_rate: 0.025,
            workers: None,
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> EmbedResult<()> {
        if self.dimensions == 0 {
            return Err(EmbedError::ConfigError("dimensions must be positive".to_string()));
        }
        if self.walk_length == 0 {
            return Err(EmbedError::ConfigError("walk_length must be positive".to_string()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(EmbedError::ConfigError(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    fn walk_config(&self) -> RandomWalkConfig {
        RandomWalkConfig {
            num_walks: self.num_walks,
            walk_length: self.walk_length,
            workers: self.workers.unwrap_or_else(crate::algo::default_workers).max(1),
        }
    }

    fn skip_gram_config(&self) -> SkipGramConfig {
        SkipGramConfig {
            dimensions: self.dimensions,
            window: self.window.max(1),
            negative: self.negative,
            epochs: self.epochs.max(1),
            learning_rate: self.learning_rate,
            ..SkipGramConfig::default()
        }
    }
}

/// Node vectors from one computation
#[derive(Debug, Clone, Default)]
pub struct Embeddings {
    vectors: HashMap<NodeId, Vec<f32>>,
    dimensions: usize,
}

impl Embeddings {
    pub fn from_vectors(dimensions: usize, vectors: HashMap<NodeId, Vec<f32>>) -> Self {
        Self { vectors, dimensions }
    }

    pub fn get(&self, id: NodeId) -> Option<&[f32]> {
        self.vectors.get(&id).map(Vec::as_slice)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.vectors.contains_key(&id)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Computes node embeddings for one graph
pub struct EmbeddingEngine {
    config: EmbeddingConfig,
    seed: u64,
}

impl EmbeddingEngine {
    pub fn new(config: EmbeddingConfig, seed: u64) -> Self {
        Self { config, seed }
    }

    /// Walk the graph and train vectors for every node that appears in a walk
    pub fn compute(&self, store: &GraphStore) -> EmbedResult<Embeddings> {
        self.config.validate()?;

        let view = build_view(store);
        if view.node_count == 0 {
            return Ok(Embeddings::from_vectors(self.config.dimensions, HashMap::new()));
        }

        let started = Instant::now();
        let walks = weighted_random_walks(&view, &self.config.walk_config(), self.seed)
            .map_err(|e| EmbedError::WorkerPool(e.to_string()))?;
        debug!(
            "Generated {} walks over {} nodes in {:?}",
            walks.len(),
            view.node_count,
            started.elapsed()
        );

        let trained = train_skip_gram(
            &walks,
            view.node_count,
            &self.config.skip_gram_config(),
            self.seed.rotate_left(17),
        );

        let vectors: HashMap<NodeId, Vec<f32>> = trained
            .into_iter()
            .enumerate()
            .filter_map(|(idx, vector)| vector.map(|v| (NodeId::new(view.index_to_node[idx]), v)))
            .collect();

        info!(
            "Computed {} embeddings (dim {}) in {:?}",
            vectors.len(),
            self.config.dimensions,
            started.elapsed()
        );
        Ok(Embeddings::from_vectors(self.config.dimensions, vectors))
    }
}
