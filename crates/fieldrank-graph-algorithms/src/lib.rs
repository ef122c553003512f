pub mod common;
pub mod walk;
pub mod skipgram;

pub use common::{GraphView, NodeId};
pub use walk::{default_workers, random_walk, weighted_random_walks, RandomWalkConfig, Walk};
pub use skipgram::{train_skip_gram, SkipGramConfig};
