//! Graph algorithms module
//!
//! Algorithms are implemented in the `fieldrank-graph-algorithms` crate.
//! This module provides the integration/adapter layer.

use crate::graph::GraphStore;
use fieldrank_graph_algorithms::{GraphView, NodeId as AlgoNodeId};

// Re-export algorithms
pub use fieldrank_graph_algorithms::{
    default_workers, random_walk, train_skip_gram, weighted_random_walks, RandomWalkConfig,
    SkipGramConfig, Walk,
};

/// Build an undirected weighted GraphView from the store
///
/// Dense indices follow node insertion order, so identical graphs produce
/// identical views.
pub fn build_view(store: &GraphStore) -> GraphView {
    let nodes = store.all_nodes();
    let index_to_node: Vec<AlgoNodeId> = nodes.iter().map(|n| n.id.as_u64()).collect();
    let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); nodes.len()];

    let index_of = |id: crate::graph::NodeId| (id.as_u64() - 1) as usize;
    for edge in store.all_edges() {
        let (a, f) = (index_of(edge.author), index_of(edge.field));
        let w = edge.weight.value();
        adjacency[a].push((f, w));
        adjacency[f].push((a, w));
    }

    GraphView::from_adjacency_list(index_to_node, adjacency)
}
