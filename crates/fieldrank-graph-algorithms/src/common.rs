//! Shared utilities for graph algorithms
//!
//! Provides a read-only, optimized view of the graph topology for algorithm execution.

use std::collections::HashMap;

/// Node Identifier type (u64)
pub type NodeId = u64;

/// A dense, integer-indexed view of an undirected weighted graph in Compressed
/// Sparse Row (CSR) format.
///
/// Every undirected edge is stored twice, once in each endpoint's neighbor slice.
#[derive(Debug, Clone)]
pub struct GraphView {
    /// Number of nodes
    pub node_count: usize,
    /// Mapping from dense index (0..N) back to NodeId
    pub index_to_node: Vec<NodeId>,
    /// Mapping from NodeId to dense index
    pub node_to_index: HashMap<NodeId, usize>,

    /// Offsets into `targets`. Size = node_count + 1
    pub offsets: Vec<usize>,
    /// Contiguous array of neighbor indices
    pub targets: Vec<usize>,
    /// Edge weights, aligned with `targets`
    pub weights: Vec<f64>,
    /// Running sum of `weights` within each node's slice, used for weighted sampling
    pub cumulative: Vec<f64>,
}

impl GraphView {
    /// Number of neighbors of a node (by index)
    pub fn degree(&self, idx: usize) -> usize {
        self.offsets[idx + 1] - self.offsets[idx]
    }

    /// Neighbors of a node
    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.targets[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// Weights of a node's edges, aligned with `neighbors`
    pub fn weights(&self, idx: usize) -> &[f64] {
        &self.weights[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// Sum of a node's edge weights
    pub fn total_weight(&self, idx: usize) -> f64 {
        let (start, end) = (self.offsets[idx], self.offsets[idx + 1]);
        if start == end {
            0.0
        } else {
            self.cumulative[end - 1]
        }
    }

    /// Pick the neighbor whose cumulative weight interval contains `draw`,
    /// where `draw` lies in `[0, total_weight(idx))`.
    pub fn neighbor_at(&self, idx: usize, draw: f64) -> Option<usize> {
        let (start, end) = (self.offsets[idx], self.offsets[idx + 1]);
        if start == end {
            return None;
        }
        let slice = &self.cumulative[start..end];
        let pos = slice.partition_point(|&c| c <= draw).min(slice.len() - 1);
        Some(self.targets[start + pos])
    }

    /// Build a view from undirected weighted adjacency lists.
    ///
    /// `adjacency[i]` holds `(neighbor index, weight)` pairs and must already be symmetric.
    /// Non-positive or non-finite weights are dropped.
    pub fn from_adjacency_list(
        index_to_node: Vec<NodeId>,
        adjacency: Vec<Vec<(usize, f64)>>,
    ) -> Self {
        let node_count = index_to_node.len();
        let node_to_index = index_to_node
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();

        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut targets = Vec::new();
        let mut weights = Vec::new();
        let mut cumulative = Vec::new();

        offsets.push(0);
        for neighbors in adjacency.into_iter().take(node_count) {
            let mut running = 0.0;
            for (target, weight) in neighbors {
                if target >= node_count || !weight.is_finite() || weight <= 0.0 {
                    continue;
                }
                running += weight;
                targets.push(target);
                weights.push(weight);
                cumulative.push(running);
            }
            offsets.push(targets.len());
        }
        while offsets.len() < node_count + 1 {
            offsets.push(targets.len());
        }

        GraphView {
            node_count,
            index_to_node,
            node_to_index,
            offsets,
            targets,
            weights,
            cumulative,
        }
    }
}
