//! In-memory bipartite graph storage
//!
//! Nodes and edges live in arenas indexed by id; identity indices map author
//! names and field labels to node ids so every insert is an upsert.

use super::edge::Edge;
use super::node::Node;
use super::types::{EdgeId, EdgeWeight, NodeId, NodeKind};
use crate::models::{FieldResults, TargetAuthor};
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Invalid edge: {0} is not an author node")]
    NotAnAuthor(NodeId),

    #[error("Invalid edge: {0} is not a field node")]
    NotAField(NodeId),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Undirected weighted Author/Field graph
///
/// - nodes: arena, `NodeId(n)` lives at index `n - 1`
/// - edges: arena, `EdgeId(n)` lives at index `n - 1`
/// - adjacency: per-node edge ids in insertion order
/// - authors / fields: identity indices
/// - edge_index: (author, field) -> edge, enforcing one edge per pair
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<EdgeId>>,
    authors: FxHashMap<String, NodeId>,
    fields: FxHashMap<String, NodeId>,
    edge_index: FxHashMap<(NodeId, NodeId), EdgeId>,
}

impl GraphStore {
    /// Create a new empty graph store
    pub fn new() -> Self {
        Self::default()
    }

    fn next_node_id(&self) -> NodeId {
        NodeId::new(self.nodes.len() as u64 + 1)
    }

    fn slot(id: NodeId) -> usize {
        (id.as_u64() as usize).wrapping_sub(1)
    }

    /// Add an author node, or return the existing one with the same name.
    /// A known author without a profile reference picks up a non-empty one.
    pub fn upsert_author(&mut self, name: &str, profile_ref: &str) -> NodeId {
        if let Some(&id) = self.authors.get(name) {
            let node = &mut self.nodes[Self::slot(id)];
            if node.profile_ref.is_empty() && !profile_ref.is_empty() {
                node.profile_ref = profile_ref.to_string();
            }
            return id;
        }

        let id = self.next_node_id();
        self.nodes.push(Node::author(id, name, profile_ref));
        self.adjacency.push(Vec::new());
        self.authors.insert(name.to_string(), id);
        id
    }

    /// Add a field node (label trimmed), or return the existing one
    pub fn upsert_field(&mut self, label: &str) -> NodeId {
        let label = label.trim();
        if let Some(&id) = self.fields.get(label) {
            return id;
        }

        let id = self.next_node_id();
        self.nodes.push(Node::field(id, label));
        self.adjacency.push(Vec::new());
        self.fields.insert(label.to_string(), id);
        id
    }

    pub fn author_id(&self, name: &str) -> Option<NodeId> {
        self.authors.get(name).copied()
    }

    pub fn field_id(&self, label: &str) -> Option<NodeId> {
        self.fields.get(label.trim()).copied()
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(Self::slot(id))
    }

    /// Connect an author to a field
    ///
    /// At most one edge exists per pair. Reconnecting an existing pair keeps the
    /// stronger weight, so a declared edge is never weakened by a discovery.
    pub fn connect(
        &mut self,
        author: NodeId,
        field: NodeId,
        weight: EdgeWeight,
    ) -> GraphResult<EdgeId> {
        match self.get_node(author) {
            None => return Err(GraphError::NodeNotFound(author)),
            Some(node) if node.kind != NodeKind::Author => {
                return Err(GraphError::NotAnAuthor(author))
            }
            _ => {}
        }
        match self.get_node(field) {
            None => return Err(GraphError::NodeNotFound(field)),
            Some(node) if node.kind != NodeKind::Field => return Err(GraphError::NotAField(field)),
            _ => {}
        }

        if let Some(&edge_id) = self.edge_index.get(&(author, field)) {
            let edge = &mut self.edges[(edge_id.as_u64() - 1) as usize];
            if weight > edge.weight {
                edge.weight = weight;
            }
            return Ok(edge_id);
        }

        let edge_id = EdgeId::new(self.edges.len() as u64 + 1);
        self.edges.push(Edge::new(edge_id, author, field, weight));
        self.adjacency[Self::slot(author)].push(edge_id);
        self.adjacency[Self::slot(field)].push(edge_id);
        self.edge_index.insert((author, field), edge_id);
        Ok(edge_id)
    }

    pub fn edge_between(&self, author: NodeId, field: NodeId) -> Option<&Edge> {
        self.edge_index
            .get(&(author, field))
            .map(|id| &self.edges[(id.as_u64() - 1) as usize])
    }

    /// Neighbors of a node with the connecting edge weight, in edge insertion order
    pub fn neighbors(&self, id: NodeId) -> Vec<(&Node, EdgeWeight)> {
        let Some(edge_ids) = self.adjacency.get(Self::slot(id)) else {
            return Vec::new();
        };
        edge_ids
            .iter()
            .filter_map(|edge_id| {
                let edge = &self.edges[(edge_id.as_u64() - 1) as usize];
                let other = edge.other(id)?;
                self.get_node(other).map(|node| (node, edge.weight))
            })
            .collect()
    }

    /// Labels of the fields an author is connected to
    pub fn fields_of(&self, author: NodeId) -> Vec<String> {
        self.neighbors(author)
            .into_iter()
            .filter(|(node, _)| node.is_field())
            .map(|(node, _)| node.name.clone())
            .collect()
    }

    pub fn all_nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn all_edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn authors(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_author())
    }

    pub fn fields(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_field())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Populate the graph from target authors and field-search results
    ///
    /// Declared fields come first and create Field nodes with weight-1.0 edges.
    /// Discovered authors are attached with weight 0.5, and only to fields that
    /// already exist; a discovery never creates a Field node. Rebuilding with the
    /// same inputs changes nothing.
    pub fn build(
        &mut self,
        targets: &[TargetAuthor],
        field_results: &FieldResults,
    ) -> GraphResult<()> {
        for target in targets {
            let author = self.upsert_author(&target.name, &target.profile_ref);
            for label in &target.fields_of_study {
                let field = self.upsert_field(label);
                self.connect(author, field, EdgeWeight::Declared)?;
            }
        }

        for (label, stubs) in field_results {
            let Some(field) = self.field_id(label) else {
                debug!(
                    "Skipping {} discovered authors for undeclared field '{}'",
                    stubs.len(),
                    label
                );
                continue;
            };
            for stub in stubs {
                let author = self.upsert_author(&stub.name, &stub.profile_ref);
                self.connect(author, field, EdgeWeight::Discovered)?;
            }
        }

        debug!("Graph built: {} nodes, {} edges", self.node_count(), self.edge_count());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthorStub;
    use std::collections::HashSet;

    fn results(entries: &[(&str, &[&str])]) -> FieldResults {
        entries
            .iter()
            .map(|(field, names)| {
                (
                    field.to_string(),
                    names.iter().map(|n| AuthorStub::new(*n, format!("/profile/{}", n))).collect(),
                )
            })
            .collect()
    }

    fn assert_no_duplicates(store: &GraphStore) {
        let mut identities = HashSet::new();
        for node in store.all_nodes() {
            assert!(identities.insert((node.kind, node.name.clone())), "duplicate node {:?}", node);
        }
        let mut pairs = HashSet::new();
        for edge in store.all_edges() {
            assert!(pairs.insert((edge.author, edge.field)), "duplicate edge {:?}", edge);
        }
    }

    #[test]
    fn test_upsert_is_identity_based() {
        let mut store = GraphStore::new();
        let a = store.upsert_author("Jane Doe", "");
        let b = store.upsert_author("Jane Doe", "/profile/1");
        assert_eq!(a, b);
        assert_eq!(store.get_node(a).unwrap().profile_ref, "/profile/1");

        // Case-sensitive author identity
        let c = store.upsert_author("jane doe", "");
        assert_ne!(a, c);

        let f = store.upsert_field(" Data Science ");
        assert_eq!(store.upsert_field("Data Science"), f);
        assert_eq!(store.get_node(f).unwrap().name, "Data Science");
        assert_eq!(store.node_count(), 3);
    }

    #[test]
    fn test_connect_validates_endpoints() {
        let mut store = GraphStore::new();
        let a = store.upsert_author("A", "");
        let f = store.upsert_field("F");
        assert_eq!(store.connect(f, a, EdgeWeight::Declared), Err(GraphError::NotAnAuthor(f)));
        assert_eq!(store.connect(a, a, EdgeWeight::Declared), Err(GraphError::NotAField(a)));
        assert_eq!(
            store.connect(a, NodeId::new(99), EdgeWeight::Declared),
            Err(GraphError::NodeNotFound(NodeId::new(99)))
        );
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_declared_edge_is_never_weakened() {
        let mut store = GraphStore::new();
        let a = store.upsert_author("A", "");
        let f = store.upsert_field("F");
        let e1 = store.connect(a, f, EdgeWeight::Discovered).unwrap();
        let e2 = store.connect(a, f, EdgeWeight::Declared).unwrap();
        let e3 = store.connect(a, f, EdgeWeight::Discovered).unwrap();
        assert_eq!(e1, e2);
        assert_eq!(e2, e3);
        assert_eq!(store.edge_between(a, f).unwrap().weight, EdgeWeight::Declared);
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn test_build_single_target() {
        let mut store = GraphStore::new();
        let targets = vec![TargetAuthor::new("Jane Doe", ["Artificial Intelligence"])];
        let fetched = results(&[("Artificial Intelligence", &["A. Smith", "B. Lee"])]);
        store.build(&targets, &fetched).unwrap();

        assert_eq!(store.authors().count(), 3);
        assert_eq!(store.fields().count(), 1);
        assert_eq!(store.edge_count(), 3);

        let ai = store.field_id("Artificial Intelligence").unwrap();
        let jane = store.author_id("Jane Doe").unwrap();
        let smith = store.author_id("A. Smith").unwrap();
        let lee = store.author_id("B. Lee").unwrap();
        assert_eq!(store.edge_between(jane, ai).unwrap().weight.value(), 1.0);
        assert_eq!(store.edge_between(smith, ai).unwrap().weight.value(), 0.5);
        assert_eq!(store.edge_between(lee, ai).unwrap().weight.value(), 0.5);
        assert_eq!(store.get_node(smith).unwrap().profile_ref, "/profile/A. Smith");
    }

    #[test]
    fn test_target_discovered_for_own_field_keeps_declared_weight() {
        let mut store = GraphStore::new();
        let targets = vec![TargetAuthor::new("Jane Doe", ["AI"])];
        let fetched = results(&[("AI", &["Jane Doe", "B. Lee"])]);
        store.build(&targets, &fetched).unwrap();

        let jane = store.author_id("Jane Doe").unwrap();
        let ai = store.field_id("AI").unwrap();
        assert_eq!(store.edge_between(jane, ai).unwrap().weight, EdgeWeight::Declared);
        assert_no_duplicates(&store);
    }

    #[test]
    fn test_discoveries_never_create_fields() {
        let mut store = GraphStore::new();
        let targets = vec![TargetAuthor::new("Jane Doe", ["AI"])];
        let fetched = results(&[("AI", &["A. Smith"]), ("Cloud Computing", &["C. Wu"])]);
        store.build(&targets, &fetched).unwrap();

        assert!(store.field_id("Cloud Computing").is_none());
        assert!(store.author_id("C. Wu").is_none());
        assert_eq!(store.fields().count(), 1);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut store = GraphStore::new();
        let targets = vec![
            TargetAuthor::new("Jane Doe", ["AI", "ML"]),
            TargetAuthor::new("John Smith", ["ML", "ML"]),
        ];
        let fetched = results(&[("AI", &["A", "B"]), ("ML", &["B", "C", "Jane Doe"])]);
        store.build(&targets, &fetched).unwrap();
        let (nodes, edges) = (store.node_count(), store.edge_count());

        store.build(&targets, &fetched).unwrap();
        assert_eq!(store.node_count(), nodes);
        assert_eq!(store.edge_count(), edges);
        assert_no_duplicates(&store);

        let b = store.author_id("B").unwrap();
        assert_eq!(store.fields_of(b), vec!["AI".to_string(), "ML".to_string()]);
    }

    #[test]
    fn test_no_author_author_edges() {
        let mut store = GraphStore::new();
        let targets = vec![TargetAuthor::new("Jane Doe", ["AI"])];
        store.build(&targets, &results(&[("AI", &["A", "B"])])).unwrap();
        for edge in store.all_edges() {
            assert!(store.get_node(edge.author).unwrap().is_author());
            assert!(store.get_node(edge.field).unwrap().is_field());
        }
    }
}
