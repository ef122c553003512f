//! Bipartite author/field graph
//!
//! - Author and Field nodes, identified by display name / field label
//! - Undirected Author–Field edges weighted 1.0 (declared) or 0.5 (discovered)
//! - No Author–Author or Field–Field edges; authors relate only through shared fields

pub mod edge;
pub mod node;
pub mod store;
pub mod types;

// Re-export main types
pub use edge::Edge;
pub use node::Node;
pub use store::{GraphError, GraphResult, GraphStore};
pub use types::{EdgeId, EdgeWeight, NodeId, NodeKind};
