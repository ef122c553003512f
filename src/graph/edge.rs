//! Undirected Author–Field edges

use super::types::{EdgeId, EdgeWeight, NodeId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub author: NodeId,
    pub field: NodeId,
    pub weight: EdgeWeight,
}

impl Edge {
    pub fn new(id: EdgeId, author: NodeId, field: NodeId, weight: EdgeWeight) -> Self {
        Edge { id, author, field, weight }
    }

    /// The endpoint opposite to `node`, if `node` is an endpoint at all
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if node == self.author {
            Some(self.field)
        } else if node == self.field {
            Some(self.author)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_endpoint() {
        let edge = Edge::new(EdgeId::new(1), NodeId::new(3), NodeId::new(9), EdgeWeight::Declared);
        assert_eq!(edge.other(NodeId::new(3)), Some(NodeId::new(9)));
        assert_eq!(edge.other(NodeId::new(9)), Some(NodeId::new(3)));
        assert_eq!(edge.other(NodeId::new(4)), None);
    }
}
