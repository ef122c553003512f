//! Author and Field nodes

use super::types::{NodeId, NodeKind};
use serde::{Deserialize, Serialize};

/// A node in the author/field graph
///
/// Identity is `(kind, name)`: an author's display name (case-sensitive) or a
/// field label. Fields never carry a profile reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    /// External profile locator, empty when unknown
    pub profile_ref: String,
}

impl Node {
    pub fn author(id: NodeId, name: impl Into<String>, profile_ref: impl Into<String>) -> Self {
        Node {
            id,
            kind: NodeKind::Author,
            name: name.into(),
            profile_ref: profile_ref.into(),
        }
    }

    pub fn field(id: NodeId, label: impl Into<String>) -> Self {
        Node {
            id,
            kind: NodeKind::Field,
            name: label.into(),
            profile_ref: String::new(),
        }
    }

    pub fn is_author(&self) -> bool {
        self.kind == NodeKind::Author
    }

    pub fn is_field(&self) -> bool {
        self.kind == NodeKind::Field
    }
}
