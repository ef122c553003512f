//! Field relatedness learned from search results
//!
//! Two fields are related when at least one author was discovered for both.

use crate::models::AuthorStub;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default, Clone)]
pub struct FieldOntology {
    fields: BTreeMap<String, BTreeSet<String>>,
}

impl FieldOntology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the authors discovered for `field`
    pub fn update(&mut self, field: &str, authors: &[AuthorStub]) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .extend(authors.iter().map(|a| a.name.clone()));
    }

    /// Other fields sharing at least one author with `field`, sorted
    pub fn related_fields(&self, field: &str) -> Vec<String> {
        let Some(authors) = self.fields.get(field) else {
            return Vec::new();
        };
        self.fields
            .iter()
            .filter(|(other, other_authors)| {
                other.as_str() != field && !authors.is_disjoint(other_authors)
            })
            .map(|(other, _)| other.clone())
            .collect()
    }

    pub fn authors_of(&self, field: &str) -> Option<&BTreeSet<String>> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
