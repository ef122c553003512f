//! Fields of interest for a target-author set

use crate::models::{FieldWeight, TargetAuthor};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Topics used when the targets declare fewer than `top_k` distinct fields
pub const DEFAULT_FIELDS: [&str; 5] = [
    "Artificial Intelligence",
    "Data Science",
    "Cybersecurity",
    "Software Engineering",
    "Cloud Computing",
];

/// Number of weighted fields returned by default
pub const DEFAULT_TOP_FIELDS: usize = 5;

/// Top-`top_k` fields by occurrence count among the targets' declared fields
///
/// Equal counts keep first-encounter order. Remaining slots are filled from
/// [`DEFAULT_FIELDS`] with weight 1, skipping defaults already present
/// (case-insensitive).
pub fn weighted_fields(targets: &[TargetAuthor], top_k: usize) -> Vec<FieldWeight> {
    let mut counts: IndexMap<&str, u32> = IndexMap::new();
    for field in targets.iter().flat_map(|t| t.fields_of_study.iter()) {
        *counts.entry(field.as_str()).or_insert(0) += 1;
    }

    let mut combined: Vec<FieldWeight> = counts
        .into_iter()
        .map(|(field, count)| FieldWeight::new(field, count))
        .collect();

    let present: HashSet<String> = combined.iter().map(|w| w.field.to_lowercase()).collect();
    for default in DEFAULT_FIELDS {
        if !present.contains(&default.to_lowercase()) {
            combined.push(FieldWeight::new(default, 1));
        }
    }

    // Stable: ties keep insertion order, defaults trail declared fields
    combined.sort_by(|a, b| b.weight.cmp(&a.weight));
    combined.truncate(top_k);
    combined
}
