//! Records crossing the engine boundary
//!
//! Inputs (target authors, field-search stubs) are validated here so that the
//! graph, embedding and ranking code only ever sees trimmed, non-empty names.
//! Output types serialize to the payload shape consumed by the presentation layer.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A user-supplied seed author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAuthor {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Fields of Study", default)]
    pub fields_of_study: Vec<String>,

    #[serde(rename = "Profile Link", default, skip_serializing_if = "String::is_empty")]
    pub profile_ref: String,
}

impl TargetAuthor {
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields_of_study: fields.into_iter().map(Into::into).collect(),
            profile_ref: String::new(),
        }
    }

    /// Trim the name and field labels; `None` if the name is empty.
    /// Empty field labels are dropped, duplicates are kept (they count towards field weights).
    pub fn normalized(self) -> Option<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return None;
        }
        let fields_of_study = self
            .fields_of_study
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();
        Some(Self {
            name,
            fields_of_study,
            profile_ref: self.profile_ref.trim().to_string(),
        })
    }
}

/// Validate a raw target list, dropping unusable entries
pub fn normalize_targets(raw: impl IntoIterator<Item = TargetAuthor>) -> Vec<TargetAuthor> {
    raw.into_iter().filter_map(TargetAuthor::normalized).collect()
}

/// An author as returned by a field search
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorStub {
    #[serde(alias = "Name")]
    pub name: String,

    /// Opaque locator in the external system, may be empty
    #[serde(default, alias = "Profile Link", alias = "profile_link")]
    pub profile_ref: String,
}

impl AuthorStub {
    pub fn new(name: impl Into<String>, profile_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile_ref: profile_ref.into(),
        }
    }

    pub fn normalized(self) -> Option<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            None
        } else {
            Some(Self {
                name,
                profile_ref: self.profile_ref.trim().to_string(),
            })
        }
    }
}

/// Field label -> authors discovered for it, ordered by field label
pub type FieldResults = BTreeMap<String, Vec<AuthorStub>>;

/// A field of interest and its occurrence count among target authors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWeight {
    pub field: String,
    #[serde(deserialize_with = "coerce_weight")]
    pub weight: u32,
}

impl FieldWeight {
    pub fn new(field: impl Into<String>, weight: u32) -> Self {
        Self {
            field: field.into(),
            weight,
        }
    }
}

/// Accept integers, floats and numeric strings; anything else becomes 0
fn coerce_weight<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(weight_from_value(&raw))
}

pub(crate) fn weight_from_value(raw: &serde_json::Value) -> u32 {
    let as_float = match raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        serde_json::Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    match as_float {
        Some(f) if f.is_finite() && f > 0.0 => f.round().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

/// One recommended author in the output payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedAuthor {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Profile Link")]
    pub profile_link: String,
    #[serde(rename = "Reason")]
    pub reason: String,
}

/// A titled group of recommended authors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorGroup {
    #[serde(rename = "Subheading")]
    pub subheading: String,
    #[serde(rename = "Authors")]
    pub authors: Vec<RecommendedAuthor>,
}

/// Final payload handed to the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationPayload {
    #[serde(rename = "Recommended Authors")]
    pub recommended_authors: Vec<AuthorGroup>,
    #[serde(rename = "Authors by Weighted Fields")]
    pub authors_by_weighted_fields: Vec<AuthorGroup>,
}
