//! Candidate ranking
//!
//! Candidates are ordered by `(overlap_score, field_count, similarity,
//! max field weight)`, then a greedy pass prefers candidates that bring a field
//! not yet covered, and the remaining slots are backfilled in sorted order.

use crate::embed::Embeddings;
use crate::graph::{GraphStore, NodeId};
use crate::models::{FieldWeight, RecommendedAuthor, TargetAuthor};
use ndarray::{Array2, Axis};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A ranked candidate author
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub author: NodeId,
    pub name: String,
    pub profile_ref: String,
    /// Labels of the candidate's Field neighbors, in edge insertion order
    pub fields: Vec<String>,
    /// Mean dot product against the target embeddings
    pub similarity: f32,
    /// Candidate fields that some target author declared
    pub overlap_score: usize,
    pub field_count: usize,
    /// Highest weight among the candidate's fields, 0 without fields
    pub max_field_weight: u32,
    pub reason: String,
}

impl From<&Recommendation> for RecommendedAuthor {
    fn from(rec: &Recommendation) -> Self {
        RecommendedAuthor {
            name: rec.name.clone(),
            profile_link: rec.profile_ref.clone(),
            reason: rec.reason.clone(),
        }
    }
}

/// Ranks the authors of one graph against a target set
pub struct Ranker<'a> {
    store: &'a GraphStore,
    embeddings: &'a Embeddings,
    field_weights: HashMap<&'a str, u32>,
}

impl<'a> Ranker<'a> {
    pub fn new(
        store: &'a GraphStore,
        embeddings: &'a Embeddings,
        field_weights: &'a [FieldWeight],
    ) -> Self {
        Self {
            store,
            embeddings,
            field_weights: field_weights.iter().map(|w| (w.field.as_str(), w.weight)).collect(),
        }
    }

    /// Up to `max_recommendations` candidates, diversity picks first, then backfill
    ///
    /// Returns an empty list when no target or no candidate has an embedding.
    pub fn rank(
        &self,
        targets: &[TargetAuthor],
        max_recommendations: usize,
    ) -> Vec<Recommendation> {
        if max_recommendations == 0 {
            return Vec::new();
        }

        let target_vectors: Vec<&[f32]> = targets
            .iter()
            .filter_map(|t| self.store.author_id(&t.name))
            .filter_map(|id| self.embeddings.get(id))
            .collect();
        let target_names: HashSet<&str> = targets.iter().map(|t| t.name.as_str()).collect();

        let candidates: Vec<(NodeId, &[f32])> = self
            .store
            .authors()
            .filter(|node| !target_names.contains(node.name.as_str()))
            .filter_map(|node| self.embeddings.get(node.id).map(|v| (node.id, v)))
            .collect();

        if target_vectors.is_empty() || candidates.is_empty() {
            debug!(
                "Nothing to rank: {} usable targets, {} usable candidates",
                target_vectors.len(),
                candidates.len()
            );
            return Vec::new();
        }

        let similarities = mean_similarities(&target_vectors, &candidates);
        let declared: HashSet<&str> = targets
            .iter()
            .flat_map(|t| t.fields_of_study.iter().map(String::as_str))
            .collect();

        let mut scored: Vec<Recommendation> = candidates
            .iter()
            .zip(similarities)
            .filter_map(|(&(id, _), similarity)| {
                let node = self.store.get_node(id)?;
                let fields = self.store.fields_of(id);
                let overlap_score = fields.iter().filter(|f| declared.contains(f.as_str())).count();
                let max_field_weight = fields
                    .iter()
                    .map(|f| self.field_weights.get(f.as_str()).copied().unwrap_or(0))
                    .max()
                    .unwrap_or(0);
                Some(Recommendation {
                    author: id,
                    name: node.name.clone(),
                    profile_ref: node.profile_ref.clone(),
                    field_count: fields.len(),
                    fields,
                    similarity,
                    overlap_score,
                    max_field_weight,
                    reason: String::new(),
                })
            })
            .collect();

        scored.sort_by(compare_candidates);

        let mut picked = select_diverse(&scored, max_recommendations);
        for rec in &mut picked {
            rec.reason = explain(rec, targets);
        }
        picked
    }
}

/// Mean of `candidate · target` over all targets, per candidate
fn mean_similarities(targets: &[&[f32]], candidates: &[(NodeId, &[f32])]) -> Vec<f32> {
    let dim = targets[0].len();
    let to_matrix = |rows: Vec<&[f32]>| -> Array2<f32> {
        let n = rows.len();
        let flat: Vec<f32> = rows
            .into_iter()
            .flat_map(|row| (0..dim).map(move |k| row.get(k).copied().unwrap_or(0.0)))
            .collect();
        Array2::from_shape_vec((n, dim), flat).unwrap_or_else(|_| Array2::zeros((n, dim)))
    };

    let t = to_matrix(targets.to_vec());
    let c = to_matrix(candidates.iter().map(|(_, v)| *v).collect());
    let products = c.dot(&t.t());
    match products.mean_axis(Axis(1)) {
        Some(means) => means.to_vec(),
        None => vec![0.0; candidates.len()],
    }
}

/// Descending by overlap, field count, similarity, then max field weight
fn compare_candidates(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.overlap_score
        .cmp(&a.overlap_score)
        .then_with(|| b.field_count.cmp(&a.field_count))
        .then_with(|| b.similarity.total_cmp(&a.similarity))
        .then_with(|| b.max_field_weight.cmp(&a.max_field_weight))
}

/// Greedy field coverage over the sorted list, then sorted backfill
fn select_diverse(sorted: &[Recommendation], max_recommendations: usize) -> Vec<Recommendation> {
    let mut covered: HashSet<&str> = HashSet::new();
    let mut accepted: Vec<usize> = Vec::new();

    for (idx, rec) in sorted.iter().enumerate() {
        if accepted.len() >= max_recommendations {
            break;
        }
        if rec.fields.iter().any(|f| !covered.contains(f.as_str())) {
            covered.extend(rec.fields.iter().map(String::as_str));
            accepted.push(idx);
        }
    }

    let diverse = accepted.len();
    if diverse < max_recommendations {
        let taken: HashSet<usize> = accepted.iter().copied().collect();
        let backfill: Vec<usize> = (0..sorted.len())
            .filter(|idx| !taken.contains(idx))
            .take(max_recommendations - diverse)
            .collect();
        accepted.extend(backfill);
    }
    debug!("Selected {} diverse + {} backfilled candidates", diverse, accepted.len() - diverse);

    accepted.into_iter().map(|idx| sorted[idx].clone()).collect()
}

fn explain(rec: &Recommendation, targets: &[TargetAuthor]) -> String {
    for target in targets {
        let shared: Vec<&str> = rec
            .fields
            .iter()
            .filter(|f| target.fields_of_study.contains(f))
            .map(String::as_str)
            .collect();
        if !shared.is_empty() {
            return format!(
                "'{}' specializes in {} alongside '{}' and has made notable contributions in this area.",
                rec.name,
                shared.join(", "),
                target.name
            );
        }
    }

    if !rec.fields.is_empty() {
        return format!(
            "'{}' has made significant contributions in {}, which align with your interests.",
            rec.name,
            rec.fields.join(", ")
        );
    }

    format!("'{}' is a recognized expert in relevant areas.", rec.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeWeight;

    struct Fixture {
        store: GraphStore,
        vectors: HashMap<NodeId, Vec<f32>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self { store: GraphStore::new(), vectors: HashMap::new() }
        }

        fn target(&mut self, name: &str, fields: &[&str], vector: [f32; 2]) {
            let id = self.store.upsert_author(name, "");
            for f in fields {
                let field = self.store.upsert_field(f);
                self.store.connect(id, field, EdgeWeight::Declared).unwrap();
            }
            self.vectors.insert(id, vector.to_vec());
        }

        fn candidate(&mut self, name: &str, fields: &[&str], vector: Option<[f32; 2]>) {
            let id = self.store.upsert_author(name, &format!("/profile/{}", name));
            for f in fields {
                let field = self.store.upsert_field(f);
                self.store.connect(id, field, EdgeWeight::Discovered).unwrap();
            }
            if let Some(v) = vector {
                self.vectors.insert(id, v.to_vec());
            }
        }

        fn embeddings(&self) -> Embeddings {
            Embeddings::from_vectors(2, self.vectors.clone())
        }
    }

    fn names(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_sort_priority_and_backfill() {
        let mut fx = Fixture::new();
        fx.target("T", &["AI", "ML"], [1.0, 0.0]);
        fx.candidate("a", &["AI"], Some([0.9, 0.0]));
        fx.candidate("b", &["AI"], Some([0.5, 0.0]));
        fx.candidate("c", &["ML"], Some([0.1, 0.0]));
        fx.candidate("d", &["AI", "ML"], Some([0.0, 1.0]));
        let targets = vec![TargetAuthor::new("T", ["AI", "ML"])];
        let embeddings = fx.embeddings();
        let ranker = Ranker::new(&fx.store, &embeddings, &[]);

        // d covers both fields, so nothing else adds coverage; a and b are backfilled
        let recs = ranker.rank(&targets, 3);
        assert_eq!(names(&recs), vec!["d", "a", "b"]);
        assert_eq!(recs[0].overlap_score, 2);
        assert_eq!(recs[0].field_count, 2);

        let all = ranker.rank(&targets, 10);
        assert_eq!(names(&all), vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn test_diversity_pass_prefers_new_fields() {
        let mut fx = Fixture::new();
        fx.target("T", &["AI", "ML"], [1.0, 0.0]);
        fx.target("U", &["DB"], [1.0, 0.0]);
        fx.candidate("a", &["AI"], Some([0.9, 0.0]));
        fx.candidate("b", &["AI"], Some([0.8, 0.0]));
        fx.candidate("c", &["ML"], Some([0.1, 0.0]));
        fx.candidate("e", &["DB"], Some([0.05, 0.0]));
        let targets = vec![TargetAuthor::new("T", ["AI", "ML"]), TargetAuthor::new("U", ["DB"])];
        let embeddings = fx.embeddings();
        let recs = Ranker::new(&fx.store, &embeddings, &[]).rank(&targets, 3);

        assert_eq!(names(&recs), vec!["a", "c", "e"]);
        let mut seen = HashSet::new();
        for rec in &recs {
            assert!(rec.fields.iter().any(|f| seen.insert(f.clone())));
        }
    }

    #[test]
    fn test_field_weight_breaks_remaining_ties() {
        let mut fx = Fixture::new();
        fx.target("T", &["AI", "ML"], [1.0, 0.0]);
        fx.candidate("x", &["AI"], Some([0.5, 0.0]));
        fx.candidate("y", &["ML"], Some([0.5, 0.0]));
        let targets = vec![TargetAuthor::new("T", ["AI", "ML"])];
        let embeddings = fx.embeddings();

        let ml_heavy = vec![FieldWeight::new("ML", 3), FieldWeight::new("AI", 1)];
        let recs = Ranker::new(&fx.store, &embeddings, &ml_heavy).rank(&targets, 2);
        assert_eq!(names(&recs), vec!["y", "x"]);
        assert_eq!(recs[0].max_field_weight, 3);

        let ai_heavy = vec![FieldWeight::new("AI", 3), FieldWeight::new("ML", 1)];
        let recs = Ranker::new(&fx.store, &embeddings, &ai_heavy).rank(&targets, 2);
        assert_eq!(names(&recs), vec!["x", "y"]);
    }

    #[test]
    fn test_similarity_is_mean_dot_product() {
        let mut fx = Fixture::new();
        fx.target("T", &["AI"], [1.0, 0.0]);
        fx.target("U", &["AI"], [0.0, 2.0]);
        fx.candidate("a", &["AI"], Some([3.0, 1.0]));
        let targets = vec![TargetAuthor::new("T", ["AI"]), TargetAuthor::new("U", ["AI"])];
        let embeddings = fx.embeddings();
        let recs = Ranker::new(&fx.store, &embeddings, &[]).rank(&targets, 5);
        assert_eq!(recs.len(), 1);
        // (3 + 2) / 2
        assert!((recs[0].similarity - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_targets_and_missing_embeddings_are_excluded() {
        let mut fx = Fixture::new();
        fx.target("Jane Doe", &["AI"], [1.0, 0.0]);
        fx.candidate("with", &["AI"], Some([0.3, 0.0]));
        fx.candidate("without", &["AI"], None);
        let targets = vec![TargetAuthor::new("Jane Doe", ["AI"])];
        let embeddings = fx.embeddings();
        let recs = Ranker::new(&fx.store, &embeddings, &[]).rank(&targets, 5);
        assert_eq!(names(&recs), vec!["with"]);
    }

    #[test]
    fn test_no_usable_embeddings_yields_empty() {
        let mut fx = Fixture::new();
        fx.target("T", &["AI"], [1.0, 0.0]);
        fx.candidate("a", &["AI"], Some([1.0, 0.0]));
        let targets = vec![TargetAuthor::new("T", ["AI"])];

        let empty = Embeddings::default();
        assert!(Ranker::new(&fx.store, &empty, &[]).rank(&targets, 5).is_empty());

        // Target absent from the graph
        let embeddings = fx.embeddings();
        let strangers = vec![TargetAuthor::new("Nobody", ["AI"])];
        assert!(Ranker::new(&fx.store, &embeddings, &[]).rank(&strangers, 5).is_empty());

        // Only targets have vectors
        let mut only_target = Fixture::new();
        only_target.target("T", &["AI"], [1.0, 0.0]);
        only_target.candidate("a", &["AI"], None);
        let embeddings = only_target.embeddings();
        assert!(Ranker::new(&only_target.store, &embeddings, &[]).rank(&targets, 5).is_empty());
        assert!(Ranker::new(&fx.store, &fx.embeddings(), &[]).rank(&targets, 0).is_empty());
    }

    #[test]
    fn test_reasons() {
        let mut fx = Fixture::new();
        fx.target("T", &["AI"], [1.0, 0.0]);
        fx.target("U", &["ML"], [1.0, 0.0]);
        fx.candidate("shared", &["Quantum", "ML", "AI"], Some([0.9, 0.0]));
        fx.candidate("own", &["Quantum"], Some([0.8, 0.0]));
        fx.candidate("bare", &[], Some([0.7, 0.0]));
        let targets = vec![TargetAuthor::new("T", ["AI"]), TargetAuthor::new("U", ["ML"])];
        let embeddings = fx.embeddings();
        let recs = Ranker::new(&fx.store, &embeddings, &[]).rank(&targets, 5);
        let by_name: HashMap<&str, &Recommendation> =
            recs.iter().map(|r| (r.name.as_str(), r)).collect();

        assert_eq!(
            by_name["shared"].reason,
            "'shared' specializes in AI alongside 'T' and has made notable contributions in this area."
        );
        assert_eq!(
            by_name["own"].reason,
            "'own' has made significant contributions in Quantum, which align with your interests."
        );
        assert_eq!(by_name["bare"].reason, "'bare' is a recognized expert in relevant areas.");
        assert_eq!(by_name["bare"].max_field_weight, 0);

        let author: RecommendedAuthor = by_name["own"].into();
        assert_eq!(author.profile_link, "/profile/own");
    }
}
