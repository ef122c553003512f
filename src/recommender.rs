//! Recommendation service
//!
//! One [`Recommender`] lives for the whole process. It owns the field fetcher
//! (seen authors, per-field results), the result cache and the field ontology;
//! graphs and embeddings are built per request and dropped afterwards.

use crate::cache::{CacheKey, RecommendationCache};
use crate::clock::Clock;
use crate::config::RecommenderConfig;
use crate::embed::{EmbeddingEngine, Embeddings};
use crate::fetch::{FieldFetcher, FieldSearch};
use crate::graph::GraphStore;
use crate::models::{
    normalize_targets, AuthorGroup, AuthorStub, FieldResults, FieldWeight, RecommendationPayload,
    RecommendedAuthor, TargetAuthor,
};
use crate::ontology::FieldOntology;
use crate::rank::{Ranker, Recommendation};
use crate::weighting::{weighted_fields, DEFAULT_FIELDS};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Subheading of the personalized group
pub const TOP_PICKS: &str = "Top Picks For You";

/// Outcome of a recommendation request
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations {
    pub payload: RecommendationPayload,
    /// Fields of interest the payload was built from
    pub field_weights: Vec<FieldWeight>,
    pub from_cache: bool,
}

pub struct Recommender {
    config: RecommenderConfig,
    fetcher: FieldFetcher,
    cache: RecommendationCache,
    ontology: Mutex<FieldOntology>,
}

impl Recommender {
    pub fn new(
        config: RecommenderConfig,
        search: Arc<dyn FieldSearch>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let fetcher = FieldFetcher::new(search, Arc::clone(&clock), config.fetch_policy());
        Self {
            config,
            fetcher,
            cache: RecommendationCache::new(clock),
            ontology: Mutex::new(FieldOntology::new()),
        }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Recommend authors for `targets`; an empty list yields default-topic groups only
    ///
    /// Never fails: fetch and embedding problems shrink the result instead.
    pub async fn recommend(&self, targets: &[TargetAuthor]) -> Recommendations {
        let mut targets = normalize_targets(targets.iter().cloned());
        // Same set in any order builds the same graph
        targets.sort_by(|a, b| a.name.cmp(&b.name));
        let key = CacheKey::from_targets(&targets);

        if let Some((payload, field_weights)) = self.cache.get(&key) {
            info!("Serving cached recommendations for {} target(s)", targets.len());
            return Recommendations { payload, field_weights, from_cache: true };
        }

        let started = Instant::now();
        let (payload, field_weights) = if targets.is_empty() {
            self.default_topics(&key).await
        } else {
            self.personalized(&targets, &key).await
        };
        info!(
            "Computed recommendations for {} target(s) in {:?}",
            targets.len(),
            started.elapsed()
        );

        self.cache.set(key, payload.clone(), &field_weights);
        Recommendations { payload, field_weights, from_cache: false }
    }

    /// Fields sharing at least one discovered author with `field`
    pub fn related_fields(&self, field: &str) -> Vec<String> {
        self.ontology
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .related_fields(field.trim())
    }

    async fn default_topics(&self, key: &CacheKey) -> (RecommendationPayload, Vec<FieldWeight>) {
        let field_weights = weighted_fields(&[], DEFAULT_FIELDS.len());
        let fields: Vec<String> = field_weights.iter().map(|w| w.field.clone()).collect();
        let results = self
            .fetcher
            .fetch_fields(&fields, self.config.max_retries, self.config.max_results_per_field)
            .await;
        self.learn(&results);

        let mut rng = StdRng::seed_from_u64(key.seed());
        let groups = field_weights
            .iter()
            .map(|w| {
                self.field_group(&w.field, &results, &HashSet::new(), &mut rng, |name, field| {
                    format!(
                        "Recommended because '{}' has expertise in '{}', which aligns with the default fields of interest.",
                        name, field
                    )
                })
            })
            .collect();

        let payload = RecommendationPayload {
            recommended_authors: Vec::new(),
            authors_by_weighted_fields: groups,
        };
        (payload, field_weights)
    }

    async fn personalized(
        &self,
        targets: &[TargetAuthor],
        key: &CacheKey,
    ) -> (RecommendationPayload, Vec<FieldWeight>) {
        let field_weights = weighted_fields(targets, self.config.top_fields);

        let declared: BTreeSet<&str> = targets
            .iter()
            .flat_map(|t| t.fields_of_study.iter().map(String::as_str))
            .collect();
        let mut fields: Vec<String> = declared.iter().map(|f| f.to_string()).collect();
        fields.extend(
            field_weights
                .iter()
                .filter(|w| !declared.contains(w.field.as_str()))
                .map(|w| w.field.clone()),
        );

        let results = self.fetcher.fetch_fields(&fields, self.config.max_retries, 0).await;
        self.learn(&results);

        let seed = key.seed();
        let picks = self.rank(targets, &results, &field_weights, seed).await;

        let target_names: HashSet<&str> = targets.iter().map(|t| t.name.as_str()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        let groups = field_weights
            .iter()
            .map(|w| {
                self.field_group(&w.field, &results, &target_names, &mut rng, |name, field| {
                    format!(
                        "Recommended because '{}' has expertise in '{}', which aligns with your field of interest.",
                        name, field
                    )
                })
            })
            .collect();

        let payload = RecommendationPayload {
            recommended_authors: vec![AuthorGroup {
                subheading: TOP_PICKS.to_string(),
                authors: picks.iter().map(RecommendedAuthor::from).collect(),
            }],
            authors_by_weighted_fields: groups,
        };
        (payload, field_weights)
    }

    async fn rank(
        &self,
        targets: &[TargetAuthor],
        results: &FieldResults,
        field_weights: &[FieldWeight],
        seed: u64,
    ) -> Vec<Recommendation> {
        let mut store = GraphStore::new();
        if let Err(e) = store.build(targets, results) {
            warn!("Graph build failed: {}", e);
            return Vec::new();
        }
        debug!("Graph has {} nodes and {} edges", store.node_count(), store.edge_count());

        let engine = EmbeddingEngine::new(self.config.embedding.clone(), seed);
        let computed = tokio::task::spawn_blocking(move || {
            let embeddings = engine.compute(&store);
            (store, embeddings)
        })
        .await;

        let (store, embeddings) = match computed {
            Ok((store, Ok(embeddings))) => (store, embeddings),
            Ok((store, Err(e))) => {
                warn!("Embedding failed, no ranked recommendations: {}", e);
                (store, Embeddings::default())
            }
            Err(e) => {
                warn!("Embedding task failed: {}", e);
                return Vec::new();
            }
        };

        Ranker::new(&store, &embeddings, field_weights)
            .rank(targets, self.config.max_recommendations)
    }

    fn field_group<R>(
        &self,
        field: &str,
        results: &FieldResults,
        exclude: &HashSet<&str>,
        rng: &mut StdRng,
        reason: R,
    ) -> AuthorGroup
    where
        R: Fn(&str, &str) -> String,
    {
        let pool: Vec<&AuthorStub> = results
            .get(field)
            .map(|authors| authors.iter().filter(|a| !exclude.contains(a.name.as_str())).collect())
            .unwrap_or_default();

        let authors = pool
            .choose_multiple(rng, self.config.max_results_per_field)
            .map(|stub| RecommendedAuthor {
                name: stub.name.clone(),
                profile_link: stub.profile_ref.clone(),
                reason: reason(&stub.name, field),
            })
            .collect();

        AuthorGroup { subheading: field.to_string(), authors }
    }

    fn learn(&self, results: &FieldResults) {
        let mut ontology = self.ontology.lock().unwrap_or_else(PoisonError::into_inner);
        for field in results.keys() {
            ontology.update(field, &self.fetcher.observed_authors(field));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::embed::EmbeddingConfig;
    use crate::fetch::StaticFieldSearch;
    use std::time::Duration;

    fn small_config() -> RecommenderConfig {
        RecommenderConfig {
            crawl_delay_secs: 0.0,
            max_pages: 1,
            max_retries: 0,
            embedding: EmbeddingConfig {
                num_walks: 10,
                dimensions: 8,
                workers: Some(2),
                ..EmbeddingConfig::default()
            },
            ..RecommenderConfig::default()
        }
    }

    fn stubs(names: &[&str]) -> Vec<AuthorStub> {
        names.iter().map(|n| AuthorStub::new(*n, format!("/profile/{}", n))).collect()
    }

    #[tokio::test]
    async fn test_empty_targets_use_default_topics() {
        let page = stubs(&["D1", "D2", "D3", "D4", "D5", "D6"]);
        let search = Arc::new(StaticFieldSearch::new().with_pages("Data Science", vec![page]));
        let clock = Arc::new(ManualClock::default());
        let recommender = Recommender::new(small_config(), search, clock);

        let result = recommender.recommend(&[]).await;
        assert!(!result.from_cache);
        assert!(result.payload.recommended_authors.is_empty());
        let subheadings: Vec<&str> = result
            .payload
            .authors_by_weighted_fields
            .iter()
            .map(|g| g.subheading.as_str())
            .collect();
        assert_eq!(subheadings, DEFAULT_FIELDS.to_vec());

        let data_science = &result.payload.authors_by_weighted_fields[1];
        assert_eq!(data_science.authors.len(), 5);
        assert!(data_science.authors[0]
            .reason
            .ends_with("which aligns with the default fields of interest."));
        assert!(result.payload.authors_by_weighted_fields[0].authors.is_empty());
    }

    #[tokio::test]
    async fn test_blank_targets_are_dropped() {
        let search = Arc::new(StaticFieldSearch::new());
        let clock = Arc::new(ManualClock::default());
        let recommender = Recommender::new(small_config(), search, clock);
        let result = recommender.recommend(&[TargetAuthor::new("   ", ["AI"])]).await;
        assert!(result.payload.recommended_authors.is_empty());
        assert_eq!(result.payload.authors_by_weighted_fields.len(), DEFAULT_FIELDS.len());
    }

    #[tokio::test]
    async fn test_personalized_groups_and_cache() {
        let page = stubs(&["A. Smith", "B. Lee", "Jane Doe"]);
        let search =
            Arc::new(StaticFieldSearch::new().with_pages("Artificial Intelligence", vec![page]));
        let clock = Arc::new(ManualClock::default());
        let recommender = Recommender::new(small_config(), search.clone(), clock.clone());
        let targets = vec![TargetAuthor::new("Jane Doe", ["Artificial Intelligence"])];

        let first = recommender.recommend(&targets).await;
        assert!(!first.from_cache);
        assert_eq!(first.payload.recommended_authors.len(), 1);
        let top = &first.payload.recommended_authors[0];
        assert_eq!(top.subheading, TOP_PICKS);
        let mut picked: Vec<&str> = top.authors.iter().map(|a| a.name.as_str()).collect();
        picked.sort();
        assert_eq!(picked, vec!["A. Smith", "B. Lee"]);

        let ai = &first.payload.authors_by_weighted_fields[0];
        assert_eq!(ai.subheading, "Artificial Intelligence");
        assert!(ai.authors.iter().all(|a| a.name != "Jane Doe"));
        assert!(ai
            .authors
            .iter()
            .all(|a| a.reason.ends_with("which aligns with your field of interest.")));
        assert_eq!(first.field_weights[0], FieldWeight::new("Artificial Intelligence", 1));

        let calls = search.calls();
        let second = recommender.recommend(&targets).await;
        assert!(second.from_cache);
        assert_eq!(second.payload, first.payload);
        assert_eq!(search.calls(), calls);

        clock.advance(Duration::from_secs(3601));
        let third = recommender.recommend(&targets).await;
        assert!(!third.from_cache);
    }

    #[tokio::test]
    async fn test_related_fields_learned_from_fetches() {
        let search = Arc::new(
            StaticFieldSearch::new()
                .with_pages("AI", vec![stubs(&["A", "Shared"])])
                .with_pages("ML", vec![stubs(&["Shared", "B"])])
                .with_pages("Databases", vec![stubs(&["C"])]),
        );
        let clock = Arc::new(ManualClock::default());
        let recommender = Recommender::new(small_config(), search, clock);
        recommender.recommend(&[TargetAuthor::new("T", ["AI", "ML", "Databases"])]).await;
        assert_eq!(recommender.related_fields("AI"), vec!["ML"]);
        assert_eq!(recommender.related_fields(" ML "), vec!["AI"]);
        assert!(recommender.related_fields("Databases").is_empty());
        assert!(recommender.related_fields("Unknown").is_empty());
    }
}
