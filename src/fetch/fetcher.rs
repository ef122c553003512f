//! Rate-limited, retrying, deduplicating field fetcher

use crate::clock::Clock;
use crate::fetch::{FetchError, FieldSearch, RateScheduler};
use crate::models::{AuthorStub, FieldResults};
use futures::future::join_all;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Retries of a single failed page after the initial attempt
pub const PAGE_RETRIES: u32 = 3;

/// Knobs for outbound requests
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPolicy {
    /// Minimum spacing between two requests for the same field
    pub crawl_delay: Duration,
    /// Pages requested per field attempt, numbered from 0
    pub max_pages: usize,
    pub request_timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            crawl_delay: Duration::from_secs(1),
            max_pages: 3,
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Default)]
struct FetchState {
    /// Author names already emitted by this fetcher
    seen: HashSet<String>,
    /// Non-empty results per field
    fields: HashMap<String, Vec<AuthorStub>>,
    /// Every author a field search returned, before deduplication, keyed by name
    observed: HashMap<String, IndexMap<String, AuthorStub>>,
}

/// Field fetcher shared by all requests of a process
///
/// Outbound calls are serialized through a single permit. Failures never
/// escape: a page that keeps failing contributes no authors.
pub struct FieldFetcher {
    search: Arc<dyn FieldSearch>,
    clock: Arc<dyn Clock>,
    scheduler: RateScheduler,
    permit: Semaphore,
    policy: FetchPolicy,
    state: Mutex<FetchState>,
}

impl FieldFetcher {
    pub fn new(search: Arc<dyn FieldSearch>, clock: Arc<dyn Clock>, policy: FetchPolicy) -> Self {
        Self {
            search,
            clock,
            scheduler: RateScheduler::new(policy.crawl_delay),
            permit: Semaphore::new(1),
            policy,
            state: Mutex::new(FetchState::default()),
        }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// One attempt at `field`: fetch `max_pages` pages and return the authors
    /// not seen before. New authors are added to the field's cached result.
    pub async fn fetch_field(&self, field: &str, max_pages: usize) -> Vec<AuthorStub> {
        let raw = self.fetch_pages(field, max_pages).await;
        self.claim(field, raw)
    }

    /// Result for `field`, retrying the whole field while it holds fewer than
    /// `required_minimum` authors
    pub async fn fetch_with_retry(
        &self,
        field: &str,
        max_retries: u32,
        required_minimum: usize,
    ) -> Vec<AuthorStub> {
        let field = field.trim();
        self.fetch_fields(&[field.to_string()], max_retries, required_minimum)
            .await
            .remove(field)
            .unwrap_or_default()
    }

    /// Concurrent [`fetch_with_retry`](Self::fetch_with_retry) over several fields
    ///
    /// Raw pages for all pending fields are gathered concurrently; new authors
    /// are then claimed in `fields` order, so an author found under two fields
    /// always lands in the one listed first.
    pub async fn fetch_fields(
        &self,
        fields: &[String],
        max_retries: u32,
        required_minimum: usize,
    ) -> FieldResults {
        let mut ordered: Vec<String> = Vec::new();
        for field in fields.iter().map(|f| f.trim()).filter(|f| !f.is_empty()) {
            if !ordered.iter().any(|f| f == field) {
                ordered.push(field.to_string());
            }
        }

        let mut pending: Vec<String> = ordered
            .iter()
            .filter(|field| match self.cached_len(field) {
                Some(len) => {
                    let short = len < required_minimum;
                    if !short {
                        debug!("Field cache hit for '{}' ({} authors)", field, len);
                    }
                    short
                }
                None => true,
            })
            .cloned()
            .collect();

        for round in 0..=max_retries {
            if pending.is_empty() {
                break;
            }
            if round > 0 {
                let backoff = Duration::from_secs(1 << (round - 1).min(16));
                info!(
                    "Retrying {} field(s) below {} authors (round {}/{}) after {:?}",
                    pending.len(),
                    required_minimum,
                    round,
                    max_retries,
                    backoff
                );
                self.clock.sleep(backoff).await;
            }

            let max_pages = self.policy.max_pages;
            let raws =
                join_all(pending.iter().map(|field| self.fetch_pages(field, max_pages))).await;
            for (field, raw) in pending.iter().zip(raws) {
                let claimed = self.claim(field, raw);
                debug!("Field '{}' round {}: {} new authors", field, round, claimed.len());
            }

            pending.retain(|field| self.cached_len(field).unwrap_or(0) < required_minimum);
        }

        if !pending.is_empty() {
            warn!("Fields still below {} authors: {:?}", required_minimum, pending);
        }

        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        ordered
            .into_iter()
            .map(|field| {
                let authors = state.fields.get(&field).cloned().unwrap_or_default();
                (field, authors)
            })
            .collect()
    }

    /// Authors seen by this fetcher so far
    pub fn seen_count(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).seen.len()
    }

    /// Authors returned for `field` so far, including ones claimed by other fields
    pub fn observed_authors(&self, field: &str) -> Vec<AuthorStub> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .observed
            .get(field)
            .map(|authors| authors.values().cloned().collect())
            .unwrap_or_default()
    }

    fn cached_len(&self, field: &str) -> Option<usize> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.fields.get(field).map(Vec::len)
    }

    fn claim(&self, field: &str, raw: Vec<AuthorStub>) -> Vec<AuthorStub> {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let state = &mut *guard;

        let observed = state.observed.entry(field.to_string()).or_default();
        for stub in &raw {
            observed.entry(stub.name.clone()).or_insert_with(|| stub.clone());
        }

        let claimed: Vec<AuthorStub> = raw
            .into_iter()
            .filter(|stub| state.seen.insert(stub.name.clone()))
            .collect();
        if !claimed.is_empty() {
            state.fields.entry(field.to_string()).or_default().extend(claimed.iter().cloned());
        }
        claimed
    }

    /// Pages run concurrently, each with its own retries; results keep page order
    async fn fetch_pages(&self, field: &str, max_pages: usize) -> Vec<AuthorStub> {
        let pages = join_all((0..max_pages).map(|page| self.fetch_page(field, page))).await;
        pages.into_iter().flatten().collect()
    }

    async fn fetch_page(&self, field: &str, page: usize) -> Vec<AuthorStub> {
        for attempt in 0..=PAGE_RETRIES {
            match self.request(field, page).await {
                Ok(stubs) => {
                    return stubs.into_iter().filter_map(AuthorStub::normalized).collect();
                }
                Err(e) if attempt < PAGE_RETRIES => {
                    let backoff = Duration::from_secs(1 << attempt);
                    warn!(
                        "Page {} of '{}' failed (attempt {}): {}; retrying in {:?}",
                        page,
                        field,
                        attempt + 1,
                        e,
                        backoff
                    );
                    self.clock.sleep(backoff).await;
                }
                Err(e) => {
                    warn!("Giving up on page {} of '{}': {}", page, field, e);
                }
            }
        }
        Vec::new()
    }

    /// A single outbound call, holding the process-wide permit while it waits
    /// for the field's rate slot and runs
    async fn request(&self, field: &str, page: usize) -> Result<Vec<AuthorStub>, FetchError> {
        let _permit = self
            .permit
            .acquire()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let start = self.scheduler.reserve(field, self.clock.now());
        self.clock.sleep_until(start).await;

        debug!("Searching '{}' page {}", field, page);
        let call = self.search.search(field, page);
        match tokio::time::timeout(self.policy.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.policy.request_timeout)),
        }
    }
}
