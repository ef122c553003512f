//! TTL cache of finished recommendation payloads
//!
//! Entries are keyed by the sorted target-author names and expire one hour
//! after creation. Expired entries are not removed, only ignored, until a new
//! computation for the same key overwrites them. All access goes through one lock.

use crate::clock::Clock;
use crate::models::{FieldWeight, RecommendationPayload, TargetAuthor};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Entries are valid while `now - created_at < CACHE_TTL`
pub const CACHE_TTL: Duration = Duration::from_secs(3600);

/// Identity of a recommendation request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// No target authors: default-topic groupings only
    DefaultTopics,
    /// Target author names, sorted, case-sensitive as supplied
    Authors(Vec<String>),
}

impl CacheKey {
    pub fn from_targets(targets: &[TargetAuthor]) -> Self {
        if targets.is_empty() {
            return CacheKey::DefaultTopics;
        }
        let mut names: Vec<String> = targets.iter().map(|t| t.name.clone()).collect();
        names.sort();
        CacheKey::Authors(names)
    }

    /// Deterministic RNG seed: first 8 bytes of SHA-256 over the key
    pub fn seed(&self) -> u64 {
        let mut hasher = Sha256::new();
        match self {
            CacheKey::DefaultTopics => hasher.update(b"\x00default-topics"),
            CacheKey::Authors(names) => {
                for name in names {
                    hasher.update(name.as_bytes());
                    hasher.update([0x1f]);
                }
            }
        }
        let digest = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(bytes)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: RecommendationPayload,
    field_weights: Vec<FieldWeight>,
    created_at: DateTime<Utc>,
}

/// Thread-safe recommendation cache
pub struct RecommendationCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl RecommendationCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Payload and field-weight snapshot for `key`, if present and younger than the TTL
    pub fn get(&self, key: &CacheKey) -> Option<(RecommendationPayload, Vec<FieldWeight>)> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = entries.get(key) else {
            debug!("Cache miss for {:?}", key);
            return None;
        };

        let age = self.clock.now() - entry.created_at;
        let fresh = age
            .to_std()
            .map(|age| age < CACHE_TTL)
            .unwrap_or(true);
        if !fresh {
            debug!("Cache entry for {:?} expired ({}s old)", key, age.num_seconds());
            return None;
        }

        debug!("Cache hit for {:?}", key);
        Some((entry.payload.clone(), entry.field_weights.clone()))
    }

    /// Store a computation, replacing any previous entry for `key`
    pub fn set(
        &self,
        key: CacheKey,
        payload: RecommendationPayload,
        field_weights: &[FieldWeight],
    ) {
        let entry = CacheEntry {
            payload,
            field_weights: field_weights
                .iter()
                .map(|w| FieldWeight::new(w.field.trim(), w.weight))
                .collect(),
            created_at: self.clock.now(),
        };
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, entry);
        debug!("Cache now holds {} entries", entries.len());
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
