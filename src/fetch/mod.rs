//! Field search ingestion
//!
//! A [`FieldSearch`] collaborator answers "which authors are associated with
//! this field, page N". [`FieldFetcher`] wraps it with rate limiting, retries,
//! cross-call author deduplication and a per-field result cache.

mod client;
mod fetcher;
mod scheduler;

pub use client::{HttpFieldSearch, StaticFieldSearch};
pub use fetcher::{FetchPolicy, FieldFetcher, PAGE_RETRIES};
pub use scheduler::RateScheduler;

use crate::models::AuthorStub;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Fetch errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection or request failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// No response within the request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Client misconfiguration
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type FetchResult<T> = Result<T, FetchError>;

/// External "authors for a field" capability
///
/// `Err` is retried by the fetcher; `Ok` with an empty list is a final answer
/// for that page.
#[async_trait]
pub trait FieldSearch: Send + Sync {
    async fn search(&self, field: &str, page: usize) -> FetchResult<Vec<AuthorStub>>;
}
