//! Field search implementations

use crate::fetch::{FetchError, FetchResult, FieldSearch};
use crate::models::AuthorStub;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// JSON search endpoint: `GET <base_url>?field=<field>&page=<page>`
/// answering `[{"name": .., "profile_ref": ..}, ..]`
pub struct HttpFieldSearch {
    client: Client,
    base_url: String,
}

impl HttpFieldSearch {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> FetchResult<Self> {
        let base_url = base_url.into();
        Url::parse(&base_url)
            .map_err(|e| FetchError::Config(format!("Invalid search URL '{}': {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Config(e.to_string()))?;

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl FieldSearch for HttpFieldSearch {
    async fn search(&self, field: &str, page: usize) -> FetchResult<Vec<AuthorStub>> {
        let page = page.to_string();
        let params = [("field", field), ("page", page.as_str())];
        let url = Url::parse_with_params(&self.base_url, &params)
            .map_err(|e| FetchError::Config(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json::<Vec<AuthorStub>>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogEntry {
    Pages(Vec<Vec<AuthorStub>>),
    Single(Vec<AuthorStub>),
}

/// In-memory catalogue of field -> pages of authors
///
/// Fields and pages outside the catalogue answer with an empty list.
#[derive(Debug, Default)]
pub struct StaticFieldSearch {
    pages: HashMap<String, Vec<Vec<AuthorStub>>>,
    calls: AtomicUsize,
}

impl StaticFieldSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(mut self, field: impl Into<String>, pages: Vec<Vec<AuthorStub>>) -> Self {
        self.pages.insert(field.into(), pages);
        self
    }

    /// Parse `{"<field>": [[stub, ..], ..]}`; a flat list of stubs is a single page
    pub fn from_value(value: serde_json::Value) -> FetchResult<Self> {
        let entries: HashMap<String, CatalogEntry> =
            serde_json::from_value(value).map_err(|e| FetchError::Decode(e.to_string()))?;

        let pages = entries
            .into_iter()
            .map(|(field, entry)| {
                let pages = match entry {
                    CatalogEntry::Pages(pages) => pages,
                    CatalogEntry::Single(stubs) => vec![stubs],
                };
                (field.trim().to_string(), pages)
            })
            .collect();

        Ok(Self { pages, calls: AtomicUsize::new(0) })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> FetchResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            FetchError::Config(format!("Cannot read catalog {}: {}", path.display(), e))
        })?;
        let value = serde_json::from_str(&raw).map_err(|e| FetchError::Decode(e.to_string()))?;
        Self::from_value(value)
    }

    /// Catalogued field labels, sorted
    pub fn fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self.pages.keys().cloned().collect();
        fields.sort();
        fields
    }

    /// Number of `search` calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FieldSearch for StaticFieldSearch {
    async fn search(&self, field: &str, page: usize) -> FetchResult<Vec<AuthorStub>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let found = self
            .pages
            .get(field)
            .and_then(|pages| pages.get(page))
            .cloned()
            .unwrap_or_default();
        debug!("Catalog search '{}' page {}: {} authors", field, page, found.len());
        Ok(found)
    }
}
