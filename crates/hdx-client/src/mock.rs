//! In-memory catalog gateway for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{CatalogError, Result};
use crate::gateway::CatalogGateway;
use crate::query::CatalogQuery;
use crate::types::{Dataset, Location, Tag};

/// Mock gateway for testing.
///
/// Serves a small fixture catalog in the same payload shapes the CKAN action
/// API uses, counts calls per query, and can delay or fail chosen queries.
pub struct MockGateway {
    base_url: String,
    locations: Vec<Location>,
    tags: Vec<Tag>,
    datasets: Vec<Dataset>,
    delays: HashMap<CatalogQuery, Duration>,
    failures: HashMap<CatalogQuery, CatalogError>,
    overrides: HashMap<CatalogQuery, Value>,
    calls: Mutex<HashMap<CatalogQuery, u32>>,
    total_calls: AtomicU32,
}

impl MockGateway {
    /// Create an empty mock catalog.
    pub fn new() -> Self {
        Self {
            base_url: "https://data.example.org".to_string(),
            locations: Vec::new(),
            tags: Vec::new(),
            datasets: Vec::new(),
            delays: HashMap::new(),
            failures: HashMap::new(),
            overrides: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
            total_calls: AtomicU32::new(0),
        }
    }

    /// Add a location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    /// Add a tag that `get_tag` can resolve.
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Add a dataset.
    pub fn with_dataset(mut self, dataset: Dataset) -> Self {
        self.datasets.push(dataset);
        self
    }

    /// Delay every answer to `query`.
    pub fn with_delay(mut self, query: CatalogQuery, delay: Duration) -> Self {
        self.delays.insert(query, delay);
        self
    }

    /// Fail every call to `query`.
    pub fn with_failure(mut self, query: CatalogQuery, error: CatalogError) -> Self {
        self.failures.insert(query, error);
        self
    }

    /// Answer `query` with a fixed raw payload.
    pub fn with_raw(mut self, query: CatalogQuery, value: Value) -> Self {
        self.overrides.insert(query, value);
        self
    }

    /// Number of times `query` was fetched.
    pub fn call_count(&self, query: &CatalogQuery) -> u32 {
        self.calls
            .lock()
            .map(|calls| calls.get(query).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of fetches across all queries.
    pub fn total_calls(&self) -> u32 {
        self.total_calls.load(Ordering::SeqCst)
    }

    fn record(&self, query: &CatalogQuery) {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(query.clone()).or_insert(0) += 1;
        }
    }

    fn find_location(&self, id: &str) -> Result<&Location> {
        self.locations
            .iter()
            .find(|l| l.name == id)
            .ok_or_else(|| CatalogError::NotFound(format!("location {}", id)))
    }

    fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
        serde_json::to_value(value).map_err(|e| CatalogError::bad_response("mock fixture", e))
    }

    fn answer(&self, query: &CatalogQuery) -> Result<Value> {
        match query {
            CatalogQuery::ListLocations => Self::to_value(&self.locations),
            CatalogQuery::GetLocation { id } => {
                let location = self.find_location(id)?;
                let row = self
                    .datasets
                    .iter()
                    .find(|d| d.belongs_to(id))
                    .map(Self::to_value)
                    .transpose()?
                    .unwrap_or_else(|| json!({ "name": "", "groups": [location] }));
                Ok(json!([row]))
            }
            CatalogQuery::LocationDatasets { location } => {
                self.find_location(location)?;
                let rows: Vec<&Dataset> =
                    self.datasets.iter().filter(|d| d.belongs_to(location)).collect();
                Self::to_value(&rows)
            }
            CatalogQuery::GetTag { id } => self
                .tags
                .iter()
                .find(|t| t.name == *id)
                .map(Self::to_value)
                .unwrap_or_else(|| Err(CatalogError::NotFound(format!("tag {}", id)))),
            CatalogQuery::LocationTagDatasets { location, tag } => {
                let rows: Vec<&Dataset> = self
                    .datasets
                    .iter()
                    .filter(|d| d.belongs_to(location) && d.has_tag(tag))
                    .collect();
                Ok(json!({ "count": rows.len(), "results": Self::to_value(&rows)? }))
            }
            CatalogQuery::SearchDatasets { query } => {
                let needle = query.to_lowercase();
                let rows: Vec<&Dataset> = self
                    .datasets
                    .iter()
                    .filter(|d| {
                        d.name.to_lowercase().contains(&needle)
                            || d.label().to_lowercase().contains(&needle)
                            || d.notes
                                .as_deref()
                                .is_some_and(|n| n.to_lowercase().contains(&needle))
                    })
                    .collect();
                Ok(json!({ "count": rows.len(), "results": Self::to_value(&rows)? }))
            }
            CatalogQuery::GetDataset { id } => self
                .datasets
                .iter()
                .find(|d| d.name == *id)
                .map(Self::to_value)
                .unwrap_or_else(|| Err(CatalogError::NotFound(format!("dataset {}", id)))),
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogGateway for MockGateway {
    async fn fetch(&self, query: &CatalogQuery) -> Result<Value> {
        self.record(query);

        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(error) = self.failures.get(query) {
            return Err(error.clone());
        }
        if let Some(value) = self.overrides.get(query) {
            return Ok(value.clone());
        }
        self.answer(query)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
