//! The catalog gateway abstraction.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::query::CatalogQuery;

/// A read-only source of catalog data.
///
/// Implementations return the raw `result` payload of a query; decoding into
/// typed entities happens in [`crate::response`]. Every call is idempotent.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Run one query against the catalog.
    async fn fetch(&self, query: &CatalogQuery) -> Result<Value>;

    /// Base URL used for "view on the catalog" links.
    fn base_url(&self) -> &str;
}
