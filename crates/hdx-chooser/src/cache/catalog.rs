//! Cached catalog handle
//!
//! Wraps a [`CatalogGateway`] with the response cache, the in-flight ledger
//! and a per-call timeout, and exposes the typed reads the navigator needs.
//! Responses are validated against their schema before they are cached, so a
//! malformed payload is never stored.

use std::sync::Arc;
use std::time::Duration;

use hdx_client::{
    response, CatalogError, CatalogGateway, CatalogQuery, Dataset, Location, Result,
    SearchResults, Tag,
};
use serde_json::Value;
use tracing::{debug, warn};

use super::inflight::{Claim, InFlightLedger};
use super::keys::RequestSignature;
use super::response::{CacheStats, ResponseCache};
use crate::tags::{aggregate_tags, CountedTag};

/// Default per-call timeout
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared, cloneable handle to the catalog
#[derive(Clone)]
pub struct CachedCatalog {
    gateway: Arc<dyn CatalogGateway>,
    cache: Arc<ResponseCache>,
    ledger: InFlightLedger,
    call_timeout: Duration,
}

impl CachedCatalog {
    pub fn new(gateway: Arc<dyn CatalogGateway>) -> Self {
        Self::with_timeout(gateway, DEFAULT_CALL_TIMEOUT)
    }

    pub fn with_timeout(gateway: Arc<dyn CatalogGateway>, call_timeout: Duration) -> Self {
        Self {
            gateway,
            cache: Arc::new(ResponseCache::new()),
            ledger: InFlightLedger::new(),
            call_timeout,
        }
    }

    /// Catalog base URL, for "view on HDX" links
    pub fn base_url(&self) -> &str {
        self.gateway.base_url()
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn ledger(&self) -> &InFlightLedger {
        &self.ledger
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>> {
        self.fetch_validated(&CatalogQuery::ListLocations, response::locations)
            .await
    }

    pub async fn get_location(&self, id: &str) -> Result<Location> {
        self.fetch_validated(&CatalogQuery::get_location(id), |v| {
            response::location(v, id)
        })
        .await
    }

    pub async fn location_datasets(&self, location: &str) -> Result<Vec<Dataset>> {
        self.fetch_validated(&CatalogQuery::location_datasets(location), response::datasets)
            .await
    }

    /// Counted free tags across every dataset of a location
    pub async fn location_tags(&self, location: &str) -> Result<Vec<CountedTag>> {
        let datasets = self.location_datasets(location).await?;
        Ok(aggregate_tags(&datasets))
    }

    pub async fn get_tag(&self, id: &str) -> Result<Tag> {
        self.fetch_validated(&CatalogQuery::get_tag(id), response::tag)
            .await
    }

    pub async fn location_tag_datasets(&self, location: &str, tag: &str) -> Result<SearchResults> {
        self.fetch_validated(
            &CatalogQuery::location_tag_datasets(location, tag),
            response::search_results,
        )
        .await
    }

    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        self.fetch_validated(&CatalogQuery::search(query), response::search_results)
            .await
    }

    /// Full dataset including its resources
    pub async fn get_dataset(&self, id: &str) -> Result<Dataset> {
        self.fetch_validated(&CatalogQuery::get_dataset(id), response::dataset)
            .await
    }

    /// Fetch through the cache and ledger, decoding with `decode`.
    ///
    /// Only the leader of a signature talks to the gateway. Its payload is
    /// cached only if `decode` accepts it; followers receive the same payload
    /// (or the same error) and decode it themselves.
    async fn fetch_validated<T, F>(&self, query: &CatalogQuery, decode: F) -> Result<T>
    where
        F: Fn(&Value) -> Result<T>,
    {
        let signature = RequestSignature::from_query(query);

        loop {
            match self.ledger.claim(&signature, &self.cache) {
                Claim::Cached(value) => return decode(value.as_ref()),
                Claim::Follower(follower) => match follower.wait().await {
                    Some(outcome) => return decode(outcome?.as_ref()),
                    // Leader was cancelled before answering; claim again
                    None => continue,
                },
                Claim::Leader(guard) => {
                    let outcome = self.fetch_from_gateway(query).await.and_then(|value| {
                        let decoded = decode(&value)?;
                        Ok((Arc::new(value), decoded))
                    });

                    return match outcome {
                        Ok((value, decoded)) => {
                            self.cache.put(signature.clone(), Arc::clone(&value));
                            guard.complete(Ok(value));
                            Ok(decoded)
                        }
                        Err(e) => {
                            warn!(query = %query, error = %e, "Catalog request failed");
                            guard.complete(Err(e.clone()));
                            Err(e)
                        }
                    };
                }
            }
        }
    }

    async fn fetch_from_gateway(&self, query: &CatalogQuery) -> Result<Value> {
        self.cache.record_network_call();
        debug!(query = %query, "Fetching from catalog");

        match tokio::time::timeout(self.call_timeout, self.gateway.fetch(query)).await {
            Ok(result) => result,
            Err(_) => Err(CatalogError::Timeout(self.call_timeout.as_millis() as u64)),
        }
    }
}

impl std::fmt::Debug for CachedCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedCatalog")
            .field("base_url", &self.base_url())
            .field("call_timeout", &self.call_timeout)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdx_client::MockGateway;
    use serde_json::json;

    fn fixture() -> MockGateway {
        let hti = Location::new("haiti", "Haiti");
        MockGateway::new()
            .with_location(hti.clone())
            .with_tag(Tag::new("3w"))
            .with_dataset(
                Dataset::new("haiti_3w", "Haiti 3W")
                    .in_location(hti)
                    .tagged(Tag::new("3w")),
            )
    }

    #[tokio::test]
    async fn test_hit_suppresses_second_call() {
        let gateway = Arc::new(fixture());
        let catalog = CachedCatalog::new(gateway.clone());

        let first = catalog.get_tag("3w").await.unwrap();
        let second = catalog.get_tag("3w").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(gateway.call_count(&CatalogQuery::get_tag("3w")), 1);

        let stats = catalog.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.network_calls, 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_make_one_call() {
        let gateway = Arc::new(
            fixture().with_delay(CatalogQuery::get_dataset("haiti_3w"), Duration::from_millis(50)),
        );
        let catalog = CachedCatalog::new(gateway.clone());

        let (a, b) = tokio::join!(catalog.get_dataset("haiti_3w"), catalog.get_dataset("haiti_3w"));
        assert_eq!(a.unwrap().name, "haiti_3w");
        assert_eq!(b.unwrap().name, "haiti_3w");

        assert_eq!(gateway.call_count(&CatalogQuery::get_dataset("haiti_3w")), 1);
        assert_eq!(catalog.cache().len(), 1);
        assert_eq!(catalog.stats().coalesced, 1);
        assert!(catalog.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_follower_reclaims_after_leader_dropped() {
        let gateway = Arc::new(
            fixture().with_delay(CatalogQuery::get_tag("3w"), Duration::from_millis(50)),
        );
        let catalog = CachedCatalog::new(gateway.clone());

        // The first future leads and is dropped by its timeout mid-call
        let (leader, follower) = tokio::join!(
            tokio::time::timeout(Duration::from_millis(10), catalog.get_tag("3w")),
            catalog.get_tag("3w")
        );
        assert!(leader.is_err());
        assert_eq!(follower.unwrap().name, "3w");

        assert_eq!(gateway.call_count(&CatalogQuery::get_tag("3w")), 2);
        assert_eq!(catalog.cache().len(), 1);
        assert!(catalog.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let gateway = Arc::new(fixture().with_failure(
            CatalogQuery::ListLocations,
            CatalogError::Unreachable("503".into()),
        ));
        let catalog = CachedCatalog::new(gateway.clone());

        assert!(catalog.list_locations().await.is_err());
        assert!(catalog.list_locations().await.is_err());
        assert_eq!(gateway.call_count(&CatalogQuery::ListLocations), 2);
        assert!(catalog.cache().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_not_cached() {
        let gateway = Arc::new(fixture().with_raw(CatalogQuery::get_tag("3w"), json!([1, 2, 3])));
        let catalog = CachedCatalog::new(gateway.clone());

        assert!(matches!(
            catalog.get_tag("3w").await,
            Err(CatalogError::BadResponse(_))
        ));
        assert!(catalog.cache().is_empty());
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let gateway = Arc::new(
            fixture().with_delay(CatalogQuery::get_tag("3w"), Duration::from_millis(500)),
        );
        let catalog = CachedCatalog::with_timeout(gateway, Duration::from_millis(20));

        assert_eq!(catalog.get_tag("3w").await, Err(CatalogError::Timeout(20)));
        assert!(catalog.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_location_tags_share_dataset_listing() {
        let gateway = Arc::new(fixture());
        let catalog = CachedCatalog::new(gateway.clone());

        let tags = catalog.location_tags("haiti").await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].tag.name, "3w");
        assert_eq!(tags[0].occurrence_count, 1);

        catalog.location_datasets("haiti").await.unwrap();
        assert_eq!(
            gateway.call_count(&CatalogQuery::location_datasets("haiti")),
            1
        );
    }
}
