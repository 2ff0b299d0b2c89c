//! Read-only Rust client for the HDX catalog (CKAN action API)
//!
//! Exposes the handful of catalog queries a resource chooser needs:
//! locations (CKAN groups), tags, datasets (CKAN packages) and their
//! resources. Only public data is reachable; nothing here mutates the
//! catalog.
//!
//! # Example
//!
//! ```rust,no_run
//! use hdx_client::{response, CatalogClient, CatalogConfig, CatalogGateway, CatalogQuery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CatalogClient::new(CatalogConfig {
//!     base_url: "https://data.humdata.org".into(),
//!     ..Default::default()
//! })?;
//!
//! let raw = client.fetch(&CatalogQuery::ListLocations).await?;
//! let locations = response::locations(&raw)?;
//!
//! let raw = client.fetch(&CatalogQuery::get_dataset("guinea_3w_data")).await?;
//! let dataset = response::dataset(&raw)?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod gateway;
pub mod mock;
pub mod query;
pub mod response;
pub mod types;

// Re-export main types
pub use client::CatalogClient;
pub use error::{CatalogError, Result};
pub use gateway::CatalogGateway;
pub use mock::MockGateway;
pub use query::CatalogQuery;
pub use types::*;
