//! HTTP client for the CKAN action API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CatalogError, Result};
use crate::gateway::CatalogGateway;
use crate::query::CatalogQuery;
use crate::types::CatalogConfig;

/// CKAN response envelope
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    #[serde(rename = "__type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the HDX catalog
///
/// # Example
///
/// ```rust,no_run
/// use hdx_client::{CatalogClient, CatalogConfig, CatalogGateway, CatalogQuery};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CatalogClient::new(CatalogConfig::default())?;
/// let raw = client.fetch(&CatalogQuery::get_tag("3w")).await?;
/// # Ok(())
/// # }
/// ```
pub struct CatalogClient {
    config: CatalogConfig,
    client: Client,
}

impl CatalogClient {
    /// Create a new catalog client
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| CatalogError::Unreachable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the client configuration
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Full action URL for a query, parameters percent-encoded
    pub fn action_url(&self, query: &CatalogQuery) -> String {
        let mut url = format!(
            "{}/api/action/{}",
            self.config.base_url.trim_end_matches('/'),
            query.action()
        );

        let params: Vec<String> = query
            .action_params(self.config.page_limit)
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, urlencoding::encode(&value)))
            .collect();
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        url
    }

    fn transport_error(&self, err: reqwest::Error) -> CatalogError {
        if err.is_timeout() {
            CatalogError::Timeout(self.config.timeout_ms)
        } else {
            CatalogError::Unreachable(err.to_string())
        }
    }

    async fn handle_response(
        &self,
        query: &CatalogQuery,
        response: reqwest::Response,
    ) -> Result<Value> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(query.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%query, status = status.as_u16(), "Catalog returned an error status");
            return Err(CatalogError::Unreachable(format!(
                "HTTP {} for {}: {}",
                status.as_u16(),
                query,
                body
            )));
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let envelope: Envelope = serde_json::from_slice(&body)
            .map_err(|e| CatalogError::bad_response("envelope", e))?;

        if !envelope.success {
            let error = envelope.error.unwrap_or(EnvelopeError {
                kind: None,
                message: None,
            });
            if error.kind.as_deref() == Some("Not Found Error") {
                return Err(CatalogError::NotFound(query.to_string()));
            }
            return Err(CatalogError::BadResponse(format!(
                "{} failed: {}",
                query,
                error.message.unwrap_or_else(|| "no message".to_string())
            )));
        }

        envelope
            .result
            .ok_or_else(|| CatalogError::BadResponse(format!("{} returned no result", query)))
    }
}

#[async_trait]
impl CatalogGateway for CatalogClient {
    async fn fetch(&self, query: &CatalogQuery) -> Result<Value> {
        let url = self.action_url(query);
        debug!(%query, %url, "Catalog request");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.handle_response(query, response).await
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }
}
