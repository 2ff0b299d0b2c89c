//! Configuration for the chooser binary
//!
//! CLI arguments and environment variable handling using clap.

use std::time::Duration;

use clap::Parser;
use hdx_client::CatalogConfig;

/// HDX resource chooser
///
/// Browse the Humanitarian Data Exchange by location, tag and dataset, or by
/// search, and pick one resource.
#[derive(Parser, Debug, Clone)]
#[command(name = "hdx-chooser")]
#[command(about = "Drill down through the HDX catalog and pick a resource")]
pub struct Args {
    /// Base URL of the HDX (CKAN) instance
    #[arg(long, env = "HDX_URL", default_value = "https://data.humdata.org")]
    pub catalog_url: String,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "HDX_TIMEOUT_MS", default_value = "30000")]
    pub timeout_ms: u64,

    /// Row limit for dataset listings
    #[arg(long, env = "HDX_PAGE_LIMIT", default_value = "99999")]
    pub page_limit: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Opened by another program: print the chosen resource as JSON on
    /// stdout and exit instead of printing its download URL
    #[arg(long, env = "HDX_HANDOFF", default_value = "false")]
    pub handoff: bool,

    /// Bookmark token to start from (e.g. "haiti,3w" or "q=cholera")
    pub token: Option<String>,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let url = self.catalog_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!(
                "HDX_URL must be an http(s) URL, got \"{}\"",
                self.catalog_url
            ));
        }

        if self.timeout_ms == 0 {
            return Err("HDX_TIMEOUT_MS must be greater than zero".to_string());
        }

        if self.page_limit == 0 {
            return Err("HDX_PAGE_LIMIT must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Catalog client configuration
    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            base_url: self.catalog_url.trim().trim_end_matches('/').to_string(),
            timeout_ms: self.timeout_ms,
            page_limit: self.page_limit,
        }
    }

    /// Timeout applied to each catalog call
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
