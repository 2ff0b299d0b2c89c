//! Error types for the catalog client

use thiserror::Error;

/// Catalog gateway error
///
/// `Clone` so a single failed fetch can be handed to every caller that was
/// waiting on the same request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The referenced location, tag or dataset does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The payload did not match the expected shape
    #[error("Bad response: {0}")]
    BadResponse(String),

    /// Network failure or non-success HTTP status
    #[error("Catalog unreachable: {0}")]
    Unreachable(String),

    /// No answer within the per-call timeout
    #[error("Catalog request timed out after {0}ms")]
    Timeout(u64),
}

impl CatalogError {
    /// Build a `BadResponse` from a serde failure
    pub fn bad_response(what: &str, err: impl std::fmt::Display) -> Self {
        CatalogError::BadResponse(format!("{}: {}", what, err))
    }
}

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;
