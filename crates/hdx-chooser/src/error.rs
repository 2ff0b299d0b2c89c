//! Error types for the chooser engine

use hdx_client::CatalogError;
use thiserror::Error;

/// Result type for chooser operations
pub type Result<T> = std::result::Result<T, ChooserError>;

/// Chooser error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChooserError {
    /// A catalog call failed outside of token restoration
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A token segment could not be resolved; later segments were not applied
    #[error("Cannot restore \"{segment}\": {source}")]
    Decode {
        segment: String,
        #[source]
        source: CatalogError,
    },

    /// The token is not valid percent-encoded text
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The selection does not fit the current context
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// The chooser has already delivered a resource or been cancelled
    #[error("Chooser session is closed")]
    SessionClosed,
}

impl ChooserError {
    /// Whether the error means a referenced entity does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ChooserError::Catalog(CatalogError::NotFound(_))
                | ChooserError::Decode {
                    source: CatalogError::NotFound(_),
                    ..
                }
        )
    }
}
