//! Bookmark tokens
//!
//! A navigation context is bookmarked as a short comma-separated token:
//!
//! ```text
//! <location>[,<tag>[,<dataset>]]     location path
//! q=<query>[,<dataset>]              search path
//! (empty)                            root
//! ```
//!
//! Every segment is percent-encoded, so a `,` inside an identifier or query
//! never splits a segment. Parsing a token is pure; turning the parsed
//! identifiers back into a context needs the catalog and happens in
//! [`decode`].

use std::borrow::Cow;

use thiserror::Error;
use tracing::debug;

use crate::cache::CachedCatalog;
use crate::context::NavigationContext;
use crate::error::{ChooserError, Result};

const SEARCH_PREFIX: &str = "q=";

/// The identifiers named by a token, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPath {
    Root,
    Location {
        location: String,
    },
    LocationTag {
        location: String,
        tag: String,
    },
    LocationDataset {
        location: String,
        tag: String,
        dataset: String,
    },
    Search {
        query: String,
    },
    SearchDataset {
        query: String,
        dataset: String,
    },
}

impl TokenPath {
    /// Serialize to the token string
    pub fn to_token(&self) -> String {
        match self {
            TokenPath::Root => String::new(),
            TokenPath::Location { location } => encode_segment(location).into_owned(),
            TokenPath::LocationTag { location, tag } => {
                format!("{},{}", encode_segment(location), encode_segment(tag))
            }
            TokenPath::LocationDataset {
                location,
                tag,
                dataset,
            } => format!(
                "{},{},{}",
                encode_segment(location),
                encode_segment(tag),
                encode_segment(dataset)
            ),
            TokenPath::Search { query } => format!("{}{}", SEARCH_PREFIX, encode_segment(query)),
            TokenPath::SearchDataset { query, dataset } => format!(
                "{}{},{}",
                SEARCH_PREFIX,
                encode_segment(query),
                encode_segment(dataset)
            ),
        }
    }
}

impl From<&NavigationContext> for TokenPath {
    fn from(ctx: &NavigationContext) -> Self {
        match ctx {
            NavigationContext::Root => TokenPath::Root,
            NavigationContext::Location { location } => TokenPath::Location {
                location: location.name.clone(),
            },
            NavigationContext::LocationTag { location, tag } => TokenPath::LocationTag {
                location: location.name.clone(),
                tag: tag.name.clone(),
            },
            NavigationContext::LocationDataset {
                location,
                tag,
                dataset,
            } => TokenPath::LocationDataset {
                location: location.name.clone(),
                tag: tag.name.clone(),
                dataset: dataset.name.clone(),
            },
            NavigationContext::Search { query } => TokenPath::Search {
                query: query.clone(),
            },
            NavigationContext::SearchDataset { query, dataset } => TokenPath::SearchDataset {
                query: query.clone(),
                dataset: dataset.name.clone(),
            },
        }
    }
}

impl NavigationContext {
    /// Bookmark token restoring this context
    pub fn token(&self) -> String {
        encode(self)
    }
}

/// Encode a context as a bookmark token
pub fn encode(ctx: &NavigationContext) -> String {
    TokenPath::from(ctx).to_token()
}

fn encode_segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

fn decode_segment(raw: &str) -> Result<String> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                return Err(ChooserError::InvalidToken(format!(
                    "malformed escape in \"{}\"",
                    raw
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .map_err(|e| ChooserError::InvalidToken(format!("\"{}\": {}", raw, e)))
}

/// Split a token into its identifiers without touching the catalog.
///
/// A leading `#` is ignored. An empty segment ends the chain, and segments
/// beyond the deepest level are ignored.
pub fn parse(token: &str) -> Result<TokenPath> {
    let token = token.strip_prefix('#').unwrap_or(token);

    let raw: Vec<&str> = token
        .split(',')
        .take_while(|segment| !segment.is_empty())
        .collect();

    let Some(first) = raw.first() else {
        return Ok(TokenPath::Root);
    };

    // Checked before decoding so an encoded "q%3D..." stays a location id
    if let Some(query) = first.strip_prefix(SEARCH_PREFIX) {
        let query = decode_segment(query)?;
        return Ok(match raw.get(1) {
            Some(dataset) => TokenPath::SearchDataset {
                query,
                dataset: decode_segment(dataset)?,
            },
            None => TokenPath::Search { query },
        });
    }

    let location = decode_segment(first)?;
    Ok(match (raw.get(1), raw.get(2)) {
        (None, _) => TokenPath::Location { location },
        (Some(tag), None) => TokenPath::LocationTag {
            location,
            tag: decode_segment(tag)?,
        },
        (Some(tag), Some(dataset)) => TokenPath::LocationDataset {
            location,
            tag: decode_segment(tag)?,
            dataset: decode_segment(dataset)?,
        },
    })
}

/// A token that could only be partly restored
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct DecodeFailure {
    /// Why restoration stopped
    #[source]
    pub error: ChooserError,
    /// Deepest context that did resolve (the root if none did)
    pub resolved: NavigationContext,
}

impl DecodeFailure {
    fn at(resolved: &NavigationContext, segment: &str, source: hdx_client::CatalogError) -> Self {
        Self {
            error: ChooserError::Decode {
                segment: segment.to_string(),
                source,
            },
            resolved: resolved.clone(),
        }
    }
}

/// Restore a context from a token, fetching each referenced entity in order.
///
/// Each lookup completes before the next one starts. The first one that
/// fails stops the chain; the failure names the segment and carries the
/// ancestors resolved so far. Whether a dataset actually belongs to the
/// location or tag it is nested under is not checked.
pub async fn decode(
    token: &str,
    catalog: &CachedCatalog,
) -> std::result::Result<NavigationContext, DecodeFailure> {
    let path = parse(token).map_err(|error| DecodeFailure {
        error,
        resolved: NavigationContext::Root,
    })?;
    debug!(?path, "Restoring token");

    resolve(&path, catalog).await
}

async fn resolve(
    path: &TokenPath,
    catalog: &CachedCatalog,
) -> std::result::Result<NavigationContext, DecodeFailure> {
    let root = NavigationContext::Root;

    let (location, tag, dataset) = match path {
        TokenPath::Root => return Ok(root),
        TokenPath::Search { query } => return Ok(NavigationContext::search(query.as_str())),
        TokenPath::SearchDataset { query, dataset } => {
            let search = NavigationContext::search(query.as_str());
            let dataset = catalog
                .get_dataset(dataset)
                .await
                .map_err(|e| DecodeFailure::at(&search, dataset, e))?;
            return Ok(NavigationContext::SearchDataset {
                query: query.clone(),
                dataset,
            });
        }
        TokenPath::Location { location } => (location, None, None),
        TokenPath::LocationTag { location, tag } => (location, Some(tag), None),
        TokenPath::LocationDataset {
            location,
            tag,
            dataset,
        } => (location, Some(tag), Some(dataset)),
    };

    let location = catalog
        .get_location(location)
        .await
        .map_err(|e| DecodeFailure::at(&root, location, e))?;

    let Some(tag_id) = tag else {
        return Ok(NavigationContext::Location { location });
    };
    let tag = match catalog.get_tag(tag_id).await {
        Ok(tag) => tag,
        Err(e) => {
            let resolved = NavigationContext::Location { location };
            return Err(DecodeFailure::at(&resolved, tag_id, e));
        }
    };
    let tagged = NavigationContext::LocationTag { location, tag };

    let Some(dataset_id) = dataset else {
        return Ok(tagged);
    };
    let dataset = catalog
        .get_dataset(dataset_id)
        .await
        .map_err(|e| DecodeFailure::at(&tagged, dataset_id, e))?;
    tagged.enter_dataset(dataset).map_err(|error| DecodeFailure {
        error,
        resolved: tagged.clone(),
    })
}
