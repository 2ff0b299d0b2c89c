//! Navigation context
//!
//! Where the user currently is in the catalog. The two drill-down paths
//! (location → tag → dataset, and search → dataset) are separate variants,
//! so a tag without a location, or a location together with a search, cannot
//! be expressed.

use hdx_client::{Dataset, Location, Tag};
use serde::Serialize;

use crate::error::{ChooserError, Result};

/// Label of the root breadcrumb
pub const ROOT_LABEL: &str = "All locations";

/// Resolved navigation context
#[derive(Debug, Clone, Default)]
pub enum NavigationContext {
    /// List of all locations
    #[default]
    Root,
    /// Tags of one location
    Location { location: Location },
    /// Datasets of one location carrying one tag
    LocationTag { location: Location, tag: Tag },
    /// Resources of a dataset reached through location and tag
    LocationDataset {
        location: Location,
        tag: Tag,
        dataset: Dataset,
    },
    /// Datasets matching a free-text query
    Search { query: String },
    /// Resources of a dataset reached through a search
    SearchDataset { query: String, dataset: Dataset },
}

/// How a dataset context was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    LocationTag,
    Search,
}

/// Navigation state, without the resolved entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChooserState {
    Root,
    AtLocation,
    AtLocationTag,
    AtSearch,
    AtDataset(Provenance),
}

impl NavigationContext {
    pub fn state(&self) -> ChooserState {
        match self {
            NavigationContext::Root => ChooserState::Root,
            NavigationContext::Location { .. } => ChooserState::AtLocation,
            NavigationContext::LocationTag { .. } => ChooserState::AtLocationTag,
            NavigationContext::LocationDataset { .. } => {
                ChooserState::AtDataset(Provenance::LocationTag)
            }
            NavigationContext::Search { .. } => ChooserState::AtSearch,
            NavigationContext::SearchDataset { .. } => ChooserState::AtDataset(Provenance::Search),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, NavigationContext::Root)
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            NavigationContext::Location { location }
            | NavigationContext::LocationTag { location, .. }
            | NavigationContext::LocationDataset { location, .. } => Some(location),
            _ => None,
        }
    }

    pub fn tag(&self) -> Option<&Tag> {
        match self {
            NavigationContext::LocationTag { tag, .. }
            | NavigationContext::LocationDataset { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        match self {
            NavigationContext::LocationDataset { dataset, .. }
            | NavigationContext::SearchDataset { dataset, .. } => Some(dataset),
            _ => None,
        }
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            NavigationContext::Search { query } | NavigationContext::SearchDataset { query, .. } => {
                Some(query)
            }
            _ => None,
        }
    }

    /// The enclosing context, `None` at the root
    pub fn parent(&self) -> Option<NavigationContext> {
        let parent = match self {
            NavigationContext::Root => return None,
            NavigationContext::Location { .. } | NavigationContext::Search { .. } => {
                NavigationContext::Root
            }
            NavigationContext::LocationTag { location, .. } => NavigationContext::Location {
                location: location.clone(),
            },
            NavigationContext::LocationDataset { location, tag, .. } => {
                NavigationContext::LocationTag {
                    location: location.clone(),
                    tag: tag.clone(),
                }
            }
            NavigationContext::SearchDataset { query, .. } => NavigationContext::Search {
                query: query.clone(),
            },
        };
        Some(parent)
    }

    /// Every context from the root down to this one, inclusive
    pub fn ancestors(&self) -> Vec<NavigationContext> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent();
        while let Some(ctx) = current {
            current = ctx.parent();
            chain.push(ctx);
        }
        chain.reverse();
        chain
    }

    /// Select a location folder from the root listing
    pub fn enter_location(&self, location: Location) -> Result<NavigationContext> {
        match self {
            NavigationContext::Root => Ok(NavigationContext::Location { location }),
            _ => Err(self.invalid("location")),
        }
    }

    /// Select a tag folder inside a location
    pub fn enter_tag(&self, tag: Tag) -> Result<NavigationContext> {
        match self {
            NavigationContext::Location { location } => Ok(NavigationContext::LocationTag {
                location: location.clone(),
                tag,
            }),
            _ => Err(self.invalid("tag")),
        }
    }

    /// Select a dataset from a tag listing or search results
    pub fn enter_dataset(&self, dataset: Dataset) -> Result<NavigationContext> {
        match self {
            NavigationContext::LocationTag { location, tag } => {
                Ok(NavigationContext::LocationDataset {
                    location: location.clone(),
                    tag: tag.clone(),
                    dataset,
                })
            }
            NavigationContext::Search { query } => Ok(NavigationContext::SearchDataset {
                query: query.clone(),
                dataset,
            }),
            _ => Err(self.invalid("dataset")),
        }
    }

    /// A search replaces the context from any state
    pub fn search(query: impl Into<String>) -> NavigationContext {
        NavigationContext::Search {
            query: query.into(),
        }
    }

    /// Breadcrumb label for this context
    pub fn crumb_label(&self) -> String {
        match self {
            NavigationContext::Root => ROOT_LABEL.to_string(),
            NavigationContext::Location { location } => location.label().to_string(),
            NavigationContext::LocationTag { tag, .. } => tag.label().to_string(),
            NavigationContext::Search { query } => format!("Search \"{}\"", query),
            NavigationContext::LocationDataset { dataset, .. }
            | NavigationContext::SearchDataset { dataset, .. } => dataset.label().to_string(),
        }
    }

    fn invalid(&self, target: &str) -> ChooserError {
        ChooserError::InvalidTransition(format!("cannot open a {} from {:?}", target, self.state()))
    }
}

/// Contexts are equal when they reference the same identifiers
impl PartialEq for NavigationContext {
    fn eq(&self, other: &Self) -> bool {
        self.state() == other.state()
            && self.location().map(|l| &l.name) == other.location().map(|l| &l.name)
            && self.tag().map(|t| &t.name) == other.tag().map(|t| &t.name)
            && self.dataset().map(|d| &d.name) == other.dataset().map(|d| &d.name)
            && self.query() == other.query()
    }
}

impl Eq for NavigationContext {}
