//! Catalog queries
//!
//! Each variant is one read operation against the catalog. A query knows its
//! CKAN action and parameters; callers that need a cache key use
//! [`CatalogQuery::operation`] and [`CatalogQuery::params`], which are stable
//! and independent of how the query was built.

use std::fmt;

/// A read operation against the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CatalogQuery {
    /// All locations, with dataset counts
    ListLocations,
    /// One location by name
    GetLocation { id: String },
    /// All datasets in a location (used to derive its tags)
    LocationDatasets { location: String },
    /// One tag by name
    GetTag { id: String },
    /// Datasets in a location carrying a tag
    LocationTagDatasets { location: String, tag: String },
    /// Free-text dataset search
    SearchDatasets { query: String },
    /// One dataset with all its resources
    GetDataset { id: String },
}

impl CatalogQuery {
    pub fn get_location(id: impl Into<String>) -> Self {
        CatalogQuery::GetLocation { id: id.into() }
    }

    pub fn location_datasets(location: impl Into<String>) -> Self {
        CatalogQuery::LocationDatasets {
            location: location.into(),
        }
    }

    pub fn get_tag(id: impl Into<String>) -> Self {
        CatalogQuery::GetTag { id: id.into() }
    }

    pub fn location_tag_datasets(location: impl Into<String>, tag: impl Into<String>) -> Self {
        CatalogQuery::LocationTagDatasets {
            location: location.into(),
            tag: tag.into(),
        }
    }

    pub fn search(query: impl Into<String>) -> Self {
        CatalogQuery::SearchDatasets {
            query: query.into(),
        }
    }

    pub fn get_dataset(id: impl Into<String>) -> Self {
        CatalogQuery::GetDataset { id: id.into() }
    }

    /// Operation name, independent of parameters
    pub fn operation(&self) -> &'static str {
        match self {
            CatalogQuery::ListLocations => "list_locations",
            CatalogQuery::GetLocation { .. } => "get_location",
            CatalogQuery::LocationDatasets { .. } => "location_datasets",
            CatalogQuery::GetTag { .. } => "get_tag",
            CatalogQuery::LocationTagDatasets { .. } => "location_tag_datasets",
            CatalogQuery::SearchDatasets { .. } => "search_datasets",
            CatalogQuery::GetDataset { .. } => "get_dataset",
        }
    }

    /// Named parameters, sorted by name
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = match self {
            CatalogQuery::ListLocations => vec![],
            CatalogQuery::GetLocation { id }
            | CatalogQuery::GetTag { id }
            | CatalogQuery::GetDataset { id } => vec![("id", id.as_str())],
            CatalogQuery::LocationDatasets { location } => vec![("location", location.as_str())],
            CatalogQuery::LocationTagDatasets { location, tag } => {
                vec![("tag", tag.as_str()), ("location", location.as_str())]
            }
            CatalogQuery::SearchDatasets { query } => vec![("query", query.as_str())],
        };
        params.sort_by(|a, b| a.0.cmp(b.0));
        params
    }

    /// CKAN action name
    pub fn action(&self) -> &'static str {
        match self {
            CatalogQuery::ListLocations => "group_list",
            CatalogQuery::GetLocation { .. } | CatalogQuery::LocationDatasets { .. } => {
                "group_package_show"
            }
            CatalogQuery::GetTag { .. } => "tag_show",
            CatalogQuery::LocationTagDatasets { .. } | CatalogQuery::SearchDatasets { .. } => {
                "package_search"
            }
            CatalogQuery::GetDataset { .. } => "package_show",
        }
    }

    /// CKAN query-string parameters (unencoded)
    pub fn action_params(&self, page_limit: u32) -> Vec<(&'static str, String)> {
        match self {
            CatalogQuery::ListLocations => vec![("all_fields", "1".to_string())],
            // group_show would carry the whole boundary outline; the first
            // dataset of the group holds a compact summary instead
            CatalogQuery::GetLocation { id } => {
                vec![("limit", "1".to_string()), ("id", id.clone())]
            }
            CatalogQuery::LocationDatasets { location } => {
                vec![("limit", page_limit.to_string()), ("id", location.clone())]
            }
            CatalogQuery::GetTag { id } | CatalogQuery::GetDataset { id } => {
                vec![("id", id.clone())]
            }
            CatalogQuery::LocationTagDatasets { location, tag } => vec![
                ("q", format!("vocab_Topics:\"{}\" groups:\"{}\"", tag, location)),
                ("rows", page_limit.to_string()),
                ("facet.limit", "-1".to_string()),
            ],
            CatalogQuery::SearchDatasets { query } => {
                vec![("rows", page_limit.to_string()), ("q", query.clone())]
            }
        }
    }
}

impl fmt::Display for CatalogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.operation())?;
        for (i, (name, value)) in self.params().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={:?}", name, value)?;
        }
        write!(f, ")")
    }
}
