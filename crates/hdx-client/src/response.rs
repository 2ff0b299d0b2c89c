//! Typed decoding of catalog results
//!
//! Gateways return the raw `result` member of the CKAN envelope. These
//! functions validate it against the expected schema; any mismatch becomes
//! [`CatalogError::BadResponse`] instead of leaking an untyped value.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CatalogError, Result};
use crate::types::{Dataset, Location, SearchResults, Tag};

fn parse<T: DeserializeOwned>(what: &str, value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| CatalogError::bad_response(what, e))
}

/// `group_list` result, sorted by display name
pub fn locations(value: &Value) -> Result<Vec<Location>> {
    let mut locations: Vec<Location> = parse("location list", value)?;
    locations.sort_by(|a, b| {
        a.label()
            .to_lowercase()
            .cmp(&b.label().to_lowercase())
            .then_with(|| a.label().cmp(b.label()))
    });
    Ok(locations)
}

/// Location summary taken from the groups of the first dataset in a
/// single-row `group_package_show` result
pub fn location(value: &Value, id: &str) -> Result<Location> {
    #[derive(Deserialize)]
    struct GroupsOnly {
        #[serde(default)]
        groups: Vec<Location>,
    }

    let rows: Vec<GroupsOnly> = parse("location lookup", value)?;
    rows.into_iter()
        .next()
        .and_then(|row| row.groups.into_iter().find(|g| g.name == id))
        .ok_or_else(|| CatalogError::NotFound(format!("location {}", id)))
}

/// `group_package_show` result
pub fn datasets(value: &Value) -> Result<Vec<Dataset>> {
    parse("dataset list", value)
}

/// `package_search` result
pub fn search_results(value: &Value) -> Result<SearchResults> {
    parse("search results", value)
}

/// `tag_show` result
pub fn tag(value: &Value) -> Result<Tag> {
    parse("tag", value)
}

/// `package_show` result
pub fn dataset(value: &Value) -> Result<Dataset> {
    parse("dataset", value)
}
