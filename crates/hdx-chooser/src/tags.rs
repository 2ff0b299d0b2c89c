//! Tag aggregation
//!
//! Derives the tag folder listing of a location from the tags carried by its
//! datasets: one entry per tag name, counted across datasets, with
//! controlled-vocabulary tags removed and the result sorted by name.

use std::collections::BTreeMap;

use hdx_client::{Dataset, Tag};
use serde::Serialize;

/// A tag together with how often it occurs in some set of datasets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountedTag {
    pub tag: Tag,
    pub occurrence_count: u64,
}

impl CountedTag {
    pub fn name(&self) -> &str {
        &self.tag.name
    }

    pub fn label(&self) -> &str {
        self.tag.label()
    }
}

/// Count the free tags across `datasets`.
///
/// The first sighting of a name decides the tag's metadata; later sightings
/// only add to the count, including repeats within one dataset. Vocabulary
/// tags are dropped after counting. Output is ordered by name, compared by
/// code point.
pub fn aggregate_tags<'a>(datasets: impl IntoIterator<Item = &'a Dataset>) -> Vec<CountedTag> {
    let mut counted: BTreeMap<&str, CountedTag> = BTreeMap::new();

    for dataset in datasets {
        for tag in &dataset.tags {
            counted
                .entry(tag.name.as_str())
                .and_modify(|c| c.occurrence_count += 1)
                .or_insert_with(|| CountedTag {
                    tag: tag.clone(),
                    occurrence_count: 1,
                });
        }
    }

    counted
        .into_values()
        .filter(|c| !c.tag.is_vocabulary())
        .collect()
}
