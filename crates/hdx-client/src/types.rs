//! Catalog entity schemas
//!
//! Field names follow the CKAN JSON payloads served by HDX. List views carry
//! summary fields only, so everything beyond the identifier is defaulted.

use serde::{Deserialize, Serialize};

/// Client configuration
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the catalog (no trailing slash)
    pub base_url: String,
    /// Per-request timeout in milliseconds (default: 30000)
    pub timeout_ms: u64,
    /// Row limit for list queries (default: 99999)
    pub page_limit: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://data.humdata.org".to_string(),
            timeout_ms: 30_000,
            page_limit: 99_999,
        }
    }
}

/// A location (CKAN group), e.g. a country
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Stable short name (e.g. "gin")
    pub name: String,
    /// Human-readable name
    #[serde(default)]
    pub display_name: Option<String>,
    /// Title, used when no display name is present
    #[serde(default)]
    pub title: Option<String>,
    /// Number of datasets in this location
    #[serde(default)]
    pub package_count: u64,
}

impl Location {
    /// Create a location with a display name
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: Some(display_name.into()),
            title: None,
            package_count: 0,
        }
    }

    /// Set the dataset count
    pub fn with_package_count(mut self, count: u64) -> Self {
        self.package_count = count;
        self
    }

    /// Label to show to the user
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or(&self.name)
    }
}

/// A tag attached to datasets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name (identifier)
    pub name: String,
    /// Human-readable name
    #[serde(default)]
    pub display_name: Option<String>,
    /// Present when the tag belongs to a controlled vocabulary
    #[serde(default)]
    pub vocabulary_id: Option<String>,
}

impl Tag {
    /// Create a free tag
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: Some(name.clone()),
            name,
            vocabulary_id: None,
        }
    }

    /// Set the display name
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Mark the tag as part of a controlled vocabulary
    pub fn with_vocabulary(mut self, vocabulary_id: impl Into<String>) -> Self {
        self.vocabulary_id = Some(vocabulary_id.into());
        self
    }

    /// Whether this tag is system-managed rather than a free tag
    pub fn is_vocabulary(&self) -> bool {
        self.vocabulary_id.is_some()
    }

    /// Label to show to the user
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Publishing organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization short name
    #[serde(default)]
    pub name: String,
    /// Organization title
    #[serde(default)]
    pub title: Option<String>,
}

/// Free-form key/value metadata on a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extra {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// A downloadable file inside a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource id
    #[serde(default)]
    pub id: String,
    /// Resource name (also its display name on HDX)
    #[serde(default)]
    pub name: Option<String>,
    /// Format label (e.g. "CSV", "XLSX")
    #[serde(default)]
    pub format: Option<String>,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Download URL
    pub url: String,
}

impl Resource {
    /// Create a resource with a name and download URL
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name: Some(name),
            format: None,
            description: None,
            url: url.into(),
        }
    }

    /// Set the format label
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Label to show to the user
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.url)
    }
}

/// A dataset (CKAN package)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Stable short name (e.g. "guinea_3w_data")
    pub name: String,
    /// Title
    #[serde(default)]
    pub title: Option<String>,
    /// Notes / description
    #[serde(default)]
    pub notes: Option<String>,
    /// Uploading organization
    #[serde(default)]
    pub organization: Option<Organization>,
    /// Locations this dataset belongs to
    #[serde(default)]
    pub groups: Vec<Location>,
    /// Tags carried by this dataset
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Number of resources
    #[serde(default)]
    pub num_resources: u64,
    /// Resources (only complete after a full fetch)
    #[serde(default)]
    pub resources: Vec<Resource>,
    /// Extra metadata
    #[serde(default)]
    pub extras: Vec<Extra>,
    /// Source, when published as a top-level field
    #[serde(default)]
    pub dataset_source: Option<String>,
}

impl Dataset {
    /// Create a dataset with a title and no other metadata
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: Some(title.into()),
            notes: None,
            organization: None,
            groups: Vec::new(),
            tags: Vec::new(),
            num_resources: 0,
            resources: Vec::new(),
            extras: Vec::new(),
            dataset_source: None,
        }
    }

    /// Add a location
    pub fn in_location(mut self, location: Location) -> Self {
        self.groups.push(location);
        self
    }

    /// Add a tag
    pub fn tagged(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Add a resource, keeping `num_resources` in step
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self.num_resources = self.resources.len() as u64;
        self
    }

    /// Set the organization
    pub fn with_organization(mut self, name: impl Into<String>, title: impl Into<String>) -> Self {
        self.organization = Some(Organization {
            name: name.into(),
            title: Some(title.into()),
        });
        self
    }

    /// Label to show to the user
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    /// Whether the dataset is listed under a location
    pub fn belongs_to(&self, location: &str) -> bool {
        self.groups.iter().any(|g| g.name == location)
    }

    /// Whether the dataset carries a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.name == tag)
    }

    /// Source declared by the publisher: the `dataset_source` extra, then
    /// the top-level field
    pub fn declared_source(&self) -> Option<&str> {
        self.extras
            .iter()
            .find(|e| e.key == "dataset_source")
            .and_then(|e| e.value.as_deref())
            .or(self.dataset_source.as_deref())
    }

    /// Display source, falling back to the organization title
    pub fn source(&self) -> Option<&str> {
        self.declared_source().or_else(|| self.uploader())
    }

    /// Title of the uploading organization
    pub fn uploader(&self) -> Option<&str> {
        self.organization.as_ref().and_then(|o| o.title.as_deref())
    }

    /// "1 file" / "n files"
    pub fn file_count_label(&self) -> String {
        if self.num_resources == 1 {
            "1 file".to_string()
        } else {
            format!("{} files", self.num_resources)
        }
    }
}

/// Result of a `package_search` query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Total matching datasets reported by the catalog
    #[serde(default)]
    pub count: u64,
    /// Returned datasets
    #[serde(default)]
    pub results: Vec<Dataset>,
}
