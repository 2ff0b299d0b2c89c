//! Render requests
//!
//! Everything a front end needs to draw one screen: the listing, the
//! overview, the breadcrumb trail and the titles. Built from a resolved
//! context and the data loaded for it; no further catalog access.

use hdx_client::{Dataset, Location, Resource, SearchResults};
use serde::Serialize;

use crate::context::{ChooserState, NavigationContext};
use crate::tags::CountedTag;

/// Maximum location names shown in a dataset overview
const MAX_OVERVIEW_LOCATIONS: usize = 5;

/// One step of the breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub label: String,
    /// Token restoring this ancestor
    pub token: String,
    /// The context being rendered; front ends do not link it
    pub current: bool,
}

/// A labelled value in the overview panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewFact {
    pub label: String,
    pub value: String,
}

impl OverviewFact {
    fn new(label: &str, value: impl ToString) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

/// The folders or files shown for a context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum Listing {
    Locations(Vec<Location>),
    Tags(Vec<CountedTag>),
    Datasets(SearchResults),
    Resources(Vec<Resource>),
}

impl Listing {
    pub fn len(&self) -> usize {
        match self {
            Listing::Locations(items) => items.len(),
            Listing::Tags(items) => items.len(),
            Listing::Datasets(results) => results.results.len(),
            Listing::Resources(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One display line per item, in listing order
    pub fn labels(&self) -> Vec<String> {
        match self {
            Listing::Locations(items) => items
                .iter()
                .map(|l| format!("{} ({})", l.label(), l.package_count))
                .collect(),
            Listing::Tags(items) => items
                .iter()
                .map(|t| format!("{} ({})", t.label(), t.occurrence_count))
                .collect(),
            Listing::Datasets(results) => results.results.iter().map(dataset_line).collect(),
            Listing::Resources(items) => items
                .iter()
                .map(|r| match r.format.as_deref().filter(|f| !f.is_empty()) {
                    Some(format) => format!("{} [{}]", r.label(), format),
                    None => r.label().to_string(),
                })
                .collect(),
        }
    }
}

fn dataset_line(dataset: &Dataset) -> String {
    let mut line = format!("{} ({})", dataset.label(), dataset.file_count_label());
    if let Some(source) = dataset.source() {
        line.push_str(" - ");
        line.push_str(source);
    }
    line
}

/// One screen of the chooser
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderRequest {
    /// Navigation generation this render belongs to
    pub generation: u64,
    /// Bookmark token of the rendered context
    pub token: String,
    pub state: ChooserState,
    pub page_title: String,
    pub overview_title: String,
    pub overview: Vec<OverviewFact>,
    /// The same view on the catalog's own web site
    pub catalog_url: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub listing: Listing,
}

impl RenderRequest {
    pub fn build(
        generation: u64,
        ctx: &NavigationContext,
        listing: Listing,
        base_url: &str,
    ) -> Self {
        let catalog_url = catalog_url(ctx, base_url);
        let mut overview = overview_facts(ctx, &listing);
        overview.push(OverviewFact::new("View on HDX", &catalog_url));

        Self {
            generation,
            token: ctx.token(),
            state: ctx.state(),
            page_title: page_title(ctx),
            overview_title: overview_title(ctx),
            overview,
            catalog_url,
            breadcrumbs: breadcrumbs(ctx),
            listing,
        }
    }
}

/// Root crumb first, then one per nesting level; the last one is current
pub fn breadcrumbs(ctx: &NavigationContext) -> Vec<Breadcrumb> {
    ctx.ancestors()
        .into_iter()
        .map(|ancestor| Breadcrumb {
            label: ancestor.crumb_label(),
            token: ancestor.token(),
            current: ancestor == *ctx,
        })
        .collect()
}

pub fn page_title(ctx: &NavigationContext) -> String {
    match ctx {
        NavigationContext::Root => "Locations (HDX)".to_string(),
        NavigationContext::Location { location } => format!("{} (HDX)", location.label()),
        NavigationContext::LocationTag { location, tag } => {
            format!("{} - {} (HDX)", location.label(), tag.label())
        }
        NavigationContext::Search { query } => format!("Search \"{}\" (HDX)", query),
        NavigationContext::LocationDataset { dataset, .. }
        | NavigationContext::SearchDataset { dataset, .. } => format!("{} (HDX)", dataset.label()),
    }
}

pub fn overview_title(ctx: &NavigationContext) -> String {
    match ctx {
        NavigationContext::Root => "All locations".to_string(),
        NavigationContext::Location { location } => format!("Tags for {}", location.label()),
        NavigationContext::LocationTag { location, tag } => format!(
            "Datasets for tag \"{}\" in {}",
            tag.label(),
            location.label()
        ),
        NavigationContext::Search { query } => format!("Search results for \"{}\"", query),
        NavigationContext::LocationDataset { dataset, .. }
        | NavigationContext::SearchDataset { dataset, .. } => {
            format!("Files in dataset \"{}\"", dataset.label())
        }
    }
}

/// Link to the same view on the catalog web site
pub fn catalog_url(ctx: &NavigationContext, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let enc = |s: &str| urlencoding::encode(s).into_owned();
    match ctx {
        NavigationContext::Root => format!("{}/group", base),
        NavigationContext::Location { location } => {
            format!("{}/group/{}", base, enc(&location.name))
        }
        NavigationContext::LocationTag { location, tag } => format!(
            "{}/search?tags={}&groups={}",
            base,
            enc(&tag.name),
            enc(&location.name)
        ),
        NavigationContext::Search { query } => format!("{}/dataset?q={}", base, enc(query)),
        NavigationContext::LocationDataset { dataset, .. }
        | NavigationContext::SearchDataset { dataset, .. } => {
            format!("{}/dataset/{}", base, enc(&dataset.name))
        }
    }
}

fn overview_facts(ctx: &NavigationContext, listing: &Listing) -> Vec<OverviewFact> {
    match ctx {
        NavigationContext::Root => vec![OverviewFact::new("Total locations", listing.len())],
        NavigationContext::Location { .. } => vec![OverviewFact::new("Total tags", listing.len())],
        NavigationContext::LocationTag { .. } => {
            vec![OverviewFact::new("Total datasets", listing.len())]
        }
        NavigationContext::Search { query } => {
            let matching = match listing {
                Listing::Datasets(results) => results.count,
                other => other.len() as u64,
            };
            vec![
                OverviewFact::new("Search query", query),
                OverviewFact::new("Matching datasets", matching),
            ]
        }
        NavigationContext::LocationDataset { dataset, .. }
        | NavigationContext::SearchDataset { dataset, .. } => dataset_facts(dataset),
    }
}

fn dataset_facts(dataset: &Dataset) -> Vec<OverviewFact> {
    let mut locations: Vec<String> = dataset
        .groups
        .iter()
        .take(MAX_OVERVIEW_LOCATIONS)
        .map(|l| l.label().to_string())
        .collect();
    if dataset.groups.len() > MAX_OVERVIEW_LOCATIONS {
        locations.push(format!("etc. ({} total)", dataset.groups.len()));
    }
    let tags: Vec<&str> = dataset.tags.iter().map(|t| t.label()).collect();

    let mut facts = vec![
        OverviewFact::new("Location(s)", locations.join(", ")),
        OverviewFact::new("Tag(s)", tags.join(", ")),
        OverviewFact::new("Uploader", dataset.uploader().unwrap_or("")),
    ];
    if let Some(source) = dataset.declared_source() {
        facts.push(OverviewFact::new("Source", source));
    }
    facts
}
