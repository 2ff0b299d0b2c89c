//! End-to-end navigation scenarios against an in-memory catalog
//!
//! Each test drives a `NavigationService` the way a front end would and
//! checks the emitted events together with the calls the catalog saw.

use std::sync::Arc;
use std::time::Duration;

use hdx_chooser::{
    codec, handoff, CachedCatalog, ChooserError, CloseReason, HandoffMode, Listing,
    NavigationContext, NavigationEvent, NavigationService, RenderRequest, Selected, Transition,
};
use hdx_client::{CatalogQuery, Dataset, Location, MockGateway, Resource, Tag};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_test::{assert_err, assert_ok};

fn haiti() -> Location {
    Location::new("haiti", "Haiti").with_package_count(2)
}

fn myanmar() -> Location {
    Location::new("mmr", "Myanmar").with_package_count(1)
}

/// Two locations; the Myanmar dataset is not listed under Haiti
fn catalog() -> MockGateway {
    MockGateway::new()
        .with_location(haiti())
        .with_location(myanmar())
        .with_tag(Tag::new("3w").with_display_name("3W"))
        .with_tag(Tag::new("health"))
        .with_dataset(
            Dataset::new("haiti_3w_data", "Haiti 3W")
                .in_location(haiti())
                .tagged(Tag::new("3w"))
                .tagged(Tag::new("health"))
                .with_organization("ocha-haiti", "OCHA Haiti")
                .with_resource(
                    Resource::new("haiti_3w.csv", "https://example.org/haiti_3w.csv")
                        .with_format("CSV"),
                )
                .with_resource(Resource::new("haiti_3w.xlsx", "https://example.org/haiti_3w.xlsx")),
        )
        .with_dataset(
            Dataset::new("haiti_health", "Haiti health facilities")
                .in_location(haiti())
                .tagged(Tag::new("health")),
        )
        .with_dataset(
            Dataset::new("myanmar_3w_data", "Myanmar 3W")
                .in_location(myanmar())
                .tagged(Tag::new("3w"))
                .with_resource(Resource::new("mmr.csv", "https://example.org/mmr.csv")),
        )
}

fn start(
    gateway: Arc<MockGateway>,
    mode: HandoffMode,
) -> (NavigationService, UnboundedReceiver<NavigationEvent>) {
    NavigationService::new(CachedCatalog::new(gateway), mode)
}

fn drain(rx: &mut UnboundedReceiver<NavigationEvent>) -> Vec<NavigationEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

fn renders(events: &[NavigationEvent]) -> Vec<&RenderRequest> {
    events
        .iter()
        .filter_map(|e| match e {
            NavigationEvent::Render(r) => Some(r),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_empty_token_renders_root() {
    let gateway = Arc::new(catalog());
    let (svc, mut rx) = start(gateway.clone(), HandoffMode::Standalone);

    assert_ok!(svc.restore("").await);

    let events = drain(&mut rx);
    let renders = renders(&events);
    assert_eq!(renders.len(), 1);
    let root = renders[0];
    assert_eq!(root.breadcrumbs.len(), 1);
    assert_eq!(root.breadcrumbs[0].label, "All locations");
    assert!(root.breadcrumbs[0].current);
    assert_eq!(root.page_title, "Locations (HDX)");
    match &root.listing {
        Listing::Locations(locations) => {
            let names: Vec<&str> = locations.iter().map(|l| l.name.as_str()).collect();
            assert_eq!(names, vec!["haiti", "mmr"]);
        }
        other => panic!("expected locations, got {:?}", other),
    }
    assert_eq!(gateway.total_calls(), 1);
}

#[tokio::test]
async fn test_token_decodes_without_membership_check() {
    let gateway = Arc::new(catalog());
    let catalog = CachedCatalog::new(gateway.clone());

    let ctx = assert_ok!(codec::decode("haiti,3w,myanmar_3w_data", &catalog).await);
    assert_eq!(ctx.location().map(|l| l.name.as_str()), Some("haiti"));
    assert_eq!(ctx.tag().map(|t| t.name.as_str()), Some("3w"));
    let dataset = ctx.dataset().unwrap();
    assert_eq!(dataset.name, "myanmar_3w_data");
    assert!(!dataset.belongs_to("haiti"));

    // One lookup per segment, in order
    assert_eq!(gateway.call_count(&CatalogQuery::get_location("haiti")), 1);
    assert_eq!(gateway.call_count(&CatalogQuery::get_tag("3w")), 1);
    assert_eq!(gateway.call_count(&CatalogQuery::get_dataset("myanmar_3w_data")), 1);
    assert_eq!(gateway.total_calls(), 3);
}

#[tokio::test]
async fn test_every_context_round_trips() {
    // Identifiers that need escaping
    let odd = Location::new("q=odd, place", "Odd place");
    let gateway = Arc::new(
        catalog()
            .with_location(odd.clone())
            .with_tag(Tag::new("a,b"))
            .with_dataset(
                Dataset::new("d,1 %", "Odd dataset")
                    .in_location(odd.clone())
                    .tagged(Tag::new("a,b")),
            ),
    );
    let catalog = CachedCatalog::new(gateway);

    let location = catalog.get_location("q=odd, place").await.unwrap();
    let tag = catalog.get_tag("a,b").await.unwrap();
    let dataset = catalog.get_dataset("d,1 %").await.unwrap();

    let root = NavigationContext::Root;
    let at_location = root.enter_location(location).unwrap();
    let at_tag = at_location.enter_tag(tag).unwrap();
    let at_dataset = at_tag.enter_dataset(dataset.clone()).unwrap();
    let search = NavigationContext::search("cholera, q=1 #2");
    let search_dataset = search.enter_dataset(dataset).unwrap();

    for ctx in [root, at_location, at_tag, at_dataset, search, search_dataset] {
        let token = codec::encode(&ctx);
        let decoded = assert_ok!(codec::decode(&token, &catalog).await);
        assert_eq!(decoded, ctx, "token {:?}", token);
        assert_eq!(decoded.token(), token);
    }
}

#[tokio::test]
async fn test_restoring_same_token_twice_is_a_no_op() {
    let gateway = Arc::new(catalog());
    let (svc, mut rx) = start(gateway.clone(), HandoffMode::Standalone);

    let first = assert_ok!(svc.restore("haiti,3w").await);
    assert!(matches!(first, Transition::Rendered { .. }));
    let calls = gateway.total_calls();

    assert_eq!(svc.restore("#haiti,3w").await, Ok(Transition::Unchanged));
    assert_eq!(gateway.total_calls(), calls);

    let events = drain(&mut rx);
    assert_eq!(renders(&events).len(), 1);
}

#[tokio::test]
async fn test_tag_listing_counts_and_filters() {
    let topics = Tag::new("topic-health").with_vocabulary("hxl-topics");
    let loc = Location::new("gin", "Guinea");
    let gateway = Arc::new(
        MockGateway::new()
            .with_location(loc.clone())
            .with_dataset(
                Dataset::new("d1", "D1")
                    .in_location(loc.clone())
                    .tagged(Tag::new("a"))
                    .tagged(Tag::new("a"))
                    .tagged(Tag::new("b"))
                    .tagged(topics.clone()),
            )
            .with_dataset(
                Dataset::new("d2", "D2")
                    .in_location(loc.clone())
                    .tagged(Tag::new("a"))
                    .tagged(Tag::new("c"))
                    .tagged(topics.clone()),
            )
            .with_dataset(Dataset::new("d3", "D3").in_location(loc).tagged(topics)),
    );
    let (svc, mut rx) = start(gateway, HandoffMode::Standalone);

    assert_ok!(svc.restore("gin").await);

    let events = drain(&mut rx);
    let render = renders(&events)[0];
    match &render.listing {
        Listing::Tags(tags) => {
            let counted: Vec<(&str, u64)> = tags
                .iter()
                .map(|t| (t.tag.name.as_str(), t.occurrence_count))
                .collect();
            assert_eq!(counted, vec![("a", 3), ("b", 1), ("c", 1)]);
        }
        other => panic!("expected tags, got {:?}", other),
    }
    assert_eq!(render.overview_title, "Tags for Guinea");
}

#[tokio::test]
async fn test_concurrent_identical_requests_share_one_call() {
    let gateway = Arc::new(
        catalog().with_delay(CatalogQuery::ListLocations, Duration::from_millis(40)),
    );
    let catalog = CachedCatalog::new(gateway.clone());

    let (a, b, c) = tokio::join!(
        catalog.list_locations(),
        catalog.list_locations(),
        catalog.list_locations()
    );
    assert_eq!(assert_ok!(a), assert_ok!(b));
    assert_ok!(c);
    assert_eq!(gateway.call_count(&CatalogQuery::ListLocations), 1);
    assert_eq!(catalog.stats().coalesced, 2);

    // Later calls are plain cache hits
    assert_ok!(catalog.list_locations().await);
    assert_eq!(gateway.call_count(&CatalogQuery::ListLocations), 1);
    assert_eq!(catalog.stats().hits, 1);
}

#[tokio::test]
async fn test_slow_result_never_overwrites_newer_context() {
    let gateway = Arc::new(
        catalog().with_delay(CatalogQuery::location_datasets("haiti"), Duration::from_millis(80)),
    );
    let (svc, mut rx) = start(gateway, HandoffMode::Standalone);

    let (slow, fast) = tokio::join!(svc.restore("haiti"), svc.restore("q=health"));
    assert_eq!(slow, Ok(Transition::Superseded));
    assert!(matches!(fast, Ok(Transition::Rendered { .. })));

    let events = drain(&mut rx);
    let tokens: Vec<&str> = renders(&events).iter().map(|r| r.token.as_str()).collect();
    assert_eq!(tokens, vec!["q=health"]);
    assert_eq!(svc.current().query(), Some("health"));
}

#[tokio::test]
async fn test_restoring_screen_token_during_navigation_wins() {
    let gateway = Arc::new(
        catalog().with_delay(CatalogQuery::location_datasets("haiti"), Duration::from_millis(80)),
    );
    let (svc, mut rx) = start(gateway, HandoffMode::Standalone);
    assert_ok!(svc.restore("").await);

    // Leave the root, then go straight back while the location is loading
    let (open, back) = tokio::join!(svc.open_location(haiti()), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        svc.restore("").await
    });
    assert_eq!(open, Ok(Transition::Superseded));
    assert!(matches!(back, Ok(Transition::Rendered { .. })));

    let events = drain(&mut rx);
    let tokens: Vec<&str> = renders(&events).iter().map(|r| r.token.as_str()).collect();
    assert_eq!(tokens, vec!["", ""]);
    assert!(svc.current().is_root());
}

#[tokio::test]
async fn test_resource_delivered_exactly_once() {
    let (sender, receiver) = handoff::channel();
    let (svc, mut rx) = start(Arc::new(catalog()), HandoffMode::Opener(sender));

    assert_ok!(svc.restore("haiti,3w,haiti_3w_data").await);
    let resource = Resource::new("haiti_3w.csv", "https://example.org/haiti_3w.csv");
    assert_eq!(svc.select_resource(resource), Ok(Selected::Delivered));

    // Session is over
    assert_eq!(
        svc.select_resource(Resource::new("x", "https://example.org/x")),
        Err(ChooserError::SessionClosed)
    );
    assert_err!(svc.select(1).await);
    assert!(svc.is_closed());

    let delivered = receiver.wait().await.expect("resource delivered");
    assert_eq!(delivered.url, "https://example.org/haiti_3w.csv");

    let closed: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, NavigationEvent::Closed(_)))
        .collect();
    assert_eq!(closed, vec![NavigationEvent::Closed(CloseReason::Delivered)]);
}

#[tokio::test]
async fn test_dataset_screen() {
    let (svc, mut rx) = start(Arc::new(catalog()), HandoffMode::Standalone);
    assert_ok!(svc.restore("q=haiti").await);
    assert_ok!(svc.select(0).await);

    let events = drain(&mut rx);
    let render = *renders(&events).last().unwrap();
    assert_eq!(render.token, "q=haiti,haiti_3w_data");
    assert_eq!(render.overview_title, "Files in dataset \"Haiti 3W\"");
    assert_eq!(render.catalog_url, "https://data.example.org/dataset/haiti_3w_data");
    assert_eq!(
        render.listing.labels(),
        vec!["haiti_3w.csv [CSV]", "haiti_3w.xlsx"]
    );

    let crumbs: Vec<&str> = render.breadcrumbs.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(crumbs, vec!["All locations", "Search \"haiti\"", "Haiti 3W"]);
}
