//! Navigation over the real HTTP client against a mock CKAN server

use std::sync::Arc;

use hdx_chooser::{CachedCatalog, HandoffMode, Listing, NavigationEvent, NavigationService};
use hdx_client::{CatalogClient, CatalogConfig};
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ckan(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "success": true, "result": result }))
}

async fn catalog_for(server: &MockServer) -> CachedCatalog {
    let client = CatalogClient::new(CatalogConfig {
        base_url: server.uri(),
        timeout_ms: 2_000,
        page_limit: 500,
    })
    .unwrap();
    CachedCatalog::new(Arc::new(client))
}

#[tokio::test]
async fn test_location_list_fetched_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/action/group_list"))
        .and(query_param("all_fields", "1"))
        .respond_with(ckan(json!([
            {"name": "mmr", "display_name": "Myanmar", "package_count": 40},
            {"name": "afg", "display_name": "Afghanistan", "package_count": 90}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/action/package_search"))
        .and(query_param("q", "cholera"))
        .respond_with(ckan(json!({"count": 0, "results": []})))
        .mount(&server)
        .await;

    let catalog = catalog_for(&server).await;
    let (svc, mut rx) = NavigationService::new(catalog.clone(), HandoffMode::Standalone);

    assert_ok!(svc.restore("").await);
    assert_ok!(svc.search("cholera").await);
    // Back to the root: served from the cache
    assert_ok!(svc.up().await);

    let mut location_renders = 0;
    while let Ok(event) = rx.try_recv() {
        if let NavigationEvent::Render(render) = event {
            if let Listing::Locations(locations) = render.listing {
                assert_eq!(locations[0].name, "afg");
                location_renders += 1;
            }
        }
    }
    assert_eq!(location_renders, 2);
    assert_eq!(catalog.stats().hits, 1);
}

#[tokio::test]
async fn test_dataset_token_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/action/group_package_show"))
        .and(query_param("id", "haiti"))
        .and(query_param("limit", "1"))
        .respond_with(ckan(json!([{
            "name": "haiti_3w",
            "groups": [{"name": "haiti", "display_name": "Haiti", "package_count": 12}]
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/action/tag_show"))
        .and(query_param("id", "3w"))
        .respond_with(ckan(json!({"name": "3w", "display_name": "3W"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/action/package_show"))
        .and(query_param("id", "haiti_3w"))
        .respond_with(ckan(json!({
            "name": "haiti_3w",
            "title": "Haiti 3W",
            "organization": {"name": "ocha", "title": "OCHA"},
            "extras": [{"key": "dataset_source", "value": "Cluster partners"}],
            "groups": [{"name": "haiti", "display_name": "Haiti"}],
            "tags": [{"name": "3w", "display_name": "3W"}],
            "num_resources": 1,
            "resources": [{"id": "r1", "name": "3w.xlsx", "format": "XLSX",
                           "url": "https://example.org/3w.xlsx"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = catalog_for(&server).await;
    let (svc, mut rx) = NavigationService::new(catalog, HandoffMode::Standalone);
    assert_ok!(svc.restore("haiti,3w,haiti_3w").await);

    let Ok(NavigationEvent::Render(render)) = rx.try_recv() else {
        panic!("expected a render");
    };
    assert_eq!(render.page_title, "Haiti 3W (HDX)");
    let facts: Vec<(&str, &str)> = render
        .overview
        .iter()
        .map(|f| (f.label.as_str(), f.value.as_str()))
        .collect();
    assert!(facts.contains(&("Uploader", "OCHA")));
    assert!(facts.contains(&("Source", "Cluster partners")));
    assert_eq!(render.listing.labels(), vec!["3w.xlsx [XLSX]"]);
}
