//! Integration tests for the catalog, search and debounced search.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use qkart_integration_tests::{TestContext, WAIT, catalog_json, error_json, product_json};
use qkart_storefront::error::CATALOG_UNAVAILABLE;
use qkart_storefront::{ApiError, SearchDispatcher, StorefrontError};

async fn mount_catalog(ctx: &TestContext, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(TestContext::path("products")))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_json()))
        .expect(expected_calls)
        .mount(&ctx.server)
        .await;
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_products_decode_wire_names() {
    let ctx = TestContext::start().await;
    mount_catalog(&ctx, 1).await;

    let products = ctx.client.products().await.unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(products[1].id.as_str(), "KCRwjF7lN97HnEaY");
    assert_eq!(products[1].name, "iPhone XR");
    assert_eq!(products[1].cost, 800);
    assert!(products[1].image_url.ends_with("KCRwjF7lN97HnEaY.png"));
}

#[tokio::test]
async fn test_products_are_cached() {
    let ctx = TestContext::start().await;
    mount_catalog(&ctx, 1).await;

    let first = ctx.client.products().await.unwrap();
    let second = ctx.client.products().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_zero_ttl_disables_cache() {
    let ctx = TestContext::start_with(|config| config.catalog_cache_ttl = Duration::ZERO).await;
    mount_catalog(&ctx, 2).await;

    ctx.client.products().await.unwrap();
    ctx.client.products().await.unwrap();
}

#[tokio::test]
async fn test_refresh_failure_is_generic() {
    let ctx = TestContext::start().await;
    Mock::given(method("GET"))
        .and(path(TestContext::path("products")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&ctx.server)
        .await;

    let dispatcher = SearchDispatcher::new(ctx.client.clone(), ctx.config.search_debounce);
    let err = dispatcher.refresh().await.unwrap_err();

    assert!(matches!(&err, StorefrontError::RemoteUnknown(m) if m == CATALOG_UNAVAILABLE));
    assert!(!dispatcher.view().available);
}

#[tokio::test]
async fn test_refresh_client_error_ignores_backend_message() {
    let ctx = TestContext::start().await;
    Mock::given(method("GET"))
        .and(path(TestContext::path("products")))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_json("Bad request")))
        .mount(&ctx.server)
        .await;

    let dispatcher = SearchDispatcher::new(ctx.client.clone(), ctx.config.search_debounce);
    let err = dispatcher.refresh().await.unwrap_err();

    assert!(matches!(&err, StorefrontError::RemoteUnknown(m) if m == CATALOG_UNAVAILABLE));
    assert_eq!(err.to_string(), CATALOG_UNAVAILABLE);
    assert!(!dispatcher.view().available);
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_sends_value_query() {
    let ctx = TestContext::start().await;
    Mock::given(method("GET"))
        .and(path(TestContext::path("products/search")))
        .and(query_param("value", "smash badminton"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json(
            "upLK9JbQ4rMhTwt4",
            "YONEX Smash Badminton Racquet",
            "Sports",
            100
        )])))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let products = ctx.client.search("smash badminton").await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].category, "Sports");
}

#[tokio::test]
async fn test_search_results_are_not_cached() {
    let ctx = TestContext::start().await;
    Mock::given(method("GET"))
        .and(path(TestContext::path("products/search")))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_json()))
        .expect(2)
        .mount(&ctx.server)
        .await;

    ctx.client.search("a").await.unwrap();
    ctx.client.search("a").await.unwrap();
}

#[tokio::test]
async fn test_search_not_found_is_client_error() {
    let ctx = TestContext::start().await;
    Mock::given(method("GET"))
        .and(path(TestContext::path("products/search")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!([])))
        .mount(&ctx.server)
        .await;

    let err = ctx.client.search("zzzz").await.unwrap_err();
    assert!(matches!(err, ApiError::Client { status: 404, .. }));
}

// =============================================================================
// Debounced Search
// =============================================================================

#[tokio::test]
async fn test_debounced_burst_sends_last_text_only() {
    let ctx = TestContext::start().await;
    mount_catalog(&ctx, 1).await;
    Mock::given(method("GET"))
        .and(path(TestContext::path("products/search")))
        .and(query_param("value", "iph"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json(
            "KCRwjF7lN97HnEaY",
            "iPhone XR",
            "Phones",
            800
        )])))
        .expect(1)
        .mount(&ctx.server)
        .await;
    // Anything other than the final text must never be sent
    Mock::given(method("GET"))
        .and(path(TestContext::path("products/search")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let dispatcher = SearchDispatcher::new(ctx.client.clone(), Duration::from_millis(200));
    dispatcher.refresh().await.unwrap();
    let mut view = dispatcher.subscribe();
    view.mark_unchanged();

    dispatcher.on_keystroke("i");
    dispatcher.on_keystroke("ip");
    dispatcher.on_keystroke("iph");
    assert!(dispatcher.is_pending());

    tokio::time::timeout(WAIT, view.changed())
        .await
        .unwrap()
        .unwrap();

    let current = view.borrow_and_update().clone();
    assert!(current.available);
    assert_eq!(current.products.len(), 1);
    assert_eq!(current.products[0].name, "iPhone XR");
    assert!(!dispatcher.is_pending());
}

#[tokio::test]
async fn test_debounced_not_found_marks_unavailable() {
    let ctx = TestContext::start().await;
    mount_catalog(&ctx, 1).await;
    Mock::given(method("GET"))
        .and(path(TestContext::path("products/search")))
        .respond_with(ResponseTemplate::new(404).set_body_json(error_json("No products found")))
        .mount(&ctx.server)
        .await;

    let dispatcher = SearchDispatcher::new(ctx.client.clone(), Duration::from_millis(50));
    let before = dispatcher.refresh().await.unwrap();
    let mut view = dispatcher.subscribe();
    view.mark_unchanged();

    dispatcher.on_keystroke("nothing matches this");
    tokio::time::timeout(WAIT, view.changed())
        .await
        .unwrap()
        .unwrap();

    let current = view.borrow_and_update().clone();
    assert!(!current.available);
    assert_eq!(current.products, before.products);
}
