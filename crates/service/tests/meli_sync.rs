//! MercadoLibre client integration tests against a mock API.

use std::collections::HashMap;

use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lanch_sync_core::{ListingId, SellerId, SiteId, Sku};
use lanch_sync_service::config::MeliConfig;
use lanch_sync_service::meli::{MeliClient, ToggleAction, UpdateAction};

fn client_for(server: &MockServer) -> MeliClient {
    MeliClient::new(&MeliConfig {
        base_url: server.uri(),
        auth_base_url: server.uri(),
        site_id: SiteId::new("MCO"),
        token_file: std::path::PathBuf::from("unused.json"),
        accounts: HashMap::new(),
    })
}

fn item_body(listing: &str, status: &str, quantity: i64) -> serde_json::Value {
    serde_json::json!({
        "id": listing,
        "catalog_listing": false,
        "status": status,
        "shipping": { "logistic_type": "self_service" },
        "variations": [{
            "id": 111,
            "available_quantity": quantity,
            "attributes": [
                { "id": "SELLER_SKU", "value_name": "FX797E73" }
            ]
        }]
    })
}

async fn mount_item(server: &MockServer, listing: &str, status: &str, quantity: i64) {
    Mock::given(method("GET"))
        .and(path(format!("/items/{listing}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(item_body(listing, status, quantity)),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn find_listings_queries_by_seller_sku() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/123/items/search"))
        .and(query_param("seller_sku", "FX797E73"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": ["MCO1", "MCO2"]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let listings = client
        .find_listings("tok", &SellerId::new("123"), &Sku::new("FX797E73"))
        .await
        .unwrap();
    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].as_str(), "MCO1");
}

#[tokio::test]
async fn matching_stock_skips_the_write() {
    let server = MockServer::start().await;
    mount_item(&server, "MCO1", "active", 5).await;

    // No write may be issued when quantities already match
    Mock::given(method("PUT"))
        .and(path("/items/MCO1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcomes = client
        .propagate_stock("tok", &[ListingId::new("MCO1")], "FX797E73", 5)
        .await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].action, UpdateAction::Skipped);
}

#[tokio::test]
async fn changed_stock_rewrites_the_full_variation_list() {
    let server = MockServer::start().await;
    mount_item(&server, "MCO1", "active", 2).await;

    Mock::given(method("PUT"))
        .and(path("/items/MCO1"))
        .and(body_partial_json(serde_json::json!({
            "variations": [{ "id": 111, "available_quantity": 5 }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcomes = client
        .propagate_stock("tok", &[ListingId::new("MCO1")], "FX797E73", 5)
        .await;

    assert_eq!(outcomes[0].action, UpdateAction::Updated);
}

#[tokio::test]
async fn paused_listing_with_stock_is_reactivated() {
    let server = MockServer::start().await;
    mount_item(&server, "MCO1", "paused", 3).await;

    // Same quantity, but the paused listing must come back active
    Mock::given(method("PUT"))
        .and(path("/items/MCO1"))
        .and(body_partial_json(serde_json::json!({ "status": "active" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcomes = client
        .propagate_stock("tok", &[ListingId::new("MCO1")], "FX797E73", 3)
        .await;

    assert_eq!(outcomes[0].action, UpdateAction::Updated);
}

#[tokio::test]
async fn failed_listing_does_not_abort_the_batch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items/MCO1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_item(&server, "MCO2", "active", 0).await;

    Mock::given(method("PUT"))
        .and(path("/items/MCO2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcomes = client
        .propagate_stock(
            "tok",
            &[ListingId::new("MCO1"), ListingId::new("MCO2")],
            "FX797E73",
            4,
        )
        .await;

    assert!(matches!(outcomes[0].action, UpdateAction::Failed(_)));
    assert_eq!(outcomes[1].action, UpdateAction::Updated);
}

#[tokio::test]
async fn flex_is_enabled_when_stock_arrives() {
    let server = MockServer::start().await;

    // 404 probe answer means "not enrolled"
    Mock::given(method("GET"))
        .and(path("/sites/MCO/shipping/selfservice/items/MCO1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sites/MCO/shipping/selfservice/items/MCO1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcomes = client.sync_flex("tok", &[ListingId::new("MCO1")], 4).await;
    assert_eq!(outcomes[0].action, ToggleAction::Enabled);
}

#[tokio::test]
async fn flex_already_matching_is_left_alone() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/MCO/shipping/selfservice/items/MCO1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcomes = client.sync_flex("tok", &[ListingId::new("MCO1")], 4).await;

    assert_eq!(outcomes[0].action, ToggleAction::Skipped);
    // Only the probe hit the wire
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn flex_is_disabled_when_stock_runs_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/MCO/shipping/selfservice/items/MCO1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/sites/MCO/shipping/selfservice/items/MCO1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcomes = client.sync_flex("tok", &[ListingId::new("MCO1")], 0).await;
    assert_eq!(outcomes[0].action, ToggleAction::Disabled);
}

#[tokio::test]
async fn unknown_stock_issues_no_requests_at_all() {
    let server = MockServer::start().await;

    let client = client_for(&server);
    let outcomes = client
        .sync_flex(
            "tok",
            &[ListingId::new("MCO1"), ListingId::new("MCO2")],
            -1,
        )
        .await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.action == ToggleAction::Skipped));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn code_exchange_posts_the_oauth_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(wiremock::matchers::body_string_contains(
            "grant_type=authorization_code",
        ))
        .and(wiremock::matchers::body_string_contains("code=THE-CODE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "APP_USR-1",
            "refresh_token": "TG-1",
            "user_id": 123,
            "expires_in": 21600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let account = lanch_sync_service::config::MeliAccountConfig {
        client_id: "client-1".to_string(),
        client_secret: secrecy::SecretString::from("app-secret-1"),
        redirect_uri: "https://sync.example/callback/cuenta1".to_string(),
    };
    let tokens = client.exchange_code(&account, "THE-CODE").await.unwrap();

    assert_eq!(tokens.access_token, "APP_USR-1");
    assert_eq!(tokens.refresh_token.as_deref(), Some("TG-1"));
}

#[tokio::test]
async fn partition_splits_on_logistic_type() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items/MCO1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "MCO1",
            "catalog_listing": false,
            "shipping": { "logistic_type": "fulfillment" },
            "variations": []
        })))
        .mount(&server)
        .await;
    mount_item(&server, "MCO2", "active", 1).await;

    let client = client_for(&server);
    let partition = client
        .partition_by_fulfillment("tok", &[ListingId::new("MCO1"), ListingId::new("MCO2")])
        .await;

    assert_eq!(partition.fulfilled, vec![ListingId::new("MCO1")]);
    assert_eq!(partition.self_managed, vec![ListingId::new("MCO2")]);
}
