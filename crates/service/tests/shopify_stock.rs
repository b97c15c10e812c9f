//! Shopify client integration tests against a mock Admin API.

use secrecy::SecretString;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lanch_sync_core::Sku;
use lanch_sync_service::config::ShopifyConfig;
use lanch_sync_service::shopify::ShopifyClient;

const GRAPHQL_PATH: &str = "/admin/api/2024-01/graphql.json";

fn client_for(server: &MockServer) -> ShopifyClient {
    ShopifyClient::new(ShopifyConfig {
        store: "test-store.myshopify.com".to_string(),
        api_version: "2024-01".to_string(),
        access_token: SecretString::from("shpat-test-token"),
        base_url: server.uri(),
    })
}

fn variant_response(inventory_item_gid: &str) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "productVariants": {
                "edges": [{
                    "node": {
                        "id": "gid://shopify/ProductVariant/1",
                        "sku": "FX797E73",
                        "inventoryItem": { "id": inventory_item_gid }
                    }
                }]
            }
        }
    })
}

#[tokio::test]
async fn sku_resolves_to_numeric_inventory_item_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(header("X-Shopify-Access-Token", "shpat-test-token"))
        .and(body_string_contains("productVariants"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(variant_response("gid://shopify/InventoryItem/4242")),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let item = client
        .resolve_inventory_item(&Sku::new("FX797E73"))
        .await
        .unwrap();
    assert_eq!(item.unwrap().as_str(), "4242");
}

#[tokio::test]
async fn unknown_sku_is_none_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "productVariants": { "edges": [] } }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let item = client
        .resolve_inventory_item(&Sku::new("NO-SUCH-SKU"))
        .await
        .unwrap();
    assert!(item.is_none());
}

#[tokio::test]
async fn first_location_wins() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "locations": {
                    "edges": [
                        { "node": { "id": "gid://shopify/Location/7", "name": "Bodega" } },
                        { "node": { "id": "gid://shopify/Location/8", "name": "Tienda" } }
                    ]
                }
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let location = client.resolve_location().await.unwrap();
    assert_eq!(location.as_str(), "7");
}

#[tokio::test]
async fn absolute_stock_write_carries_numeric_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/inventory_levels/set.json"))
        .and(header("X-Shopify-Access-Token", "shpat-test-token"))
        .and(body_partial_json(serde_json::json!({
            "location_id": "7",
            "inventory_item_id": "4242",
            "available": 12
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "inventory_level": { "available": 12 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .set_absolute_stock(
            &lanch_sync_core::InventoryItemId::new("4242"),
            &lanch_sync_core::LocationId::new("7"),
            12,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn graphql_errors_surface_as_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errors": [{ "message": "Throttled" }]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client
        .resolve_inventory_item(&Sku::new("FX797E73"))
        .await
        .unwrap_err();
    assert!(error.to_string().contains("Throttled"));
}

#[tokio::test]
async fn image_urls_follow_store_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "productVariants": {
                    "edges": [{
                        "node": {
                            "id": "gid://shopify/ProductVariant/1",
                            "sku": "FX797E73",
                            "product": {
                                "id": "gid://shopify/Product/9",
                                "title": "Bombillo LED 9W",
                                "images": {
                                    "edges": [
                                        { "node": { "originalSrc": "https://cdn/a.jpg" } },
                                        { "node": { "originalSrc": "https://cdn/b.jpg" } }
                                    ]
                                }
                            }
                        }
                    }]
                }
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let urls = client
        .product_image_urls(&Sku::new("FX797E73"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(urls, ["https://cdn/a.jpg", "https://cdn/b.jpg"]);
}
