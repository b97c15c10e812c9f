//! Shopify Admin API client.
//!
//! Lookups (variant by SKU, locations, product images) go through the
//! GraphQL endpoint; the absolute stock write uses the REST
//! `inventory_levels/set.json` endpoint, which takes numeric IDs - so
//! GraphQL GIDs are reduced to their numeric tail before the write.

use std::sync::Arc;

use lanch_sync_core::{InventoryItemId, LocationId, Sku};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::ShopifyConfig;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Errors that can occur when interacting with the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// GraphQL query returned errors.
    #[error("GraphQL error: {0}")]
    GraphQL(String),

    /// A GID did not have the expected shape.
    #[error("Unexpected ID format: {0}")]
    BadId(String),

    /// The store has no inventory locations.
    #[error("No inventory locations configured")]
    NoLocations,
}

/// Shopify Admin API client.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    client: reqwest::Client,
    config: ShopifyConfig,
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQLErrorResponse>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Edges<T> {
    edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
struct VariantsData {
    #[serde(rename = "productVariants")]
    product_variants: Edges<VariantNode>,
}

#[derive(Debug, Deserialize)]
struct VariantNode {
    #[serde(rename = "inventoryItem", default)]
    inventory_item: Option<GidNode>,
    #[serde(default)]
    product: Option<ProductNode>,
}

#[derive(Debug, Deserialize)]
struct GidNode {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ProductNode {
    #[serde(default)]
    images: Option<Edges<ImageNode>>,
}

#[derive(Debug, Deserialize)]
struct ImageNode {
    #[serde(rename = "originalSrc")]
    original_src: String,
}

#[derive(Debug, Deserialize)]
struct LocationsData {
    locations: Edges<GidNode>,
}

/// Reduce a GraphQL GID like `gid://shopify/InventoryItem/42` to its
/// numeric tail, checking the resource prefix.
fn gid_tail(gid: &str, resource: &str) -> Result<String, ShopifyError> {
    let prefix = format!("gid://shopify/{resource}/");
    gid.strip_prefix(&prefix)
        .filter(|tail| !tail.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| ShopifyError::BadId(gid.to_string()))
}

impl ShopifyClient {
    /// Create a new Shopify Admin API client.
    #[must_use]
    pub fn new(config: ShopifyConfig) -> Self {
        Self {
            inner: Arc::new(ShopifyClientInner {
                client: reqwest::Client::new(),
                config,
            }),
        }
    }

    fn admin_url(&self, path: &str) -> String {
        let config = &self.inner.config;
        format!(
            "{}/admin/api/{}/{path}",
            config.base_url, config.api_version
        )
    }

    /// Execute a GraphQL query against the Admin API.
    async fn graphql<T: serde::de::DeserializeOwned>(
        &self,
        query: &str,
    ) -> Result<T, ShopifyError> {
        let response = self
            .inner
            .client
            .post(self.admin_url("graphql.json"))
            .header(
                ACCESS_TOKEN_HEADER,
                self.inner.config.access_token.expose_secret(),
            )
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ShopifyError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let envelope: GraphQLResponse<T> = response.json().await?;
        if let Some(error) = envelope.errors.first() {
            return Err(ShopifyError::GraphQL(error.message.clone()));
        }
        envelope
            .data
            .ok_or_else(|| ShopifyError::GraphQL("response carried no data".to_string()))
    }

    /// Resolve a SKU to its numeric inventory item ID.
    ///
    /// Returns `Ok(None)` when the store has no variant with that SKU -
    /// an expected outcome for warehouse items not sold online.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, GraphQL errors, or an
    /// unexpected GID shape.
    #[instrument(skip(self), fields(sku = %sku))]
    pub async fn resolve_inventory_item(
        &self,
        sku: &Sku,
    ) -> Result<Option<InventoryItemId>, ShopifyError> {
        let query = format!(
            "{{\n\
               productVariants(first: 1, query: \"sku:{}\") {{\n\
                 edges {{ node {{ id sku inventoryItem {{ id }} }} }}\n\
               }}\n\
             }}",
            sku.as_str()
        );
        let data: VariantsData = self.graphql(&query).await?;

        let Some(edge) = data.product_variants.edges.into_iter().next() else {
            return Ok(None);
        };
        let gid = edge
            .node
            .inventory_item
            .map(|item| item.id)
            .ok_or_else(|| ShopifyError::BadId("variant without inventoryItem".to_string()))?;

        Ok(Some(InventoryItemId::new(gid_tail(
            &gid,
            "InventoryItem",
        )?)))
    }

    /// Numeric ID of the store's first inventory location.
    ///
    /// Stock is tracked at a single warehouse, so the first location is
    /// the only one.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::NoLocations`] if the store has none.
    #[instrument(skip(self))]
    pub async fn resolve_location(&self) -> Result<LocationId, ShopifyError> {
        let query = "query {\n\
               locations(first: 10) {\n\
                 edges { node { id name } }\n\
               }\n\
             }";
        let data: LocationsData = self.graphql(query).await?;

        let gid = data
            .locations
            .edges
            .into_iter()
            .next()
            .map(|edge| edge.node.id)
            .ok_or(ShopifyError::NoLocations)?;

        Ok(LocationId::new(gid_tail(&gid, "Location")?))
    }

    /// Image URLs of the product owning a SKU's variant, in store order.
    ///
    /// Returns `Ok(None)` when the SKU has no variant.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or GraphQL errors.
    #[instrument(skip(self), fields(sku = %sku))]
    pub async fn product_image_urls(
        &self,
        sku: &Sku,
    ) -> Result<Option<Vec<String>>, ShopifyError> {
        let query = format!(
            "{{\n\
               productVariants(first: 10, query: \"sku:{}\") {{\n\
                 edges {{ node {{ id sku product {{ id title images(first: 10) {{\n\
                   edges {{ node {{ originalSrc }} }}\n\
                 }} }} }} }}\n\
               }}\n\
             }}",
            sku.as_str()
        );
        let data: VariantsData = self.graphql(&query).await?;

        let Some(edge) = data.product_variants.edges.into_iter().next() else {
            return Ok(None);
        };

        let urls = edge
            .node
            .product
            .and_then(|p| p.images)
            .map(|images| {
                images
                    .edges
                    .into_iter()
                    .map(|e| e.node.original_src)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Some(urls))
    }

    /// Set the absolute available quantity at a location.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::Api`] if the write is rejected.
    #[instrument(skip(self), fields(inventory_item = %inventory_item, location = %location, available))]
    pub async fn set_absolute_stock(
        &self,
        inventory_item: &InventoryItemId,
        location: &LocationId,
        available: i64,
    ) -> Result<(), ShopifyError> {
        let payload = serde_json::json!({
            "location_id": location.as_str(),
            "inventory_item_id": inventory_item.as_str(),
            "available": available,
        });

        let response = self
            .inner
            .client
            .post(self.admin_url("inventory_levels/set.json"))
            .header(
                ACCESS_TOKEN_HEADER,
                self.inner.config.access_token.expose_secret(),
            )
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ShopifyError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        tracing::info!(available, "Shopify stock level set");
        Ok(())
    }
}
