//! Publication cloning: republish a listing from the first account onto
//! the second, swapping its images for the Shopify set.

use lanch_sync_core::ListingId;
use serde_json::{Value, json};
use tracing::instrument;

use super::{MeliClient, MeliError};

/// Sale terms carried over to the clone; everything else is re-derived by
/// the marketplace on publish.
const CLONED_SALE_TERMS: &[&str] = &["WARRANTY_TYPE", "WARRANTY_TIME"];

/// Build the publish payload for a clone of `original`.
///
/// The original's own pictures and seller identity are dropped: images
/// come from the Shopify product (`picture_urls`), and the publish call's
/// token decides the owner. Attributes without a value and the
/// "Compatibilidad" combination rows the marketplace fills in are
/// filtered out - the items API rejects them on create.
#[must_use]
pub fn build_clone_payload(original: &Value, picture_urls: &[String]) -> Value {
    let field = |name: &str| original.get(name).cloned().unwrap_or(Value::Null);

    let sale_terms: Vec<Value> = original
        .get("sale_terms")
        .and_then(Value::as_array)
        .map(|terms| {
            terms
                .iter()
                .filter(|term| {
                    term.get("id")
                        .and_then(Value::as_str)
                        .is_some_and(|id| CLONED_SALE_TERMS.contains(&id))
                })
                .map(|term| json!({ "id": term["id"], "value_name": term["value_name"] }))
                .collect()
        })
        .unwrap_or_default();

    let pictures: Vec<Value> = picture_urls
        .iter()
        .map(|url| json!({ "source": url }))
        .collect();

    let shipping = original.get("shipping");
    let shipping_mode = shipping
        .and_then(|s| s.get("mode"))
        .cloned()
        .unwrap_or_else(|| json!("me2"));
    let shipping_tags = shipping
        .and_then(|s| s.get("tags"))
        .cloned()
        .unwrap_or_else(|| json!([]));

    let attributes: Vec<Value> = original
        .get("attributes")
        .and_then(Value::as_array)
        .map(|attrs| {
            attrs
                .iter()
                .filter(|attr| {
                    attr.get("value_name").is_some_and(|v| !v.is_null())
                })
                .map(|attr| json!({ "id": attr["id"], "value_name": attr["value_name"] }))
                .collect()
        })
        .unwrap_or_default();

    let variations: Vec<Value> = original
        .get("variations")
        .and_then(Value::as_array)
        .map(|vars| {
            vars.iter()
                .map(|var| {
                    let combinations: Vec<Value> = var
                        .get("attribute_combinations")
                        .and_then(Value::as_array)
                        .map(|combos| {
                            combos
                                .iter()
                                .filter(|attr| {
                                    attr.get("name").and_then(Value::as_str)
                                        != Some("Compatibilidad")
                                        || attr
                                            .get("value_name")
                                            .is_some_and(|v| !v.is_null())
                                })
                                .cloned()
                                .collect()
                        })
                        .unwrap_or_default();

                    json!({
                        "price": var["price"],
                        "attribute_combinations": combinations,
                        "available_quantity": var["available_quantity"],
                        "picture_ids": picture_urls,
                        "attributes": var.get("attributes").cloned().unwrap_or_else(|| json!([])),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    json!({
        "title": field("title"),
        "category_id": field("category_id"),
        "price": field("price"),
        "currency_id": field("currency_id"),
        "available_quantity": field("available_quantity"),
        "buying_mode": field("buying_mode"),
        "condition": field("condition"),
        "listing_type_id": field("listing_type_id"),
        "sale_terms": sale_terms,
        "pictures": pictures,
        "shipping": { "mode": shipping_mode, "tags": shipping_tags },
        "attributes": attributes,
        "variations": variations,
    })
}

impl MeliClient {
    /// Fetch a listing detail as raw JSON, keeping every field the clone
    /// payload might carry over.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn fetch_item_raw(
        &self,
        token: &str,
        listing: &ListingId,
    ) -> Result<Value, MeliError> {
        self.get_json(&format!("/items/{listing}?include_attributes=all"), token)
            .await
    }

    /// Publish a new listing under the token's account.
    ///
    /// # Errors
    ///
    /// Returns [`MeliError::Api`] unless the marketplace answers 201.
    #[instrument(skip(self, token, payload))]
    pub async fn publish_item(&self, token: &str, payload: &Value) -> Result<Value, MeliError> {
        let response = self
            .inner
            .client
            .post(self.url("/items"))
            .bearer_auth(token)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            return Err(MeliError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }
}
