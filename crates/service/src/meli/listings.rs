//! Listing resolution and classification for one SKU.

use lanch_sync_core::{ListingId, ListingPartition, ListingStatus, SellerId, Sku, plan};
use serde::Deserialize;
use tracing::instrument;

use super::{MeliClient, MeliError};

/// Logistics mode marking a listing as platform-fulfilled.
const FULFILLMENT_SENTINEL: &str = "fulfillment";

/// Item search response: listing IDs only.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ListingId>,
}

/// Listing detail, reduced to the fields classification and stock
/// planning read.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemDetail {
    pub id: ListingId,
    #[serde(default)]
    pub catalog_listing: Option<bool>,
    #[serde(default)]
    pub status: Option<ListingStatus>,
    #[serde(default)]
    pub shipping: Option<Shipping>,
    #[serde(default)]
    pub variations: Vec<RawVariation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Shipping {
    #[serde(default)]
    pub logistic_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawVariation {
    pub id: i64,
    #[serde(default)]
    pub available_quantity: i64,
    #[serde(default)]
    pub attributes: Vec<VariationAttribute>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariationAttribute {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub value_name: Option<String>,
}

impl RawVariation {
    /// Distill to the planner's view: the `SELLER_SKU` attribute value.
    #[must_use]
    pub fn to_plan(&self) -> plan::Variation {
        plan::Variation {
            id: self.id,
            available_quantity: self.available_quantity,
            seller_sku: self
                .attributes
                .iter()
                .find(|a| a.id == "SELLER_SKU")
                .and_then(|a| a.value_name.clone()),
        }
    }
}

impl ItemDetail {
    /// Listing status, defaulting unknown/absent to a non-actionable one.
    #[must_use]
    pub fn listing_status(&self) -> ListingStatus {
        self.status.clone().unwrap_or(ListingStatus::Other)
    }
}

/// Who runs logistics for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fulfillment {
    /// Platform manages logistics.
    Fulfilled,
    /// Seller manages logistics.
    SelfManaged,
}

/// Classify a listing by its shipping metadata.
///
/// # Errors
///
/// Returns [`MeliError::Schema`] when the shipping block or its
/// `logistic_type` is absent - an unexpected account/listing
/// configuration, stricter than an ordinary fetch failure.
pub fn classify_fulfillment(item: &ItemDetail) -> Result<Fulfillment, MeliError> {
    let logistic_type = item
        .shipping
        .as_ref()
        .and_then(|s| s.logistic_type.as_deref())
        .ok_or_else(|| MeliError::Schema(item.id.clone()))?;

    if logistic_type == FULFILLMENT_SENTINEL {
        Ok(Fulfillment::Fulfilled)
    } else {
        Ok(Fulfillment::SelfManaged)
    }
}

impl MeliClient {
    /// Fetch a listing detail with all attributes included.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub(super) async fn fetch_item(
        &self,
        token: &str,
        listing: &ListingId,
    ) -> Result<ItemDetail, MeliError> {
        self.get_json(
            &format!("/items/{listing}?include_attributes=all"),
            token,
        )
        .await
    }

    /// Find the listing IDs carrying a seller SKU.
    ///
    /// An empty result is a valid outcome: the SKU simply has no listings
    /// on this account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(seller_id = %seller_id, sku = %sku))]
    pub async fn find_listings(
        &self,
        token: &str,
        seller_id: &SellerId,
        sku: &Sku,
    ) -> Result<Vec<ListingId>, MeliError> {
        let path = format!(
            "/users/{seller_id}/items/search?seller_sku={}",
            urlencoding::encode(sku.as_str())
        );
        let response: SearchResponse = self.get_json(&path, token).await?;
        Ok(response.results)
    }

    /// Retain only "traditional" listings - those not governed by a shared
    /// catalog listing, which are the only ones whose stock can be edited
    /// independently.
    ///
    /// A listing whose detail fetch fails is dropped with a logged error,
    /// not retried.
    #[instrument(skip(self, token), fields(count = listings.len()))]
    pub async fn filter_traditional(
        &self,
        token: &str,
        listings: &[ListingId],
    ) -> Vec<ListingId> {
        let mut traditional = Vec::new();

        for listing in listings {
            match self.fetch_item(token, listing).await {
                Ok(item) if item.catalog_listing == Some(false) => {
                    traditional.push(listing.clone());
                }
                Ok(item) => {
                    tracing::debug!(
                        listing = %listing,
                        catalog_listing = ?item.catalog_listing,
                        "skipping catalog-governed listing"
                    );
                }
                Err(error) => {
                    tracing::error!(listing = %listing, %error, "listing detail fetch failed");
                }
            }
        }

        traditional
    }

    /// Partition listings by fulfillment mode.
    ///
    /// Per-listing failures (fetch errors, missing shipping metadata) are
    /// logged and that listing is omitted; the rest of the batch
    /// continues.
    #[instrument(skip(self, token), fields(count = listings.len()))]
    pub async fn partition_by_fulfillment(
        &self,
        token: &str,
        listings: &[ListingId],
    ) -> ListingPartition {
        let mut partition = ListingPartition::default();

        for listing in listings {
            let item = match self.fetch_item(token, listing).await {
                Ok(item) => item,
                Err(error) => {
                    tracing::error!(listing = %listing, %error, "listing detail fetch failed");
                    continue;
                }
            };

            match classify_fulfillment(&item) {
                Ok(Fulfillment::Fulfilled) => partition.fulfilled.push(listing.clone()),
                Ok(Fulfillment::SelfManaged) => partition.self_managed.push(listing.clone()),
                Err(error) => {
                    tracing::error!(listing = %listing, %error, "unclassifiable listing");
                }
            }
        }

        partition
    }
}
