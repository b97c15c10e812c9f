//! Variation stock rewrites for self-managed listings.

use lanch_sync_core::{ListingId, plan};
use serde::Serialize;
use tracing::instrument;

use super::{MeliClient, MeliError};

/// What happened to one listing during a stock propagation pass.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub listing: ListingId,
    pub action: UpdateAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateAction {
    /// Quantities already matched and no reactivation was due; no write
    /// was issued.
    Skipped,
    /// A variation rewrite was sent and accepted.
    Updated,
    /// The fetch or write failed; detail in the message.
    Failed(String),
}

impl MeliClient {
    /// Push a new stock level to every listing in the batch.
    ///
    /// Each listing is re-fetched so the write carries the complete,
    /// current variation list - the items API replaces the variation set
    /// wholesale, so a partial list would delete variations. Listings
    /// whose quantities already match (and that need no reactivation) are
    /// skipped without a write. A paused listing receiving positive stock
    /// is reactivated in the same request.
    ///
    /// Per-listing failures are recorded and logged; the batch continues.
    #[instrument(skip(self, token), fields(count = listings.len(), new_stock))]
    pub async fn propagate_stock(
        &self,
        token: &str,
        listings: &[ListingId],
        sku: &str,
        new_stock: i64,
    ) -> Vec<UpdateOutcome> {
        let mut outcomes = Vec::with_capacity(listings.len());

        for listing in listings {
            let action = self
                .propagate_one(token, listing, sku, new_stock)
                .await
                .unwrap_or_else(|error| {
                    tracing::error!(listing = %listing, %error, "stock update failed");
                    UpdateAction::Failed(error.to_string())
                });
            outcomes.push(UpdateOutcome {
                listing: listing.clone(),
                action,
            });
        }

        outcomes
    }

    async fn propagate_one(
        &self,
        token: &str,
        listing: &ListingId,
        sku: &str,
        new_stock: i64,
    ) -> Result<UpdateAction, MeliError> {
        let item = self.fetch_item(token, listing).await?;
        let variations: Vec<plan::Variation> =
            item.variations.iter().map(|v| v.to_plan()).collect();

        let Some(update) = plan::plan_update(&item.listing_status(), &variations, sku, new_stock)
        else {
            tracing::debug!(listing = %listing, "stock already current, skipping write");
            return Ok(UpdateAction::Skipped);
        };

        let mut body = serde_json::json!({ "variations": update.variations });
        if update.activate {
            body["status"] = serde_json::json!("active");
            tracing::info!(listing = %listing, "reactivating paused listing");
        }

        let response = self
            .inner
            .client
            .put(self.url(&format!("/items/{listing}")))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MeliError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        tracing::info!(listing = %listing, new_stock, "stock updated");
        Ok(UpdateAction::Updated)
    }
}
