//! Express-shipping ("Flex") enrollment toggle.
//!
//! Enrollment follows stock: a listing with stock on hand should offer
//! express shipping, one without should not. The probe endpoint answers
//! with 204 when a listing is enrolled and 404 when it is not, so a 404
//! here is state, not an error.

use lanch_sync_core::{ListingId, plan};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::instrument;

use super::{MeliClient, MeliError};

/// What happened to one listing during a Flex sync pass.
#[derive(Debug, Clone, Serialize)]
pub struct ToggleOutcome {
    pub listing: ListingId,
    pub action: ToggleAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleAction {
    /// Enrollment was turned on.
    Enabled,
    /// Enrollment was turned off.
    Disabled,
    /// Enrollment already matched the stock state, or stock was unknown.
    Skipped,
    /// The probe or toggle failed; detail in the message.
    Failed(String),
}

impl MeliClient {
    /// Align Flex enrollment with the stock state for a batch of listings.
    ///
    /// A negative `stock` means the feed carried no usable quantity; in
    /// that case nothing is probed or toggled and every listing reports
    /// [`ToggleAction::Skipped`]. Per-listing failures are recorded and
    /// logged; the batch continues.
    #[instrument(skip(self, token), fields(count = listings.len(), stock))]
    pub async fn sync_flex(
        &self,
        token: &str,
        listings: &[ListingId],
        stock: i64,
    ) -> Vec<ToggleOutcome> {
        if stock < 0 {
            tracing::warn!("stock unknown, leaving Flex enrollment untouched");
            return listings
                .iter()
                .map(|listing| ToggleOutcome {
                    listing: listing.clone(),
                    action: ToggleAction::Skipped,
                })
                .collect();
        }

        let mut outcomes = Vec::with_capacity(listings.len());

        for listing in listings {
            let action = self
                .sync_flex_one(token, listing, stock)
                .await
                .unwrap_or_else(|error| {
                    tracing::error!(listing = %listing, %error, "Flex sync failed");
                    ToggleAction::Failed(error.to_string())
                });
            outcomes.push(ToggleOutcome {
                listing: listing.clone(),
                action,
            });
        }

        outcomes
    }

    async fn sync_flex_one(
        &self,
        token: &str,
        listing: &ListingId,
        stock: i64,
    ) -> Result<ToggleAction, MeliError> {
        let enrolled = self.flex_enrolled(token, listing).await?;

        match plan::flex_transition(enrolled, stock) {
            plan::FlexAction::Enable => {
                self.toggle_flex(token, listing, true).await?;
                tracing::info!(listing = %listing, "Flex enabled");
                Ok(ToggleAction::Enabled)
            }
            plan::FlexAction::Disable => {
                self.toggle_flex(token, listing, false).await?;
                tracing::info!(listing = %listing, "Flex disabled");
                Ok(ToggleAction::Disabled)
            }
            plan::FlexAction::Skip => Ok(ToggleAction::Skipped),
        }
    }

    fn flex_url(&self, listing: &ListingId) -> String {
        self.url(&format!(
            "/sites/{}/shipping/selfservice/items/{listing}",
            self.site_id()
        ))
    }

    /// Probe current enrollment: 204 means enrolled, 404 means not.
    async fn flex_enrolled(
        &self,
        token: &str,
        listing: &ListingId,
    ) -> Result<bool, MeliError> {
        let response = self
            .inner
            .client
            .get(self.flex_url(listing))
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(MeliError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn toggle_flex(
        &self,
        token: &str,
        listing: &ListingId,
        enable: bool,
    ) -> Result<(), MeliError> {
        let url = self.flex_url(listing);
        let request = if enable {
            self.inner.client.post(url)
        } else {
            self.inner.client.delete(url)
        };

        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MeliError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}
