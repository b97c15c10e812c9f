//! MercadoLibre API client.
//!
//! Covers the listing side of the sync pipeline: SKU search, catalog
//! filtering, fulfillment partitioning, variation stock rewrites, and the
//! express-shipping ("Flex") toggle, plus the OAuth dance and publication
//! cloning across the two managed accounts.
//!
//! Every operation takes the account's access token explicitly - the
//! client holds no credentials of its own, and tokens are fetched fresh
//! from the store on each call (renewal may be happening concurrently).

mod clone;
mod flex;
mod listings;
mod oauth;
mod stock;

pub use clone::build_clone_payload;
pub use flex::{ToggleAction, ToggleOutcome};
pub use listings::{Fulfillment, ItemDetail};
pub use oauth::{StoredTokens, TokenStore};
pub use stock::{UpdateAction, UpdateOutcome};

use std::sync::Arc;

use lanch_sync_core::{ListingId, SellerId, SiteId};
use serde::Deserialize;
use thiserror::Error;

use crate::config::MeliConfig;

/// Errors that can occur when interacting with the MercadoLibre API.
#[derive(Debug, Error)]
pub enum MeliError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Listing lacks required shipping/logistics metadata.
    #[error("Missing shipping metadata for listing {0}")]
    Schema(ListingId),

    /// OAuth exchange or refresh failed.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Token store file could not be read or written.
    #[error("Token store error: {0}")]
    TokenStore(String),

    /// No access token held for an account.
    #[error("No access token for account `{0}`")]
    NoAccessToken(String),
}

/// MercadoLibre REST client.
#[derive(Clone)]
pub struct MeliClient {
    inner: Arc<MeliClientInner>,
}

struct MeliClientInner {
    client: reqwest::Client,
    base_url: String,
    auth_base_url: String,
    site_id: SiteId,
}

/// Authenticated user identity, as returned by `/users/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserIdentity {
    pub id: i64,
    pub site_id: SiteId,
}

impl UserIdentity {
    /// Seller ID in the string form the search endpoint expects.
    #[must_use]
    pub fn seller_id(&self) -> SellerId {
        SellerId::new(self.id.to_string())
    }
}

impl MeliClient {
    /// Create a new MercadoLibre API client.
    #[must_use]
    pub fn new(config: &MeliConfig) -> Self {
        Self {
            inner: Arc::new(MeliClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                auth_base_url: config.auth_base_url.clone(),
                site_id: config.site_id.clone(),
            }),
        }
    }

    /// Configured marketplace site.
    #[must_use]
    pub fn site_id(&self) -> &SiteId {
        &self.inner.site_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Execute an authenticated GET and decode the JSON body.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, MeliError> {
        let response = self
            .inner
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MeliError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }

    /// Identity of the token's owner; source of the seller and site IDs.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn user_identity(&self, token: &str) -> Result<UserIdentity, MeliError> {
        self.get_json("/users/me", token).await
    }
}
