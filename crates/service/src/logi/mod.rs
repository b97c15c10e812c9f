//! Logi warehouse API client.
//!
//! One GraphQL endpoint serves both operations this service needs: the
//! secret-for-token exchange and the inventory feed query. The feed token
//! is held in an in-memory slot and renewed by a background task every 12
//! hours; sync calls read whatever the slot currently holds (the token is
//! an opaque capability, never inspected).
//!
//! Authorization is the raw token string - the upstream does not use a
//! `Bearer` prefix.

use std::sync::Arc;
use std::time::Duration;

use lanch_sync_core::feed::{FeedError, StockFeed};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::config::LogiConfig;

/// How often the background task renews the feed token.
pub const TOKEN_RENEWAL_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

/// Errors that can occur when talking to the Logi API.
#[derive(Debug, Error)]
pub enum LogiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The configured API secret is empty.
    #[error("API secret is empty")]
    EmptySecret,

    /// The response did not carry the expected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Structural feed violation (fail-fast, aborts the whole pull).
    #[error("Feed validation failed: {0}")]
    Feed(#[from] FeedError),
}

/// Logi GraphQL client with a renewable feed token.
#[derive(Clone)]
pub struct LogiClient {
    inner: Arc<LogiClientInner>,
}

struct LogiClientInner {
    client: reqwest::Client,
    config: LogiConfig,
    /// Current feed token; renewed in the background, read per call.
    token: RwLock<Option<String>>,
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
struct TokenData {
    app_secret_key: Vec<AppSecretKeyEntry>,
}

#[derive(Debug, Deserialize)]
struct AppSecretKeyEntry {
    suc_data: Vec<SucDataEntry>,
}

#[derive(Debug, Deserialize)]
struct SucDataEntry {
    token: String,
}

impl LogiClient {
    /// Create a new Logi API client.
    #[must_use]
    pub fn new(config: LogiConfig) -> Self {
        Self {
            inner: Arc::new(LogiClientInner {
                client: reqwest::Client::new(),
                config,
                token: RwLock::new(None),
            }),
        }
    }

    /// Exchange the configured API secret for a fresh feed token and store
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`LogiError`] if the secret is empty, the request fails, or
    /// the response lacks the token path.
    #[instrument(skip(self))]
    pub async fn renew_token(&self) -> Result<String, LogiError> {
        let secret = self.inner.config.secret().trim().to_string();
        if secret.is_empty() {
            return Err(LogiError::EmptySecret);
        }

        let query = format!("{{app_secret_key(secret_client:\"{secret}\"){{suc_data{{token}}}}}}");
        let response = self
            .inner
            .client
            .post(&self.inner.config.endpoint)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LogiError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let envelope: GraphQLResponse<TokenData> = response.json().await?;
        if let Some(error) = envelope.errors.first() {
            return Err(LogiError::UnexpectedResponse(error.message.clone()));
        }

        let token = envelope
            .data
            .and_then(|d| d.app_secret_key.into_iter().next())
            .and_then(|e| e.suc_data.into_iter().next())
            .map(|s| s.token)
            .ok_or_else(|| {
                LogiError::UnexpectedResponse("token missing from app_secret_key response".into())
            })?;

        *self.inner.token.write().await = Some(token.clone());
        tracing::info!("Logi feed token renewed");
        Ok(token)
    }

    /// Current feed token, fetching one if none is held yet.
    async fn current_token(&self) -> Result<String, LogiError> {
        if let Some(token) = self.inner.token.read().await.clone() {
            return Ok(token);
        }
        self.renew_token().await
    }

    /// Pull and structurally validate the inventory feed.
    ///
    /// The returned feed has passed the fail-closed validation pass;
    /// normalization is the caller's next step.
    ///
    /// # Errors
    ///
    /// Returns [`LogiError`] on transport failure, a non-JSON response, or
    /// any structural feed violation.
    #[instrument(skip(self))]
    pub async fn fetch_inventory(&self) -> Result<StockFeed, LogiError> {
        let token = self.current_token().await?;

        let query = "\
        {\n\
          stock {\n\
            producto {\n\
              pro_cod\n\
              pro_sku\n\
              pro_desc\n\
              pro_ubicacion\n\
              pro_fech_registro\n\
            }\n\
            total_stock {\n\
              total_stock\n\
            }\n\
          }\n\
        }";

        let response = self
            .inner
            .client
            .post(&self.inner.config.endpoint)
            // Raw token, no Bearer prefix
            .header("Authorization", token)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LogiError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !content_type.contains("application/json") {
            return Err(LogiError::UnexpectedResponse(format!(
                "non-JSON content type `{content_type}`"
            )));
        }

        let body: serde_json::Value = response.json().await?;
        let feed = StockFeed::parse(&body)?;
        feed.validate()?;
        Ok(feed)
    }

    /// Spawn the periodic token renewal task.
    ///
    /// Runs independently of sync calls; a failed renewal is logged and
    /// retried at the next interval.
    pub fn spawn_token_renewal(&self) -> tokio::task::JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(error) = client.renew_token().await {
                    tracing::error!(%error, "Logi token renewal failed");
                }
                tokio::time::sleep(TOKEN_RENEWAL_INTERVAL).await;
            }
        })
    }
}
