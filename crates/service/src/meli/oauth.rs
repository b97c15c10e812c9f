//! MercadoLibre OAuth: authorization URLs, code exchange, refresh, and
//! the on-disk token store shared by both accounts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::MeliAccountConfig;
use secrecy::ExposeSecret;

use super::{MeliClient, MeliError};

/// Tokens held for one account.
///
/// The token endpoint returns more fields than we act on; the extras are
/// kept so a round-trip through the store preserves them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTokens {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// JSON file mapping account name to its tokens.
///
/// Reads and writes go through the filesystem on every call - the file is
/// small, and this keeps concurrently-running renewals and request
/// handlers from holding a stale in-memory copy.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all stored tokens. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`MeliError::TokenStore`] if the file exists but cannot be
    /// read or parsed.
    pub fn load(&self) -> Result<HashMap<String, StoredTokens>, MeliError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| MeliError::TokenStore(format!("read {}: {e}", self.path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| MeliError::TokenStore(format!("parse {}: {e}", self.path.display())))
    }

    /// Store tokens for one account, preserving the other accounts'
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns [`MeliError::TokenStore`] if the file cannot be read or
    /// written.
    pub fn save(&self, account: &str, tokens: StoredTokens) -> Result<(), MeliError> {
        let mut all = self.load()?;
        all.insert(account.to_string(), tokens);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MeliError::TokenStore(format!("create {}: {e}", parent.display()))
            })?;
        }

        let rendered = serde_json::to_string_pretty(&all)
            .map_err(|e| MeliError::TokenStore(format!("serialize tokens: {e}")))?;
        std::fs::write(&self.path, rendered)
            .map_err(|e| MeliError::TokenStore(format!("write {}: {e}", self.path.display())))
    }

    /// Access token for an account.
    ///
    /// # Errors
    ///
    /// Returns [`MeliError::NoAccessToken`] if the account has never
    /// completed the OAuth flow.
    pub fn access_token(&self, account: &str) -> Result<String, MeliError> {
        self.load()?
            .get(account)
            .map(|t| t.access_token.clone())
            .ok_or_else(|| MeliError::NoAccessToken(account.to_string()))
    }

    /// Refresh token for an account, if the grant included one.
    ///
    /// # Errors
    ///
    /// Returns [`MeliError::NoAccessToken`] if the account has never
    /// completed the OAuth flow.
    pub fn refresh_token(&self, account: &str) -> Result<Option<String>, MeliError> {
        self.load()?
            .get(account)
            .map(|t| t.refresh_token.clone())
            .ok_or_else(|| MeliError::NoAccessToken(account.to_string()))
    }
}

impl MeliClient {
    /// URL the operator visits to authorize an account.
    #[must_use]
    pub fn authorization_url(&self, account: &MeliAccountConfig) -> String {
        format!(
            "{}/authorization?response_type=code&client_id={}&redirect_uri={}",
            self.inner.auth_base_url,
            urlencoding::encode(&account.client_id),
            urlencoding::encode(&account.redirect_uri),
        )
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns [`MeliError::OAuth`] if the token endpoint rejects the
    /// exchange.
    #[instrument(skip(self, account, code), fields(client_id = %account.client_id))]
    pub async fn exchange_code(
        &self,
        account: &MeliAccountConfig,
        code: &str,
    ) -> Result<StoredTokens, MeliError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", account.client_id.as_str()),
            ("client_secret", account.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", account.redirect_uri.as_str()),
        ];
        self.token_request(&params).await
    }

    /// Trade a refresh token for a fresh grant.
    ///
    /// # Errors
    ///
    /// Returns [`MeliError::OAuth`] if the token endpoint rejects the
    /// refresh.
    #[instrument(skip(self, account, refresh_token), fields(client_id = %account.client_id))]
    pub async fn refresh_tokens(
        &self,
        account: &MeliAccountConfig,
        refresh_token: &str,
    ) -> Result<StoredTokens, MeliError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", account.client_id.as_str()),
            ("client_secret", account.client_secret.expose_secret()),
            ("refresh_token", refresh_token),
        ];
        self.token_request(&params).await
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<StoredTokens, MeliError> {
        let response = self
            .inner
            .client
            .post(self.url("/oauth/token"))
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MeliError::OAuth(format!(
                "token endpoint returned {status}: {}",
                response.text().await.unwrap_or_default()
            )));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(access: &str) -> StoredTokens {
        StoredTokens {
            access_token: access.to_string(),
            refresh_token: Some("TG-refresh".to_string()),
            user_id: Some(123),
            expires_in: Some(21600),
            token_type: None,
            scope: None,
        }
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("tokens.json"));
        assert!(store.load().unwrap().is_empty());
        assert!(matches!(
            store.access_token("cuenta1"),
            Err(MeliError::NoAccessToken(_))
        ));
    }

    #[test]
    fn test_save_preserves_other_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("tokens.json"));

        store.save("cuenta1", tokens("APP_USR-1")).unwrap();
        store.save("cuenta2", tokens("APP_USR-2")).unwrap();

        assert_eq!(store.access_token("cuenta1").unwrap(), "APP_USR-1");
        assert_eq!(store.access_token("cuenta2").unwrap(), "APP_USR-2");

        store.save("cuenta1", tokens("APP_USR-1b")).unwrap();
        assert_eq!(store.access_token("cuenta1").unwrap(), "APP_USR-1b");
        assert_eq!(store.access_token("cuenta2").unwrap(), "APP_USR-2");
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("config/tokens.json"));
        store.save("cuenta1", tokens("APP_USR-1")).unwrap();
        assert_eq!(store.access_token("cuenta1").unwrap(), "APP_USR-1");
    }

    #[test]
    fn test_tolerant_token_decode() {
        let raw = r#"{"access_token":"APP_USR-9","token_type":"Bearer","unknown_field":true}"#;
        let decoded: StoredTokens = serde_json::from_str(raw).unwrap();
        assert_eq!(decoded.access_token, "APP_USR-9");
        assert!(decoded.refresh_token.is_none());
    }
}
