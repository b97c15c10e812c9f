//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LOGI_API_SECRET` - Logi warehouse API secret (exchanged for a feed
//!   token)
//! - `ML_CLIENT_ID_CUENTA1` / `ML_CLIENT_SECRET_CUENTA1` /
//!   `ML_REDIRECT_URI_CUENTA1` - MercadoLibre OAuth app for account 1
//! - `ML_CLIENT_ID_CUENTA2` / `ML_CLIENT_SECRET_CUENTA2` /
//!   `ML_REDIRECT_URI_CUENTA2` - MercadoLibre OAuth app for account 2
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_ACCESS_TOKEN` - Shopify Admin API access token
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 5000)
//! - `LOGI_ENDPOINT` - Logi GraphQL endpoint (default: production URL)
//! - `ML_BASE_URL` / `ML_AUTH_BASE_URL` - MercadoLibre API/auth hosts
//! - `ML_SITE_ID` - Marketplace site (default: MCO)
//! - `ML_TOKEN_FILE` - OAuth token store path (default: config/tokens.json)
//! - `SHOPIFY_API_VERSION` - API version (default: 2024-01)
//! - `SHOPIFY_BASE_URL` - Full base URL override (testing; default derives
//!   from `SHOPIFY_STORE`)

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;

use lanch_sync_core::SiteId;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const DEFAULT_LOGI_ENDPOINT: &str = "https://grupologi.com.co/ApiLogi/principal_graph.php";
const DEFAULT_ML_BASE_URL: &str = "https://api.mercadolibre.com";
const DEFAULT_ML_AUTH_BASE_URL: &str = "https://auth.mercadolibre.com";
const DEFAULT_SHOPIFY_API_VERSION: &str = "2024-01";

/// The two marketplace accounts this deployment manages.
pub const ACCOUNTS: [&str; 2] = ["cuenta1", "cuenta2"];

/// Blocklist of common placeholder patterns (case-insensitive).
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-", "changeme", "replace", "placeholder", "example", "xxx", "todo", "fixme",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Logi warehouse feed configuration
    pub logi: LogiConfig,
    /// MercadoLibre configuration
    pub meli: MeliConfig,
    /// Shopify configuration
    pub shopify: ShopifyConfig,
}

/// Logi warehouse API configuration.
///
/// Implements `Debug` manually to redact the API secret.
#[derive(Clone)]
pub struct LogiConfig {
    /// GraphQL endpoint (token exchange and feed queries share it)
    pub endpoint: String,
    /// API secret exchanged for a feed token
    pub api_secret: SecretString,
}

impl std::fmt::Debug for LogiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// MercadoLibre API configuration, covering both accounts.
#[derive(Debug, Clone)]
pub struct MeliConfig {
    /// REST API base URL
    pub base_url: String,
    /// OAuth authorization base URL
    pub auth_base_url: String,
    /// Marketplace site (e.g., MCO)
    pub site_id: SiteId,
    /// Path of the JSON token store
    pub token_file: PathBuf,
    /// OAuth app credentials keyed by account name
    pub accounts: HashMap<String, MeliAccountConfig>,
}

/// OAuth app credentials for one MercadoLibre account.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct MeliAccountConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
}

impl std::fmt::Debug for MeliAccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeliAccountConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Shopify Admin API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// API version (e.g., 2024-01)
    pub api_version: String,
    /// Admin API access token
    pub access_token: SecretString,
    /// Base URL, normally derived from the store domain
    pub base_url: String,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing, fails to
    /// parse, or carries an obviously insecure placeholder value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = optional_env("HOST")
            .unwrap_or_else(|| "127.0.0.1".to_string())
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = optional_env("PORT")
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;

        let logi = LogiConfig {
            endpoint: optional_env("LOGI_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_LOGI_ENDPOINT.to_string()),
            api_secret: required_secret("LOGI_API_SECRET")?,
        };

        let mut accounts = HashMap::new();
        for account in ACCOUNTS {
            let suffix = account.to_uppercase();
            accounts.insert(
                account.to_string(),
                MeliAccountConfig {
                    client_id: required_env(&format!("ML_CLIENT_ID_{suffix}"))?,
                    client_secret: required_secret(&format!("ML_CLIENT_SECRET_{suffix}"))?,
                    redirect_uri: required_env(&format!("ML_REDIRECT_URI_{suffix}"))?,
                },
            );
        }

        let meli = MeliConfig {
            base_url: optional_env("ML_BASE_URL").unwrap_or_else(|| DEFAULT_ML_BASE_URL.to_string()),
            auth_base_url: optional_env("ML_AUTH_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ML_AUTH_BASE_URL.to_string()),
            site_id: SiteId::new(optional_env("ML_SITE_ID").unwrap_or_else(|| "MCO".to_string())),
            token_file: PathBuf::from(
                optional_env("ML_TOKEN_FILE").unwrap_or_else(|| "config/tokens.json".to_string()),
            ),
            accounts,
        };

        let store = required_env("SHOPIFY_STORE")?;
        let shopify = ShopifyConfig {
            base_url: optional_env("SHOPIFY_BASE_URL")
                .unwrap_or_else(|| format!("https://{store}")),
            api_version: optional_env("SHOPIFY_API_VERSION")
                .unwrap_or_else(|| DEFAULT_SHOPIFY_API_VERSION.to_string()),
            access_token: required_secret("SHOPIFY_ACCESS_TOKEN")?,
            store,
        };

        Ok(Self {
            host,
            port,
            logi,
            meli,
            shopify,
        })
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    optional_env(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn required_secret(name: &str) -> Result<SecretString, ConfigError> {
    let value = required_env(name)?;
    validate_secret(name, &value)?;
    Ok(SecretString::from(value))
}

/// Reject empty and obviously-placeholder secrets at startup rather than
/// letting them reach an upstream API.
fn validate_secret(name: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InsecureSecret(
            name.to_string(),
            "value is empty".to_string(),
        ));
    }

    let lowered = trimmed.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lowered.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                name.to_string(),
                format!("value looks like a placeholder (contains `{pattern}`)"),
            ));
        }
    }

    Ok(())
}

impl LogiConfig {
    /// Expose the API secret for the token exchange request.
    #[must_use]
    pub fn secret(&self) -> &str {
        self.api_secret.expose_secret()
    }
}
