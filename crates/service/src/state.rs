//! Application state shared across handlers.

use std::sync::Arc;

use crate::{
    config::Config,
    logi::LogiClient,
    meli::{MeliClient, TokenStore},
    shopify::ShopifyClient,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    logi: LogiClient,
    meli: MeliClient,
    shopify: ShopifyClient,
    tokens: TokenStore,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let logi = LogiClient::new(config.logi.clone());
        let meli = MeliClient::new(&config.meli);
        let shopify = ShopifyClient::new(config.shopify.clone());
        let tokens = TokenStore::new(config.meli.token_file.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                logi,
                meli,
                shopify,
                tokens,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    #[must_use]
    pub fn logi(&self) -> &LogiClient {
        &self.inner.logi
    }

    #[must_use]
    pub fn meli(&self) -> &MeliClient {
        &self.inner.meli
    }

    #[must_use]
    pub fn shopify(&self) -> &ShopifyClient {
        &self.inner.shopify
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }
}
