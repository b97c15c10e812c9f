//! Lanch Sync service - library surface.
//!
//! Exposed as a library so the integration tests can drive the HTTP
//! clients against mock servers; the `lanch-sync` binary wires the same
//! modules behind an axum router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod logi;
pub mod meli;
pub mod routes;
pub mod shopify;
pub mod state;
pub mod sync;
