//! HTTP surface: inventory feed, sync trigger, OAuth dance, cloning.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use lanch_sync_core::Sku;
use lanch_sync_core::feed::CanonicalProduct;

use crate::{config::MeliAccountConfig, error::AppError, state::AppState, sync};

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/inventory", get(get_inventory))
        .route("/sync", post(post_sync))
        .route("/auth/{account}", get(get_auth))
        .route("/callback/{account}", get(get_callback))
        .route("/refresh/{account}", post(post_refresh))
        .route("/clone/{sku}", post(post_clone))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Pull the warehouse feed and return the canonical records.
async fn get_inventory(
    State(state): State<AppState>,
) -> Result<Json<Vec<CanonicalProduct>>, AppError> {
    let feed = state.logi().fetch_inventory().await?;
    Ok(Json(feed.normalize()))
}

#[derive(Debug, Deserialize)]
struct SyncRequest {
    sku: String,
    stock: i64,
}

/// Run both marketplace branches for one SKU.
async fn post_sync(
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<sync::SyncReport>, AppError> {
    let sku = request.sku.trim();
    if sku.is_empty() {
        return Err(AppError::BadRequest("sku must not be empty".to_string()));
    }

    let report = sync::sync_sku(&state, &Sku::from(sku), request.stock).await?;
    Ok(Json(report))
}

fn account_config<'a>(
    state: &'a AppState,
    account: &str,
) -> Result<&'a MeliAccountConfig, AppError> {
    state
        .config()
        .meli
        .accounts
        .get(account)
        .ok_or_else(|| AppError::NotFound(format!("unknown account `{account}`")))
}

/// Send the operator to the marketplace consent screen.
async fn get_auth(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Redirect, AppError> {
    let config = account_config(&state, &account)?;
    Ok(Redirect::temporary(
        &state.meli().authorization_url(config),
    ))
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: String,
}

/// OAuth redirect target: exchange the code and persist the grant.
async fn get_callback(
    State(state): State<AppState>,
    Path(account): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<Value>, AppError> {
    let config = account_config(&state, &account)?;
    let tokens = state.meli().exchange_code(config, &query.code).await?;
    state.tokens().save(&account, tokens)?;
    tracing::info!(account, "OAuth grant stored");
    Ok(Json(json!({ "account": account, "authorized": true })))
}

/// Renew an account's grant from its stored refresh token.
async fn post_refresh(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Json<Value>, AppError> {
    let config = account_config(&state, &account)?;

    let refresh_token = state
        .tokens()
        .refresh_token(&account)?
        .ok_or_else(|| AppError::BadRequest(format!("account `{account}` has no refresh token")))?;

    let tokens = state.meli().refresh_tokens(config, &refresh_token).await?;
    state.tokens().save(&account, tokens)?;
    tracing::info!(account, "OAuth grant refreshed");
    Ok(Json(json!({ "account": account, "refreshed": true })))
}

/// Clone the SKU's listing from the primary account onto the secondary.
async fn post_clone(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<Json<Value>, AppError> {
    let created = sync::clone_listing(&state, &Sku::from(sku.as_str())).await?;
    Ok(Json(created))
}
