//! Sync orchestration: one SKU in, both marketplaces updated.
//!
//! Each flow reads the account's current access token from the store at
//! the start and uses it for the whole pass; renewal happening in
//! parallel is picked up by the next invocation.

use lanch_sync_core::{ListingId, Sku};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use crate::{
    error::AppError,
    meli::{ToggleOutcome, UpdateOutcome},
    state::AppState,
};

/// Primary account: owner of the listings the sync acts on.
const PRIMARY_ACCOUNT: &str = "cuenta1";
/// Secondary account: target of publication cloning.
const SECONDARY_ACCOUNT: &str = "cuenta2";

/// Result of one sync pass for one SKU.
#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub sku: Sku,
    pub stock: i64,
    /// Traditional (non-catalog) listings the pass acted on.
    pub listings: Vec<ListingId>,
    pub updates: Vec<UpdateOutcome>,
    pub flex: Vec<ToggleOutcome>,
    pub shopify: ShopifyOutcome,
}

/// What the Shopify branch of a sync pass did.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ShopifyOutcome {
    /// Absolute stock level was written.
    Updated,
    /// The store has no variant with this SKU; nothing to write.
    SkuNotFound,
}

/// Run both marketplace branches for one SKU.
///
/// The MercadoLibre branch classifies the SKU's listings, rewrites stock
/// on the self-managed ones, and aligns Flex enrollment across all of
/// them. The Shopify branch resolves the SKU to an inventory item and
/// writes the absolute level; a SKU absent from the store is a normal
/// outcome.
///
/// # Errors
///
/// Returns [`AppError`] when a whole branch cannot proceed: no access
/// token, identity lookup failure, or a Shopify resolution/write failure.
/// Per-listing failures are contained in the report.
#[instrument(skip(state), fields(sku = %sku, stock))]
pub async fn sync_sku(state: &AppState, sku: &Sku, stock: i64) -> Result<SyncReport, AppError> {
    let meli = state.meli();
    let token = state.tokens().access_token(PRIMARY_ACCOUNT)?;

    let identity = meli.user_identity(&token).await?;
    let seller_id = identity.seller_id();

    let found = meli.find_listings(&token, &seller_id, sku).await?;
    let listings = meli.filter_traditional(&token, &found).await;
    if listings.is_empty() {
        tracing::info!(sku = %sku, "no traditional listings for SKU");
    }

    let partition = meli.partition_by_fulfillment(&token, &listings).await;

    let updates = meli
        .propagate_stock(&token, &partition.self_managed, sku.as_str(), stock)
        .await;

    // Flex enrollment follows stock on every listing, fulfilled included.
    let all: Vec<ListingId> = partition.iter().cloned().collect();
    let flex = meli.sync_flex(&token, &all, stock).await;

    let shopify = sync_shopify(state, sku, stock).await?;

    Ok(SyncReport {
        sku: sku.clone(),
        stock,
        listings,
        updates,
        flex,
        shopify,
    })
}

/// Shopify branch: resolve the SKU and write the absolute level.
async fn sync_shopify(
    state: &AppState,
    sku: &Sku,
    stock: i64,
) -> Result<ShopifyOutcome, AppError> {
    let shopify = state.shopify();

    let Some(inventory_item) = shopify.resolve_inventory_item(sku).await? else {
        tracing::info!(sku = %sku, "SKU not in Shopify store, skipping");
        return Ok(ShopifyOutcome::SkuNotFound);
    };

    let location = shopify.resolve_location().await?;
    shopify
        .set_absolute_stock(&inventory_item, &location, stock)
        .await?;
    Ok(ShopifyOutcome::Updated)
}

/// Clone the SKU's first traditional listing from the primary account
/// onto the secondary one, with images taken from the Shopify product.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] when the SKU has no traditional listing
/// on the primary account or no Shopify product, and [`AppError`] on any
/// upstream failure.
#[instrument(skip(state), fields(sku = %sku))]
pub async fn clone_listing(state: &AppState, sku: &Sku) -> Result<Value, AppError> {
    let meli = state.meli();
    let source_token = state.tokens().access_token(PRIMARY_ACCOUNT)?;
    let target_token = state.tokens().access_token(SECONDARY_ACCOUNT)?;

    let identity = meli.user_identity(&source_token).await?;
    let found = meli
        .find_listings(&source_token, &identity.seller_id(), sku)
        .await?;
    let traditional = meli.filter_traditional(&source_token, &found).await;
    let Some(listing) = traditional.first() else {
        return Err(AppError::NotFound(format!(
            "no traditional listing for SKU {sku}"
        )));
    };

    let original = meli.fetch_item_raw(&source_token, listing).await?;

    let Some(picture_urls) = state.shopify().product_image_urls(sku).await? else {
        return Err(AppError::NotFound(format!(
            "SKU {sku} has no Shopify product"
        )));
    };

    let payload = crate::meli::build_clone_payload(&original, &picture_urls);
    let created = meli.publish_item(&target_token, &payload).await?;
    tracing::info!(source = %listing, "listing cloned");
    Ok(created)
}
