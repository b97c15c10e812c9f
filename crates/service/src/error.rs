//! Unified error handling for the HTTP surface.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::logi::LogiError;
use crate::meli::MeliError;
use crate::shopify::ShopifyError;

/// Application-level error type for the sync service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Logi feed operation failed.
    #[error("Logi error: {0}")]
    Logi(#[from] LogiError),

    /// MercadoLibre API operation failed.
    #[error("MercadoLibre error: {0}")]
    Meli(#[from] MeliError),

    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Logi(_) | Self::Meli(_) | Self::Shopify(_) | Self::Internal(_)) {
            tracing::error!(error = %self, "Request error");
        }

        let status = match &self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // A structurally broken feed is the caller's data problem,
            // not an upstream outage
            Self::Logi(LogiError::Feed(_)) => StatusCode::BAD_REQUEST,
            Self::Logi(_) | Self::Meli(_) | Self::Shopify(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose upstream details to clients; validation failures
        // name their violated constraint on purpose
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Logi(LogiError::Feed(_)) => self.to_string(),
            Self::Logi(_) | Self::Meli(_) | Self::Shopify(_) => {
                "External service error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("sku FX797E73".to_string());
        assert_eq!(err.to_string(), "Not found: sku FX797E73");

        let err = AppError::BadRequest("missing sku".to_string());
        assert_eq!(err.to_string(), "Bad request: missing sku");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Meli(MeliError::NoAccessToken("cuenta1".to_string()))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_feed_validation_is_a_bad_request_not_a_gateway_error() {
        use lanch_sync_core::feed::FeedError;

        let response =
            AppError::Logi(LogiError::Feed(FeedError::EmptyStock)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Transport-level Logi failures stay upstream errors
        let response = AppError::Logi(LogiError::EmptySecret).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
