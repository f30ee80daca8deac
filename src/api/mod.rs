//! Axum handlers for the identification service.

pub mod catalog;
pub mod health;
pub mod identify;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::error::IdentifyError;
use crate::state::AppState;

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/identify", post(identify::identify))
        .route("/api/catalog", get(catalog::catalog_info))
        .route("/api/catalog/reload", post(catalog::reload_catalog))
        .route("/api/config", get(catalog::get_config))
        .with_state(state)
}

/// Error returned by handlers, rendered as `{"error": {"code", "message"}}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Identify(#[from] IdentifyError),

    #[error("{0}")]
    CatalogLoad(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Identify(_) => StatusCode::BAD_REQUEST,
            ApiError::CatalogLoad(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::Identify(IdentifyError::DimensionMismatch { .. }) => "DIMENSION_MISMATCH",
            ApiError::Identify(IdentifyError::InvalidVector(_)) => "INVALID_VECTOR",
            ApiError::Identify(IdentifyError::InvalidQuery(_)) => "INVALID_QUERY",
            ApiError::CatalogLoad(_) => "CATALOG_LOAD_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}
