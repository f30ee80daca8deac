use axum::extract::State;
use axum::Json;

use crate::api::ApiError;
use crate::models::{IdentifyRequest, IdentifyResponse};
use crate::state::AppState;

/// POST /api/identify - Classify a query embedding against the active catalog:
///   1. Validate the embedding (dimension, finite, non-zero)
///   2. Exhaustive cosine scan, stable top-K
///   3. Building vote among entries above the backup threshold
///   4. confident / uncertain / no_match tier
pub async fn identify(
    State(state): State<AppState>,
    Json(req): Json<IdentifyRequest>,
) -> Result<Json<IdentifyResponse>, ApiError> {
    // Hold one snapshot for the whole request; a concurrent reload won't affect it.
    let catalog = state.catalog();

    let result = state
        .classifier
        .classify(&catalog, &req.embedding)
        .map_err(|e| {
            tracing::warn!("Rejected identify request: {e}");
            e
        })?;

    Ok(Json(IdentifyResponse::from(result)))
}
