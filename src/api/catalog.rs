use axum::extract::State;
use axum::Json;

use crate::api::ApiError;
use crate::config::ClassifierConfig;
use crate::models::{CatalogInfo, ReloadRequest};
use crate::state::AppState;

/// GET /api/catalog - Describe the active catalog
pub async fn catalog_info(State(state): State<AppState>) -> Json<CatalogInfo> {
    Json(describe(&state))
}

/// POST /api/catalog/reload - Load a snapshot version and swap it in.
/// `{}` reloads the configured version. The previous catalog keeps serving
/// if the load fails.
pub async fn reload_catalog(
    State(state): State<AppState>,
    Json(req): Json<ReloadRequest>,
) -> Result<Json<CatalogInfo>, ApiError> {
    match state.reload(req.version).await {
        Ok(_) => Ok(Json(describe(&state))),
        Err(e) => {
            tracing::warn!("Catalog reload failed: {e:#}");
            Err(ApiError::CatalogLoad(format!("{e:#}")))
        }
    }
}

/// GET /api/config - Effective classifier settings
pub async fn get_config(State(state): State<AppState>) -> Json<ClassifierConfig> {
    Json(*state.classifier.config())
}

fn describe(state: &AppState) -> CatalogInfo {
    let catalog = state.catalog();
    CatalogInfo {
        version: catalog.version().to_string(),
        model: state.config.catalog.model.clone(),
        size: catalog.size(),
        dimension: catalog.dimension(),
        building_count: catalog.building_count(),
        loaded_at: catalog.loaded_at(),
    }
}
