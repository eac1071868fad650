use axum::{extract::State, routing::get, Json, Router};

use crate::controllers::UsageController;
use crate::models::{MaintenanceReport, UsageSnapshot};
use crate::state::AppState;
use crate::utils::errors::AppError;

// Mismas consultas que /api/assets/:id pero sobre el activo actual
pub fn create_current_router() -> Router<AppState> {
    Router::new()
        .route("/usage", get(get_current_usage))
        .route("/maintenance", get(get_current_maintenance))
}

async fn get_current_usage(State(state): State<AppState>) -> Result<Json<UsageSnapshot>, AppError> {
    let controller = UsageController::new(&state);
    let id = controller.current_asset_id().await?;
    let response = controller.usage(id).await?;
    Ok(Json(response))
}

async fn get_current_maintenance(State(state): State<AppState>) -> Result<Json<MaintenanceReport>, AppError> {
    let controller = UsageController::new(&state);
    let id = controller.current_asset_id().await?;
    let response = controller.maintenance(id).await?;
    Ok(Json(response))
}
