use axum::{extract::State, routing::get, Json, Router};

use crate::controllers::UsageController;
use crate::services::FleetEntry;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_fleet_router() -> Router<AppState> {
    Router::new().route("/usage", get(get_fleet_usage))
}

async fn get_fleet_usage(State(state): State<AppState>) -> Result<Json<Vec<FleetEntry>>, AppError> {
    let controller = UsageController::new(&state);
    let response = controller.fleet().await?;
    Ok(Json(response))
}
