//! Rutas HTTP
//!
//! Arma el router completo de la API con sus capas de CORS y trazas.

pub mod asset_routes;
pub mod current_routes;
pub mod fleet_routes;

use axum::{extract::State, routing::get, Json, Router};
use tower_http::trace::TraceLayer;

use crate::dto::HealthResponse;
use crate::middleware::cors_layer;
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/api/assets", asset_routes::create_asset_router())
        .nest("/api/current", current_routes::create_current_router())
        .nest("/api/fleet", fleet_routes::create_fleet_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage,
        environment: state.config.environment.clone(),
        telemetry_cache: state.telemetry.stats(),
        timestamp: chrono::Utc::now(),
    })
}
