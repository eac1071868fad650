use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::{AssetController, UsageController};
use crate::dto::{
    ApiResponse, AssetListResponse, AssetResponse, CreateAssetRequest, OffsetResponse, PlanRequest, PlanResponse,
    UpdateAssetRequest, ValueRequest,
};
use crate::models::{MaintenanceReport, UsageSnapshot, UsageTotals};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_asset_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_assets).post(create_asset))
        .route("/:id", get(get_asset).put(update_asset).delete(delete_asset))
        .route("/:id/select", post(select_asset))
        .route("/:id/usage", get(get_usage))
        .route("/:id/maintenance", get(get_maintenance))
        .route("/:id/plan", get(get_plan).put(replace_plan))
        .route("/:id/offset", get(get_offset).put(set_offset))
        .route("/:id/calibration", get(get_totals).post(calibrate))
}

async fn create_asset(
    State(state): State<AppState>,
    Json(request): Json<CreateAssetRequest>,
) -> Result<Json<ApiResponse<AssetResponse>>, AppError> {
    let controller = AssetController::new(&state);
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn list_assets(State(state): State<AppState>) -> Result<Json<AssetListResponse>, AppError> {
    let controller = AssetController::new(&state);
    let response = controller.list().await?;
    Ok(Json(response))
}

async fn get_asset(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<AssetResponse>, AppError> {
    let controller = AssetController::new(&state);
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn update_asset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAssetRequest>,
) -> Result<Json<ApiResponse<AssetResponse>>, AppError> {
    let controller = AssetController::new(&state);
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn delete_asset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Uuid>>, AppError> {
    let controller = AssetController::new(&state);
    let response = controller.delete(id).await?;
    Ok(Json(response))
}

async fn select_asset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AssetResponse>>, AppError> {
    let controller = AssetController::new(&state);
    let response = controller.select(id).await?;
    Ok(Json(response))
}

async fn get_usage(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<UsageSnapshot>, AppError> {
    let controller = UsageController::new(&state);
    let response = controller.usage(id).await?;
    Ok(Json(response))
}

async fn get_maintenance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MaintenanceReport>, AppError> {
    let controller = UsageController::new(&state);
    let response = controller.maintenance(id).await?;
    Ok(Json(response))
}

async fn get_plan(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<PlanResponse>, AppError> {
    let controller = AssetController::new(&state);
    let response = controller.get_plan(id).await?;
    Ok(Json(response))
}

async fn replace_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<ApiResponse<PlanResponse>>, AppError> {
    let controller = AssetController::new(&state);
    let response = controller.replace_plan(id, request).await?;
    Ok(Json(response))
}

async fn get_offset(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<OffsetResponse>, AppError> {
    let controller = UsageController::new(&state);
    let response = controller.get_offset(id).await?;
    Ok(Json(response))
}

async fn set_offset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ValueRequest>,
) -> Result<Json<ApiResponse<OffsetResponse>>, AppError> {
    let controller = UsageController::new(&state);
    let response = controller.set_offset(id, request).await?;
    Ok(Json(response))
}

async fn get_totals(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<UsageTotals>, AppError> {
    let controller = UsageController::new(&state);
    let response = controller.totals(id).await?;
    Ok(Json(response))
}

async fn calibrate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ValueRequest>,
) -> Result<Json<ApiResponse<UsageTotals>>, AppError> {
    let controller = UsageController::new(&state);
    let response = controller.calibrate(id, request).await?;
    Ok(Json(response))
}
