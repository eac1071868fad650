use std::sync::Arc;
use uuid::Uuid;

use crate::dto::{ApiResponse, OffsetResponse, ValueRequest};
use crate::models::{MaintenanceReport, UsageSnapshot, UsageTotals};
use crate::repositories::AssetRepository;
use crate::services::{AssetUsageService, FleetEntry};
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, not_found_error, AppError};
use crate::utils::validation::parse_numeric_value;

pub struct UsageController {
    repository: Arc<dyn AssetRepository>,
    usage_service: Arc<AssetUsageService>,
}

impl UsageController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: state.repository.clone(),
            usage_service: state.usage_service.clone(),
        }
    }

    pub async fn usage(&self, id: Uuid) -> Result<UsageSnapshot, AppError> {
        self.usage_service.poll(id).await
    }

    pub async fn maintenance(&self, id: Uuid) -> Result<MaintenanceReport, AppError> {
        self.usage_service.maintenance(id).await
    }

    pub async fn totals(&self, id: Uuid) -> Result<UsageTotals, AppError> {
        self.usage_service.totals(id).await
    }

    pub async fn calibrate(&self, id: Uuid, request: ValueRequest) -> Result<ApiResponse<UsageTotals>, AppError> {
        let value = parse_numeric_value(&request.value, "value")?;
        let totals = self.usage_service.calibrate(id, value).await?;

        Ok(ApiResponse::success_with_message(
            totals,
            "Calibración aplicada".to_string(),
        ))
    }

    pub async fn get_offset(&self, id: Uuid) -> Result<OffsetResponse, AppError> {
        let asset = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Asset", &id.to_string()))?;

        Ok(OffsetResponse {
            asset_id: asset.id,
            measurement_basis: asset.measurement_basis,
            calibration_offset: asset.calibration_offset,
            unit: asset.unit_symbol(),
        })
    }

    pub async fn set_offset(&self, id: Uuid, request: ValueRequest) -> Result<ApiResponse<OffsetResponse>, AppError> {
        let offset = parse_numeric_value(&request.value, "value")?;
        let asset = self.usage_service.set_offset(id, offset).await?;

        Ok(ApiResponse::success_with_message(
            OffsetResponse {
                asset_id: asset.id,
                measurement_basis: asset.measurement_basis,
                calibration_offset: asset.calibration_offset,
                unit: asset.unit_symbol(),
            },
            "Offset actualizado".to_string(),
        ))
    }

    pub async fn fleet(&self) -> Result<Vec<FleetEntry>, AppError> {
        self.usage_service.fleet_usage().await
    }

    /// Activo actual; sin marca se toma (y se marca) el primero registrado
    pub async fn current_asset_id(&self) -> Result<Uuid, AppError> {
        if let Some(id) = self.repository.current_asset_id().await? {
            return Ok(id);
        }

        let first = self
            .repository
            .list()
            .await?
            .first()
            .map(|asset| asset.id)
            .ok_or_else(|| bad_request_error("No asset registered"))?;

        self.repository.set_current_asset(Some(first)).await?;
        Ok(first)
    }
}
