use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::config::BootstrapConfig;
use crate::dto::{
    ApiResponse, AssetListResponse, AssetResponse, CreateAssetRequest, PlanRequest, PlanResponse, UpdateAssetRequest,
};
use crate::models::{Asset, AssetKind, MeasurementBasis};
use crate::repositories::AssetRepository;
use crate::services::AssetUsageService;
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, not_found_error, AppError};

pub struct AssetController {
    repository: Arc<dyn AssetRepository>,
    usage_service: Arc<AssetUsageService>,
}

impl AssetController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: state.repository.clone(),
            usage_service: state.usage_service.clone(),
        }
    }

    pub async fn create(&self, request: CreateAssetRequest) -> Result<ApiResponse<AssetResponse>, AppError> {
        request.validate()?;

        let kind = request
            .kind
            .as_deref()
            .and_then(|kind| kind.parse::<AssetKind>().ok())
            .unwrap_or(AssetKind::Boat);
        let basis = request
            .measurement_basis
            .as_deref()
            .and_then(|basis| basis.parse::<MeasurementBasis>().ok())
            .unwrap_or_else(|| kind.default_basis());

        let asset = Asset::new(
            request.name.trim().to_string(),
            kind,
            request.device_id.trim().to_string(),
            basis,
        );
        let asset = self.repository.insert(&asset).await?;

        // El primer activo registrado pasa a ser el actual
        let mut current = self.repository.current_asset_id().await?;
        if current.is_none() {
            self.repository.set_current_asset(Some(asset.id)).await?;
            current = Some(asset.id);
        }

        log::info!("✅ Activo creado: {} ({}, {})", asset.name, asset.kind, asset.device_id);

        Ok(ApiResponse::success_with_message(
            AssetResponse::new(asset, current),
            "Activo creado exitosamente".to_string(),
        ))
    }

    pub async fn list(&self) -> Result<AssetListResponse, AppError> {
        let assets = self.repository.list().await?;
        let current = self.repository.current_asset_id().await?;

        let assets: Vec<AssetResponse> = assets.into_iter().map(|asset| AssetResponse::new(asset, current)).collect();

        Ok(AssetListResponse {
            total: assets.len(),
            assets,
            current_asset_id: current,
        })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<AssetResponse, AppError> {
        let asset = self.find(id).await?;
        let current = self.repository.current_asset_id().await?;
        Ok(AssetResponse::new(asset, current))
    }

    pub async fn update(&self, id: Uuid, request: UpdateAssetRequest) -> Result<ApiResponse<AssetResponse>, AppError> {
        request.validate()?;

        // Se parsea antes de tomar el lock del activo
        let kind = request
            .kind
            .as_deref()
            .map(|kind| kind.parse::<AssetKind>().map_err(AppError::BadRequest))
            .transpose()?;
        let basis = request
            .measurement_basis
            .as_deref()
            .map(|basis| basis.parse::<MeasurementBasis>().map_err(AppError::BadRequest))
            .transpose()?;

        let asset = self
            .usage_service
            .modify_asset(id, move |asset| {
                if let Some(name) = request.name {
                    asset.name = name.trim().to_string();
                }
                if let Some(device_id) = request.device_id {
                    asset.device_id = device_id.trim().to_string();
                }
                if let Some(kind) = kind {
                    asset.kind = kind;
                }
                if let Some(basis) = basis {
                    asset.change_basis(basis);
                }
                Ok(())
            })
            .await?;

        let current = self.repository.current_asset_id().await?;

        Ok(ApiResponse::success_with_message(
            AssetResponse::new(asset, current),
            "Activo actualizado exitosamente".to_string(),
        ))
    }

    pub async fn delete(&self, id: Uuid) -> Result<ApiResponse<Uuid>, AppError> {
        let current = self.repository.current_asset_id().await?;

        if !self.repository.delete(id).await? {
            return Err(not_found_error("Asset", &id.to_string()));
        }
        self.usage_service.forget(id).await;

        // La marca de activo actual pasa al primero que quede
        if current == Some(id) || current.is_none() {
            let next = self.repository.list().await?.first().map(|asset| asset.id);
            self.repository.set_current_asset(next).await?;
        }

        log::info!("🗑️ Activo eliminado: {}", id);

        Ok(ApiResponse::success_with_message(id, "Activo eliminado exitosamente".to_string()))
    }

    pub async fn select(&self, id: Uuid) -> Result<ApiResponse<AssetResponse>, AppError> {
        let asset = self.find(id).await?;
        self.repository.set_current_asset(Some(id)).await?;

        Ok(ApiResponse::success_with_message(
            AssetResponse::new(asset, Some(id)),
            "Activo seleccionado".to_string(),
        ))
    }

    pub async fn get_plan(&self, id: Uuid) -> Result<PlanResponse, AppError> {
        let asset = self.find(id).await?;
        Ok(PlanResponse {
            asset_id: asset.id,
            measurement_basis: asset.measurement_basis,
            items: asset.maintenance_plan,
        })
    }

    pub async fn replace_plan(&self, id: Uuid, request: PlanRequest) -> Result<ApiResponse<PlanResponse>, AppError> {
        for item in &request.items {
            item.validate()?;
            if !item.is_well_formed() {
                return Err(bad_request_error(&format!(
                    "plan item '{}' needs a positive first threshold and interval",
                    item.name
                )));
            }
        }

        let items = request.items;
        let asset = self
            .usage_service
            .modify_asset(id, move |asset| {
                if let Some(item) = items.iter().find(|item| item.unit != asset.measurement_basis) {
                    return Err(bad_request_error(&format!(
                        "plan item '{}' is measured in {} but the asset uses {}",
                        item.name, item.unit, asset.measurement_basis
                    )));
                }
                asset.maintenance_plan = items;
                Ok(())
            })
            .await?;

        Ok(ApiResponse::success_with_message(
            PlanResponse {
                asset_id: asset.id,
                measurement_basis: asset.measurement_basis,
                items: asset.maintenance_plan,
            },
            "Plan de mantenimiento actualizado".to_string(),
        ))
    }

    /// Registrar el activo inicial si el almacén está vacío
    pub async fn bootstrap_if_empty(&self, bootstrap: Option<&BootstrapConfig>) -> Result<Option<Asset>, AppError> {
        let Some(bootstrap) = bootstrap else {
            return Ok(None);
        };
        if !self.repository.list().await?.is_empty() {
            return Ok(None);
        }

        let asset = Asset::new(
            bootstrap.name.clone(),
            bootstrap.kind,
            bootstrap.device_id.clone(),
            bootstrap.measurement_basis,
        );
        let asset = self.repository.insert(&asset).await?;
        self.repository.set_current_asset(Some(asset.id)).await?;

        log::info!("🌱 Activo inicial registrado: {} ({})", asset.name, asset.device_id);
        Ok(Some(asset))
    }

    async fn find(&self, id: Uuid) -> Result<Asset, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Asset", &id.to_string()))
    }
}
