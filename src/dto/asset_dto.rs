use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Asset, MaintenancePlanItem, MeasurementBasis};
use crate::utils::validation::{validate_device_id, validate_not_empty};

// Request para registrar un activo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssetRequest {
    #[validate(length(min = 1, max = 120), custom = "validate_not_empty")]
    pub name: String,
    #[validate(custom = "validate_device_id")]
    pub device_id: String,
    /// `boat` o `truck`; desconocido cae en `boat`.
    pub kind: Option<String>,
    /// `hours` o `distance`; desconocido cae en la base por defecto del tipo.
    pub measurement_basis: Option<String>,
}

// Request para actualizar un activo (parcial)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateAssetRequest {
    #[validate(length(min = 1, max = 120), custom = "validate_not_empty")]
    pub name: Option<String>,
    #[validate(custom = "validate_device_id")]
    pub device_id: Option<String>,
    pub kind: Option<String>,
    pub measurement_basis: Option<String>,
}

// Response de activo
#[derive(Debug, Serialize)]
pub struct AssetResponse {
    #[serde(flatten)]
    pub asset: Asset,
    pub unit: &'static str,
    pub is_current: bool,
}

impl AssetResponse {
    pub fn new(asset: Asset, current: Option<uuid::Uuid>) -> Self {
        Self {
            unit: asset.unit_symbol(),
            is_current: current == Some(asset.id),
            asset,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssetListResponse {
    pub assets: Vec<AssetResponse>,
    pub current_asset_id: Option<uuid::Uuid>,
    pub total: usize,
}

// Request para reemplazar el plan preventivo
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub items: Vec<MaintenancePlanItem>,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub asset_id: uuid::Uuid,
    pub measurement_basis: MeasurementBasis,
    pub items: Vec<MaintenancePlanItem>,
}
