use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::MeasurementBasis;

// Request con un valor numérico del operador (número o string numérico)
#[derive(Debug, Deserialize)]
pub struct ValueRequest {
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct OffsetResponse {
    pub asset_id: Uuid,
    pub measurement_basis: MeasurementBasis,
    pub calibration_offset: f64,
    pub unit: &'static str,
}
