//! Modelo de Asset
//!
//! Un activo es una embarcación o un camión con un rastreador GPS instalado.
//! El activo es dueño de su plan preventivo y del estado del horímetro.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::maintenance::{default_plan, MaintenancePlanItem};
use super::usage::AccumulatorState;

/// Tipo de activo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Boat,
    Truck,
}

impl AssetKind {
    /// Las embarcaciones se miden por horas de motor, los camiones por km.
    pub fn default_basis(self) -> MeasurementBasis {
        match self {
            AssetKind::Boat => MeasurementBasis::Hours,
            AssetKind::Truck => MeasurementBasis::Distance,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Boat => "boat",
            AssetKind::Truck => "truck",
        }
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "boat" | "lancha" => Ok(AssetKind::Boat),
            "truck" | "caminhao" => Ok(AssetKind::Truck),
            other => Err(format!("unknown asset kind '{}'", other)),
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base de medición del uso acumulado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementBasis {
    Hours,
    Distance,
}

impl MeasurementBasis {
    pub fn unit_symbol(&self) -> &'static str {
        match self {
            MeasurementBasis::Hours => "h",
            MeasurementBasis::Distance => "km",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementBasis::Hours => "hours",
            MeasurementBasis::Distance => "distance",
        }
    }
}

impl FromStr for MeasurementBasis {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "hours" | "hour" | "h" | "hora" => Ok(MeasurementBasis::Hours),
            "distance" | "km" => Ok(MeasurementBasis::Distance),
            other => Err(format!("unknown measurement basis '{}'", other)),
        }
    }
}

impl fmt::Display for MeasurementBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activo monitoreado
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub name: String,
    pub kind: AssetKind,
    pub device_id: String,
    pub measurement_basis: MeasurementBasis,
    /// Offset de calibración en km (solo base `distance`).
    pub calibration_offset: f64,
    pub maintenance_plan: Vec<MaintenancePlanItem>,
    pub accumulator: AccumulatorState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    /// Crear un activo nuevo con el plan preventivo por defecto de su base
    pub fn new(name: String, kind: AssetKind, device_id: String, measurement_basis: MeasurementBasis) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            kind,
            device_id,
            measurement_basis,
            calibration_offset: 0.0,
            maintenance_plan: default_plan(measurement_basis),
            accumulator: AccumulatorState::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn unit_symbol(&self) -> &'static str {
        self.measurement_basis.unit_symbol()
    }

    /// Cambiar la base de medición.
    ///
    /// Si el plan seguía siendo el de fábrica de la base anterior se reemplaza
    /// por el de la nueva base; un plan editado por el operador se conserva.
    pub fn change_basis(&mut self, basis: MeasurementBasis) {
        if basis == self.measurement_basis {
            return;
        }
        if self.maintenance_plan == default_plan(self.measurement_basis) {
            self.maintenance_plan = default_plan(basis);
        }
        self.measurement_basis = basis;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_defaults() {
        assert_eq!(AssetKind::Boat.default_basis(), MeasurementBasis::Hours);
        assert_eq!(AssetKind::Truck.default_basis(), MeasurementBasis::Distance);
        assert_eq!("Lancha".parse::<AssetKind>().unwrap(), AssetKind::Boat);
        assert!("plane".parse::<AssetKind>().is_err());
        assert_eq!("km".parse::<MeasurementBasis>().unwrap(), MeasurementBasis::Distance);
    }

    #[test]
    fn test_new_asset_uses_default_plan() {
        let asset = Asset::new(
            "Embarcação 01".to_string(),
            AssetKind::Boat,
            "355468593059041".to_string(),
            MeasurementBasis::Hours,
        );
        assert_eq!(asset.maintenance_plan, default_plan(MeasurementBasis::Hours));
        assert!(!asset.accumulator.is_initialized());
        assert_eq!(asset.unit_symbol(), "h");
    }

    #[test]
    fn test_change_basis_swaps_only_default_plan() {
        let mut asset = Asset::new(
            "Truck 7".to_string(),
            AssetKind::Truck,
            "861234".to_string(),
            MeasurementBasis::Hours,
        );
        asset.change_basis(MeasurementBasis::Distance);
        assert_eq!(asset.maintenance_plan, default_plan(MeasurementBasis::Distance));

        asset.maintenance_plan.truncate(1);
        let edited = asset.maintenance_plan.clone();
        asset.change_basis(MeasurementBasis::Hours);
        assert_eq!(asset.maintenance_plan, edited);
        assert_eq!(asset.measurement_basis, MeasurementBasis::Hours);
    }
}
