//! Plan de mantenimiento preventivo
//!
//! Este módulo contiene los ítems del plan y el estado derivado de cada tarea.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::asset::MeasurementBasis;
use crate::utils::validation::validate_not_empty;

fn default_warn_before() -> f64 {
    10.0
}

/// Ítem del plan preventivo de un activo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MaintenancePlanItem {
    #[validate(length(min = 1, max = 120), custom = "validate_not_empty")]
    pub name: String,

    pub unit: MeasurementBasis,

    /// Umbral de la primera ejecución. Ítems con umbral <= 0 se ignoran al evaluar.
    pub first_threshold: f64,

    /// Intervalo de repetición. Ítems con intervalo <= 0 se ignoran al evaluar.
    pub interval: f64,

    #[serde(default = "default_warn_before")]
    #[validate(range(min = 0.0))]
    pub warn_before: f64,
}

impl MaintenancePlanItem {
    pub fn new(name: &str, unit: MeasurementBasis, first_threshold: f64, interval: f64, warn_before: f64) -> Self {
        Self {
            name: name.to_string(),
            unit,
            first_threshold,
            interval,
            warn_before,
        }
    }

    /// Un ítem mal formado se salta sin abortar la evaluación del resto del plan
    pub fn is_well_formed(&self) -> bool {
        self.first_threshold.is_finite()
            && self.interval.is_finite()
            && self.first_threshold > 0.0
            && self.interval > 0.0
    }
}

/// Estado de una tarea preventiva, ordenado por urgencia
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceStatus {
    Overdue,
    DueSoon,
    Ok,
}

impl MaintenanceStatus {
    pub fn priority(&self) -> u8 {
        match self {
            MaintenanceStatus::Overdue => 0,
            MaintenanceStatus::DueSoon => 1,
            MaintenanceStatus::Ok => 2,
        }
    }
}

/// Estado derivado (no persistido) de un ítem del plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub name: String,
    pub unit: MeasurementBasis,
    pub first_threshold: f64,
    pub interval: f64,
    pub warn_before: f64,
    pub next_due: f64,
    pub remaining: f64,
    pub status: MaintenanceStatus,
}

/// Plan preventivo de fábrica para una base de medición
pub fn default_plan(basis: MeasurementBasis) -> Vec<MaintenancePlanItem> {
    match basis {
        MeasurementBasis::Hours => vec![
            MaintenancePlanItem::new("Engine oil change", basis, 100.0, 100.0, 10.0),
            MaintenancePlanItem::new("Oil filter replacement", basis, 100.0, 100.0, 10.0),
            MaintenancePlanItem::new("Drain fuel/water separator", basis, 100.0, 100.0, 10.0),
            MaintenancePlanItem::new("Fuel filter replacement", basis, 200.0, 200.0, 10.0),
        ],
        MeasurementBasis::Distance => vec![
            MaintenancePlanItem::new("Engine oil change", basis, 10_000.0, 10_000.0, 500.0),
            MaintenancePlanItem::new("Oil filter replacement", basis, 10_000.0, 10_000.0, 500.0),
            MaintenancePlanItem::new("Fuel filter replacement", basis, 20_000.0, 20_000.0, 1_000.0),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&MaintenanceStatus::DueSoon).unwrap();
        assert_eq!(json, "\"DUE_SOON\"");
    }

    #[test]
    fn test_warn_before_defaults_to_ten() {
        let item: MaintenancePlanItem = serde_json::from_str(
            r#"{"name":"Impeller","unit":"hours","first_threshold":300,"interval":300}"#,
        )
        .unwrap();
        assert_eq!(item.warn_before, 10.0);
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_well_formed() {
        let item = MaintenancePlanItem::new("x", MeasurementBasis::Hours, 0.0, 100.0, 10.0);
        assert!(!item.is_well_formed());
        let item = MaintenancePlanItem::new("x", MeasurementBasis::Hours, 100.0, -1.0, 10.0);
        assert!(!item.is_well_formed());
        assert!(default_plan(MeasurementBasis::Distance).iter().all(|i| i.is_well_formed()));
    }
}
