//! Estado del horímetro y snapshot de uso
//!
//! `AccumulatorState` es el estado durable por activo que alimenta la máquina de
//! estados de `services::usage_accumulator`. `UsageSnapshot` es lo que se devuelve
//! en cada consulta.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::asset::{AssetKind, MeasurementBasis};
use super::maintenance::TaskStatus;

/// Estado durable del acumulador (uno por activo)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulatorState {
    /// Timestamp de la última muestra; 0 significa "sin inicializar".
    pub last_sample_time: i64,
    pub last_engine_on: bool,
    pub cumulative_running_hours: f64,
    /// Segundos con el motor parado desde el último arranque.
    pub stopped_accum_seconds: i64,
}

impl AccumulatorState {
    pub fn is_initialized(&self) -> bool {
        self.last_sample_time > 0
    }
}

/// Snapshot de uso de un activo tras una consulta
#[derive(Debug, Clone, Serialize)]
pub struct UsageSnapshot {
    pub asset_id: Uuid,
    pub name: String,
    pub kind: AssetKind,
    pub device_id: String,
    pub measurement_basis: MeasurementBasis,
    pub unit: String,

    // Eco de la lectura
    pub engine_on: bool,
    pub battery_voltage: f64,
    pub server_time: i64,
    pub provider_cycle_hours: f64,
    pub odometer_km: f64,
    pub fetched_at: DateTime<Utc>,

    pub calibration_offset: f64,
    /// Uso acumulado en la unidad de la base de medición.
    pub usage: f64,
    pub running_hours: f64,
    pub stopped_hours: f64,
    pub tasks: Vec<TaskStatus>,
}

/// Reporte de mantenimiento preventivo de un activo
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceReport {
    pub asset_id: Uuid,
    pub name: String,
    pub kind: AssetKind,
    pub device_id: String,
    pub usage: f64,
    pub unit: String,
    pub tasks: Vec<TaskStatus>,
}

impl From<UsageSnapshot> for MaintenanceReport {
    fn from(snapshot: UsageSnapshot) -> Self {
        Self {
            asset_id: snapshot.asset_id,
            name: snapshot.name,
            kind: snapshot.kind,
            device_id: snapshot.device_id,
            usage: snapshot.usage,
            unit: snapshot.unit,
            tasks: snapshot.tasks,
        }
    }
}

/// Totales de uso y calibración de un activo
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageTotals {
    pub asset_id: Uuid,
    pub measurement_basis: MeasurementBasis,
    pub unit: String,
    pub usage: f64,
    pub calibration_offset: f64,
    pub running_hours: f64,
    pub stopped_hours: f64,
}

impl From<&UsageSnapshot> for UsageTotals {
    fn from(snapshot: &UsageSnapshot) -> Self {
        Self {
            asset_id: snapshot.asset_id,
            measurement_basis: snapshot.measurement_basis,
            unit: snapshot.unit.clone(),
            usage: snapshot.usage,
            calibration_offset: snapshot.calibration_offset,
            running_hours: snapshot.running_hours,
            stopped_hours: snapshot.stopped_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_defaults_on_read() {
        let state: AccumulatorState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, AccumulatorState::default());
        assert!(!state.is_initialized());

        let state: AccumulatorState =
            serde_json::from_str(r#"{"last_sample_time":1700000000,"cumulative_running_hours":12.5}"#).unwrap();
        assert!(state.is_initialized());
        assert!(!state.last_engine_on);
        assert_eq!(state.stopped_accum_seconds, 0);
    }
}
