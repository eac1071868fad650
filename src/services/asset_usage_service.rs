//! Servicio de uso de activos
//!
//! Fachada que consume la capa HTTP: lectura cacheada → horímetro → plan
//! preventivo → snapshot. La secuencia "leer estado → avanzar → guardar" de un
//! activo corre bajo su propio mutex, así dos consultas simultáneas nunca
//! pliegan dos veces el mismo intervalo.

use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::maintenance_planner;
use super::usage_accumulator::AccumulatorOutcome;
use crate::cache::TelemetryCache;
use crate::models::{Asset, CachedReading, MaintenanceReport, MeasurementBasis, UsageSnapshot, UsageTotals};
use crate::repositories::AssetRepository;
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::round2;

/// Mutex por activo, creado bajo demanda
#[derive(Default)]
pub struct AssetLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl AssetLocks {
    pub async fn acquire(&self, asset_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(asset_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub async fn forget(&self, asset_id: Uuid) {
        self.locks.lock().await.remove(&asset_id);
    }
}

/// Resultado por activo de una consulta de flota
#[derive(Debug, Serialize)]
pub struct FleetEntry {
    pub asset_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<UsageSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct AssetUsageService {
    telemetry: Arc<TelemetryCache>,
    repository: Arc<dyn AssetRepository>,
    locks: AssetLocks,
}

impl AssetUsageService {
    pub fn new(telemetry: Arc<TelemetryCache>, repository: Arc<dyn AssetRepository>) -> Self {
        Self {
            telemetry,
            repository,
            locks: AssetLocks::default(),
        }
    }

    /// Consultar el uso actual de un activo.
    ///
    /// El estado del acumulador solo se escribe si cambió, y siempre antes de
    /// devolver el snapshot.
    pub async fn poll(&self, asset_id: Uuid) -> AppResult<UsageSnapshot> {
        let _guard = self.locks.acquire(asset_id).await;

        let asset = self.find_asset(asset_id).await?;
        let state = self.repository.load_state(asset_id).await?;
        let cached = self.telemetry.fetch(&asset.device_id).await?;

        let outcome = state.advance(cached.reading.server_time, cached.reading.engine_on);
        if outcome.state != state {
            self.repository.save_state(asset_id, &outcome.state).await?;
        }

        log::debug!(
            "⏱️ {} motor={} horas={:.4}",
            asset.name,
            if cached.reading.engine_on { "ON" } else { "OFF" },
            outcome.cumulative_running_hours
        );

        Ok(build_snapshot(&asset, &cached, &outcome))
    }

    pub async fn maintenance(&self, asset_id: Uuid) -> AppResult<MaintenanceReport> {
        Ok(self.poll(asset_id).await?.into())
    }

    pub async fn totals(&self, asset_id: Uuid) -> AppResult<UsageTotals> {
        Ok(UsageTotals::from(&self.poll(asset_id).await?))
    }

    /// Calibrar el uso acumulado con el valor que lee el operador.
    ///
    /// Base horas: override del horímetro. Base distancia: se guarda el offset
    /// contra el odómetro actual del proveedor.
    pub async fn calibrate(&self, asset_id: Uuid, value: f64) -> AppResult<UsageTotals> {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::InvalidCalibration(format!(
                "calibration value must be a non-negative number, got {}",
                value
            )));
        }

        let _guard = self.locks.acquire(asset_id).await;
        let mut asset = self.find_asset(asset_id).await?;

        match asset.measurement_basis {
            MeasurementBasis::Hours => {
                let state = self.repository.load_state(asset_id).await?.calibrated(value);
                self.repository.save_state(asset_id, &state).await?;
                // La próxima consulta arranca desde una lectura posterior a la calibración
                self.telemetry.invalidate(&asset.device_id).await;
                log::info!("🛠️ Horímetro de {} calibrado a {} h", asset.name, value);

                Ok(UsageTotals {
                    asset_id,
                    measurement_basis: asset.measurement_basis,
                    unit: asset.unit_symbol().to_string(),
                    usage: round2(value),
                    calibration_offset: asset.calibration_offset,
                    running_hours: round2(value),
                    stopped_hours: round2(state.stopped_hours()),
                })
            }
            MeasurementBasis::Distance => {
                let cached = self.telemetry.fetch(&asset.device_id).await?;
                asset.calibration_offset = value - cached.reading.odometer_km();
                let asset = self.repository.update(&asset).await?;
                log::info!(
                    "🛠️ Odómetro de {} calibrado a {} km (offset {:.2})",
                    asset.name,
                    value,
                    asset.calibration_offset
                );

                Ok(UsageTotals {
                    asset_id,
                    measurement_basis: asset.measurement_basis,
                    unit: asset.unit_symbol().to_string(),
                    usage: round2(value),
                    calibration_offset: asset.calibration_offset,
                    running_hours: round2(asset.accumulator.cumulative_running_hours),
                    stopped_hours: round2(asset.accumulator.stopped_hours()),
                })
            }
        }
    }

    /// Escribir el offset de distancia tal cual
    pub async fn set_offset(&self, asset_id: Uuid, offset: f64) -> AppResult<Asset> {
        if !offset.is_finite() {
            return Err(AppError::InvalidCalibration(format!("offset must be a finite number, got {}", offset)));
        }

        self.modify_asset(asset_id, |asset| {
            if asset.measurement_basis != MeasurementBasis::Distance {
                return Err(AppError::BadRequest(format!(
                    "asset '{}' is measured in hours; use calibration instead of an offset",
                    asset.name
                )));
            }
            asset.calibration_offset = offset;
            Ok(())
        })
        .await
    }

    /// Editar un activo bajo su mutex, sin competir con consultas ni calibraciones.
    ///
    /// Si cambia el rastreador, el horímetro conserva sus horas pero vuelve a
    /// arrancar con la primera muestra del equipo nuevo.
    pub async fn modify_asset<F>(&self, asset_id: Uuid, change: F) -> AppResult<Asset>
    where
        F: FnOnce(&mut Asset) -> AppResult<()> + Send,
    {
        let _guard = self.locks.acquire(asset_id).await;
        let mut asset = self.find_asset(asset_id).await?;
        let previous_device = asset.device_id.clone();
        change(&mut asset)?;
        let asset = self.repository.update(&asset).await?;

        if asset.device_id != previous_device {
            let state = self.repository.load_state(asset_id).await?;
            let state = state.calibrated(state.cumulative_running_hours);
            self.repository.save_state(asset_id, &state).await?;
            self.telemetry.invalidate(&asset.device_id).await;
            log::info!(
                "📡 {} cambió de rastreador: {} → {}",
                asset.name,
                previous_device,
                asset.device_id
            );
            // El estado devuelto refleja el reinicio
            return Ok(Asset {
                accumulator: state,
                ..asset
            });
        }

        Ok(asset)
    }

    /// Consultar todos los activos en paralelo; un fallo no corta al resto
    pub async fn fleet_usage(&self) -> AppResult<Vec<FleetEntry>> {
        let assets = self.repository.list().await?;

        let polls = assets.iter().map(|asset| async move {
            match self.poll(asset.id).await {
                Ok(snapshot) => FleetEntry {
                    asset_id: asset.id,
                    name: asset.name.clone(),
                    snapshot: Some(snapshot),
                    error: None,
                },
                Err(error) => {
                    log::warn!("⚠️ Fallo consultando {}: {}", asset.name, error);
                    FleetEntry {
                        asset_id: asset.id,
                        name: asset.name.clone(),
                        snapshot: None,
                        error: Some(error.to_string()),
                    }
                }
            }
        });

        Ok(join_all(polls).await)
    }

    /// Liberar el estado en memoria de un activo eliminado
    pub async fn forget(&self, asset_id: Uuid) {
        self.locks.forget(asset_id).await;
    }

    async fn find_asset(&self, asset_id: Uuid) -> AppResult<Asset> {
        self.repository
            .find_by_id(asset_id)
            .await?
            .ok_or_else(|| not_found_error("Asset", &asset_id.to_string()))
    }
}

fn build_snapshot(asset: &Asset, cached: &CachedReading, outcome: &AccumulatorOutcome) -> UsageSnapshot {
    let reading = &cached.reading;

    let usage = match asset.measurement_basis {
        MeasurementBasis::Hours => outcome.cumulative_running_hours,
        MeasurementBasis::Distance => reading.odometer_km() + asset.calibration_offset,
    };
    let usage = round2(usage);

    UsageSnapshot {
        asset_id: asset.id,
        name: asset.name.clone(),
        kind: asset.kind,
        device_id: asset.device_id.clone(),
        measurement_basis: asset.measurement_basis,
        unit: asset.unit_symbol().to_string(),
        engine_on: reading.engine_on,
        battery_voltage: reading.battery_voltage,
        server_time: reading.server_time,
        provider_cycle_hours: reading.provider_cycle_hours(),
        odometer_km: reading.odometer_km(),
        fetched_at: cached.fetched_at,
        calibration_offset: asset.calibration_offset,
        usage,
        running_hours: round2(outcome.cumulative_running_hours),
        stopped_hours: round2(outcome.stopped_hours),
        tasks: maintenance_planner::evaluate(usage, &asset.maintenance_plan),
    }
}
