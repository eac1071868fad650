//! Lecturas del rastreador GPS
//!
//! Una `RawReading` es la lectura normalizada de un dispositivo tal como la entrega
//! el proveedor. `servertime` es el reloj autoritativo para todo cálculo de intervalos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};

use crate::utils::round2;

/// Lectura normalizada de un dispositivo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    pub device_id: String,
    pub engine_on: bool,
    /// Segundos de motor encendido del ciclo actual según el proveedor.
    /// Se reinicia sin aviso: solo informativo, nunca fuente acumulada.
    pub cycle_running_seconds: i64,
    /// Odómetro en metros, monótono.
    pub odometer_meters: f64,
    pub battery_voltage: f64,
    /// Epoch en segundos del servidor del proveedor.
    pub server_time: i64,
}

impl RawReading {
    pub fn odometer_km(&self) -> f64 {
        round2(self.odometer_meters / 1000.0)
    }

    pub fn provider_cycle_hours(&self) -> f64 {
        round2(self.cycle_running_seconds as f64 / 3600.0)
    }
}

/// Lectura cacheada, etiquetada con el momento local de la descarga
#[derive(Debug, Clone)]
pub struct CachedReading {
    pub reading: RawReading,
    pub fetched_at: DateTime<Utc>,
    loaded_at: Instant,
}

impl CachedReading {
    pub fn new(reading: RawReading) -> Self {
        Self {
            reading,
            fetched_at: Utc::now(),
            loaded_at: Instant::now(),
        }
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.loaded_at.elapsed() < ttl
    }

    pub fn age(&self) -> Duration {
        self.loaded_at.elapsed()
    }
}
