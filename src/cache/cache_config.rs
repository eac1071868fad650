//! Configuración de cache
//!
//! Este módulo contiene los tiempos del cache de telemetría.

use serde::Serialize;
use std::time::Duration;

use crate::config::EnvironmentConfig;

/// Configuración del cache de telemetría
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TelemetryCacheConfig {
    /// Ventana durante la cual una lectura se sirve sin ir al proveedor.
    pub reading_ttl: Duration,
    /// Vida estimada de la sesión; el proveedor no la garantiza.
    pub token_lifetime: Duration,
    pub upstream_timeout: Duration,
}

impl Default for TelemetryCacheConfig {
    fn default() -> Self {
        Self {
            reading_ttl: Duration::from_secs(20),
            token_lifetime: Duration::from_secs(50 * 60), // 50 minutos
            upstream_timeout: Duration::from_secs(15),
        }
    }
}

impl TelemetryCacheConfig {
    pub fn from_env_config(config: &EnvironmentConfig) -> Self {
        Self {
            reading_ttl: config.reading_ttl(),
            token_lifetime: config.token_lifetime(),
            upstream_timeout: config.upstream_timeout(),
        }
    }
}
