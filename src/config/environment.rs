//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno: servidor HTTP, credenciales
//! de BrasilSat, tiempos de cache y el activo inicial opcional.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::models::{AssetKind, MeasurementBasis};

pub const DEFAULT_BRASILSAT_BASE_URL: &str = "https://gps.brasilsatgps.com.br";

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub log_level: String,
    pub cors_origins: Vec<String>,
    /// Sin URL se usa el repositorio en memoria.
    pub database_url: Option<String>,
    // BrasilSat
    pub brasilsat_base_url: String,
    pub brasilsat_account: String,
    pub brasilsat_password: String,
    pub upstream_timeout_secs: u64,
    pub token_lifetime_secs: u64,
    pub reading_ttl_secs: u64,
    pub bootstrap: Option<BootstrapConfig>,
}

/// Activo a registrar al arrancar con el almacén vacío
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapConfig {
    pub device_id: String,
    pub name: String,
    pub kind: AssetKind,
    pub measurement_basis: MeasurementBasis,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: var_or("ENVIRONMENT", "development"),
            port: parse_or("PORT", 8080),
            host: var_or("HOST", "0.0.0.0"),
            log_level: var_or("LOG_LEVEL", "info"),
            cors_origins: var_or("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            brasilsat_base_url: var_or("BRASILSAT_BASE_URL", DEFAULT_BRASILSAT_BASE_URL),
            brasilsat_account: var_or("BRASILSAT_ACCOUNT", ""),
            brasilsat_password: var_or("BRASILSAT_PASSWORD", ""),
            upstream_timeout_secs: parse_or("UPSTREAM_TIMEOUT_SECS", 15),
            token_lifetime_secs: parse_or("TOKEN_LIFETIME_SECS", 3000),
            reading_ttl_secs: parse_or("READING_TTL_SECS", 20),
            bootstrap: BootstrapConfig::from_env(),
        }
    }
}

impl EnvironmentConfig {
    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn has_provider_credentials(&self) -> bool {
        !self.brasilsat_account.is_empty() && !self.brasilsat_password.is_empty()
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn token_lifetime(&self) -> Duration {
        Duration::from_secs(self.token_lifetime_secs)
    }

    pub fn reading_ttl(&self) -> Duration {
        Duration::from_secs(self.reading_ttl_secs)
    }

    /// Nivel de log para tracing; valores desconocidos caen en INFO
    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(&self.log_level).unwrap_or(tracing::Level::INFO)
    }
}

impl BootstrapConfig {
    /// `BOOTSTRAP_DEVICE_ID` es obligatorio; el resto tiene valores por defecto.
    pub fn from_env() -> Option<Self> {
        let device_id = env::var("BOOTSTRAP_DEVICE_ID").ok()?.trim().to_string();
        if device_id.is_empty() {
            return None;
        }

        let kind = env::var("BOOTSTRAP_KIND")
            .ok()
            .and_then(|value| value.parse::<AssetKind>().ok())
            .unwrap_or(AssetKind::Boat);
        let measurement_basis = env::var("BOOTSTRAP_BASIS")
            .ok()
            .and_then(|value| value.parse::<MeasurementBasis>().ok())
            .unwrap_or_else(|| kind.default_basis());

        Some(Self {
            name: var_or("BOOTSTRAP_NAME", &format!("Device {}", device_id)),
            device_id,
            kind,
            measurement_basis,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("⚠️ {} inválido ('{}'), usando valor por defecto", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations_and_log_level() {
        let config = EnvironmentConfig {
            environment: "test".to_string(),
            port: 3000,
            host: "127.0.0.1".to_string(),
            log_level: "debug".to_string(),
            cors_origins: vec!["*".to_string()],
            database_url: None,
            brasilsat_base_url: DEFAULT_BRASILSAT_BASE_URL.to_string(),
            brasilsat_account: String::new(),
            brasilsat_password: String::new(),
            upstream_timeout_secs: 15,
            token_lifetime_secs: 3000,
            reading_ttl_secs: 20,
            bootstrap: None,
        };

        assert_eq!(config.server_url(), "127.0.0.1:3000");
        assert_eq!(config.reading_ttl(), Duration::from_secs(20));
        assert_eq!(config.token_lifetime(), Duration::from_secs(3000));
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
        assert!(!config.has_provider_credentials());

        let config = EnvironmentConfig {
            log_level: "verbose".to_string(),
            ..config
        };
        assert_eq!(config.log_level(), tracing::Level::INFO);
    }
}
