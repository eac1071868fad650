//! Clientes - Clientes HTTP para APIs externas
//!
//! Este módulo define la frontera con el proveedor de telemetría (credencial y
//! lectura cruda) y sus implementaciones.

pub mod brasilsat_client;
pub mod mock;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::models::RawReading;

// Re-export main types for convenience
pub use brasilsat_client::{sign_request, BrasilsatClient};
pub use mock::MockTelemetryProvider;

/// Errores del proveedor de telemetría
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelemetryError {
    #[error("provider rejected credentials: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned code {code}: {message}")]
    Provider { code: i64, message: String },

    #[error("provider did not answer within {0:?}")]
    Timeout(Duration),

    #[error("malformed provider payload: {0}")]
    Malformed(String),
}

impl TelemetryError {
    pub fn is_auth(&self) -> bool {
        matches!(self, TelemetryError::Auth(_))
    }
}

/// Token de sesión emitido por el proveedor
#[derive(Debug, Clone)]
pub struct ProviderToken {
    pub access_token: String,
    /// Vida útil anunciada por el proveedor, en segundos.
    pub expires_in: Option<u64>,
}

/// Obtiene (o renueva) la credencial de sesión del proveedor
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_token(&self) -> Result<ProviderToken, TelemetryError>;
}

/// Lectura puntual de un dispositivo, sin cache
#[async_trait]
pub trait TelemetryFetcher: Send + Sync {
    async fn fetch_raw(&self, access_token: &str, device_id: &str) -> Result<RawReading, TelemetryError>;
}
