//! Estado compartido de la aplicación
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::cache::TelemetryCache;
use crate::config::environment::EnvironmentConfig;
use crate::repositories::AssetRepository;
use crate::services::AssetUsageService;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub repository: Arc<dyn AssetRepository>,
    pub telemetry: Arc<TelemetryCache>,
    pub usage_service: Arc<AssetUsageService>,
    /// `postgres` o `memory`, para /health
    pub storage: &'static str,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        repository: Arc<dyn AssetRepository>,
        telemetry: Arc<TelemetryCache>,
        storage: &'static str,
    ) -> Self {
        let usage_service = Arc::new(AssetUsageService::new(telemetry.clone(), repository.clone()));
        Self {
            config,
            repository,
            telemetry,
            usage_service,
            storage,
        }
    }
}
