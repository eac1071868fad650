//! Cache
//!
//! Este módulo contiene el cache de lecturas de telemetría y su configuración.

pub mod cache_config;
pub mod telemetry_cache;

pub use cache_config::TelemetryCacheConfig;
pub use telemetry_cache::{CacheStats, TelemetryCache};
