//! Módulo de servicios
//!
//! Este módulo contiene la lógica de negocio: el horímetro, el planificador de
//! mantenimiento y el servicio que los orquesta por activo.

pub mod asset_usage_service;
pub mod maintenance_planner;
pub mod usage_accumulator;

pub use asset_usage_service::{AssetLocks, AssetUsageService, FleetEntry};
pub use usage_accumulator::AccumulatorOutcome;
