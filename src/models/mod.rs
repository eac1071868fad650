//! Modelos del sistema
//! 
//! Este módulo contiene los modelos de datos: activos monitoreados, lecturas
//! del proveedor GPS, plan de mantenimiento y estado del horímetro.

pub mod asset;
pub mod maintenance;
pub mod telemetry;
pub mod usage;

pub use asset::{Asset, AssetKind, MeasurementBasis};
pub use maintenance::{default_plan, MaintenancePlanItem, MaintenanceStatus, TaskStatus};
pub use telemetry::{CachedReading, RawReading};
pub use usage::{AccumulatorState, MaintenanceReport, UsageSnapshot, UsageTotals};
