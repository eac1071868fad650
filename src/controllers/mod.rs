//! Controllers
//!
//! Un controller por recurso; los handlers de `routes` los construyen por request.

pub mod asset_controller;
pub mod usage_controller;

pub use asset_controller::AssetController;
pub use usage_controller::UsageController;
