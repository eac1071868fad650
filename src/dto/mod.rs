//! DTOs de la API HTTP

pub mod asset_dto;
pub mod common_dto;
pub mod usage_dto;

pub use asset_dto::*;
pub use common_dto::*;
pub use usage_dto::*;
