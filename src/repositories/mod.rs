//! Repositorios
//!
//! Persistencia de activos y del estado del horímetro.

pub mod asset_repository;
pub mod pg_asset_repository;

pub use asset_repository::{AssetRepository, AssetStateStore, InMemoryAssetRepository};
pub use pg_asset_repository::PgAssetRepository;
