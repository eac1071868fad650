use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{AccumulatorState, Asset};
use crate::utils::errors::{not_found_error, AppResult};

/// Almacén durable del estado del horímetro por activo
#[async_trait]
pub trait AssetStateStore: Send + Sync {
    /// Estado guardado; un activo sin estado devuelve el estado por defecto.
    async fn load_state(&self, asset_id: Uuid) -> AppResult<AccumulatorState>;

    async fn save_state(&self, asset_id: Uuid, state: &AccumulatorState) -> AppResult<()>;
}

/// Registro de activos y del activo "actual"
#[async_trait]
pub trait AssetRepository: AssetStateStore {
    /// Todos los activos, en orden de creación
    async fn list(&self) -> AppResult<Vec<Asset>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Asset>>;

    async fn insert(&self, asset: &Asset) -> AppResult<Asset>;

    /// Actualiza datos, plan y calibración. El acumulador solo se escribe con `save_state`.
    async fn update(&self, asset: &Asset) -> AppResult<Asset>;

    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    async fn current_asset_id(&self) -> AppResult<Option<Uuid>>;

    async fn set_current_asset(&self, id: Option<Uuid>) -> AppResult<()>;
}

#[derive(Default)]
struct InMemoryStore {
    assets: HashMap<Uuid, Asset>,
    // Orden de alta
    order: Vec<Uuid>,
    current: Option<Uuid>,
}

/// Repositorio en memoria, para desarrollo sin base de datos y para pruebas
#[derive(Default)]
pub struct InMemoryAssetRepository {
    store: RwLock<InMemoryStore>,
}

impl InMemoryAssetRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetStateStore for InMemoryAssetRepository {
    async fn load_state(&self, asset_id: Uuid) -> AppResult<AccumulatorState> {
        let store = self.store.read().await;
        Ok(store
            .assets
            .get(&asset_id)
            .map(|asset| asset.accumulator)
            .unwrap_or_default())
    }

    async fn save_state(&self, asset_id: Uuid, state: &AccumulatorState) -> AppResult<()> {
        let mut store = self.store.write().await;
        let asset = store
            .assets
            .get_mut(&asset_id)
            .ok_or_else(|| not_found_error("Asset", &asset_id.to_string()))?;
        asset.accumulator = *state;
        asset.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl AssetRepository for InMemoryAssetRepository {
    async fn list(&self) -> AppResult<Vec<Asset>> {
        let store = self.store.read().await;
        Ok(store
            .order
            .iter()
            .filter_map(|id| store.assets.get(id).cloned())
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Asset>> {
        Ok(self.store.read().await.assets.get(&id).cloned())
    }

    async fn insert(&self, asset: &Asset) -> AppResult<Asset> {
        let mut store = self.store.write().await;
        if store.assets.insert(asset.id, asset.clone()).is_none() {
            store.order.push(asset.id);
        }
        Ok(asset.clone())
    }

    async fn update(&self, asset: &Asset) -> AppResult<Asset> {
        let mut store = self.store.write().await;
        let stored = store
            .assets
            .get_mut(&asset.id)
            .ok_or_else(|| not_found_error("Asset", &asset.id.to_string()))?;

        let accumulator = stored.accumulator;
        *stored = Asset {
            accumulator,
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..asset.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut store = self.store.write().await;
        let removed = store.assets.remove(&id).is_some();
        store.order.retain(|existing| *existing != id);
        if store.current == Some(id) {
            store.current = None;
        }
        Ok(removed)
    }

    async fn current_asset_id(&self) -> AppResult<Option<Uuid>> {
        Ok(self.store.read().await.current)
    }

    async fn set_current_asset(&self, id: Option<Uuid>) -> AppResult<()> {
        let mut store = self.store.write().await;
        if let Some(id) = id {
            if !store.assets.contains_key(&id) {
                return Err(not_found_error("Asset", &id.to_string()));
            }
        }
        store.current = id;
        Ok(())
    }
}
