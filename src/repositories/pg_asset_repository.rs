use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::asset_repository::{AssetRepository, AssetStateStore};
use crate::models::{AccumulatorState, Asset, MaintenancePlanItem};
use crate::utils::errors::{not_found_error, AppError, AppResult};

const ASSET_COLUMNS: &str = "id, name, kind, device_id, measurement_basis, calibration_offset, \
                             maintenance_plan, accumulator, created_at, updated_at";

const CLEAR_CURRENT_SQL: &str = "UPDATE assets SET is_current = FALSE WHERE is_current";
const MARK_CURRENT_SQL: &str = "UPDATE assets SET is_current = TRUE WHERE id = $1";

// Fila de la tabla assets
#[derive(Debug, sqlx::FromRow)]
struct AssetRow {
    id: Uuid,
    name: String,
    kind: String,
    device_id: String,
    measurement_basis: String,
    calibration_offset: f64,
    maintenance_plan: Json<Vec<MaintenancePlanItem>>,
    accumulator: Json<AccumulatorState>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AssetRow> for Asset {
    type Error = AppError;

    fn try_from(row: AssetRow) -> Result<Self, Self::Error> {
        Ok(Asset {
            id: row.id,
            name: row.name,
            kind: row.kind.parse().map_err(AppError::Internal)?,
            device_id: row.device_id,
            measurement_basis: row.measurement_basis.parse().map_err(AppError::Internal)?,
            calibration_offset: row.calibration_offset,
            maintenance_plan: row.maintenance_plan.0,
            accumulator: row.accumulator.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repositorio PostgreSQL: plan y acumulador como JSONB
pub struct PgAssetRepository {
    pool: PgPool,
}

impl PgAssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetStateStore for PgAssetRepository {
    async fn load_state(&self, asset_id: Uuid) -> AppResult<AccumulatorState> {
        let state: Option<(Json<AccumulatorState>,)> =
            sqlx::query_as("SELECT accumulator FROM assets WHERE id = $1")
                .bind(asset_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(state.map(|(state,)| state.0).unwrap_or_default())
    }

    async fn save_state(&self, asset_id: Uuid, state: &AccumulatorState) -> AppResult<()> {
        let result = sqlx::query("UPDATE assets SET accumulator = $2, updated_at = $3 WHERE id = $1")
            .bind(asset_id)
            .bind(Json(state))
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found_error("Asset", &asset_id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AssetRepository for PgAssetRepository {
    async fn list(&self) -> AppResult<Vec<Asset>> {
        let rows = sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {} FROM assets ORDER BY created_at ASC, id ASC",
            ASSET_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Asset::try_from).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(&format!("SELECT {} FROM assets WHERE id = $1", ASSET_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Asset::try_from).transpose()
    }

    async fn insert(&self, asset: &Asset) -> AppResult<Asset> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            r#"
            INSERT INTO assets (id, name, kind, device_id, measurement_basis, calibration_offset,
                                maintenance_plan, accumulator, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            ASSET_COLUMNS
        ))
        .bind(asset.id)
        .bind(&asset.name)
        .bind(asset.kind.as_str())
        .bind(&asset.device_id)
        .bind(asset.measurement_basis.as_str())
        .bind(asset.calibration_offset)
        .bind(Json(&asset.maintenance_plan))
        .bind(Json(&asset.accumulator))
        .bind(asset.created_at)
        .bind(asset.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Asset::try_from(row)
    }

    async fn update(&self, asset: &Asset) -> AppResult<Asset> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            r#"
            UPDATE assets
            SET name = $2, kind = $3, device_id = $4, measurement_basis = $5,
                calibration_offset = $6, maintenance_plan = $7, updated_at = $8
            WHERE id = $1
            RETURNING {}
            "#,
            ASSET_COLUMNS
        ))
        .bind(asset.id)
        .bind(&asset.name)
        .bind(asset.kind.as_str())
        .bind(&asset.device_id)
        .bind(asset.measurement_basis.as_str())
        .bind(asset.calibration_offset)
        .bind(Json(&asset.maintenance_plan))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_error("Asset", &asset.id.to_string()))?;

        Asset::try_from(row)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn current_asset_id(&self) -> AppResult<Option<Uuid>> {
        let current: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM assets WHERE is_current LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;

        Ok(current.map(|(id,)| id))
    }

    async fn set_current_asset(&self, id: Option<Uuid>) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(id) = id {
            let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM assets WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
            if !exists {
                return Err(not_found_error("Asset", &id.to_string()));
            }
        }

        // El índice único parcial se verifica fila a fila: primero se limpia la
        // marca vieja y después se pone la nueva
        sqlx::query(CLEAR_CURRENT_SQL).execute(&mut *tx).await?;
        if let Some(id) = id {
            sqlx::query(MARK_CURRENT_SQL).bind(id).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_mark_is_cleared_before_it_is_set() {
        // Un solo UPDATE que toca ambas filas choca con idx_assets_single_current
        assert!(CLEAR_CURRENT_SQL.contains("is_current = FALSE"));
        assert!(!CLEAR_CURRENT_SQL.contains("$1"));
        assert!(MARK_CURRENT_SQL.contains("is_current = TRUE WHERE id = $1"));
    }
}
