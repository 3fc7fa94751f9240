//! PostgreSQL store backend
//!
//! The record lives in a single row of `messenger_store`: the data set as
//! JSONB and the beacon marker as a BIGINT. `save` replaces the document
//! and bumps the marker in one `UPDATE`, so every process polling the
//! marker sees the advance together with the data it describes.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use super::backend::StoreBackend;
use super::StoreError;
use crate::backend::realtime::beacon::ChangeBeacon;
use crate::shared::DataSet;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect, then run migrations
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        tracing::info!("[Store] Connecting to database...");
        let pool = PgPool::connect(database_url).await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, running migrations first
    pub async fn from_pool(pool: PgPool) -> Result<Self, StoreError> {
        tracing::info!("[Store] Running database migrations...");
        sqlx::migrate!().run(&pool).await?;
        tracing::info!("[Store] Database migrations completed successfully");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn marker_from(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[async_trait]
impl ChangeBeacon for PgStore {
    async fn advance(&self) -> Result<u64, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE messenger_store
            SET marker = marker + 1, updated_at = NOW()
            WHERE id = 1
            RETURNING marker
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(marker_from(row.try_get("marker")?))
    }

    async fn current_marker(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT marker FROM messenger_store WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(marker_from(row.try_get("marker")?)),
            None => Ok(0),
        }
    }
}

#[async_trait]
impl StoreBackend for PgStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn load(&self) -> Result<DataSet, StoreError> {
        let row = sqlx::query("SELECT data FROM messenger_store WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let Json(data) = row.try_get::<Json<DataSet>, _>("data")?;
                Ok(data)
            }
            None => Ok(DataSet::default()),
        }
    }

    async fn save(&self, data: &DataSet) -> Result<u64, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO messenger_store (id, data, marker, updated_at)
            VALUES (1, $1, 1, NOW())
            ON CONFLICT (id) DO UPDATE
            SET data = EXCLUDED.data,
                marker = messenger_store.marker + 1,
                updated_at = NOW()
            RETURNING marker
            "#,
        )
        .bind(Json(data))
        .fetch_one(&self.pool)
        .await?;
        Ok(marker_from(row.try_get("marker")?))
    }
}
