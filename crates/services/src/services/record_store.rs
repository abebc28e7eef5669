//! Persistence capability used by the ephemeris service.

use async_trait::async_trait;
use db::models::ephemeris::{CreateEphemeris, Ephemeris};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, record: CreateEphemeris) -> Result<Ephemeris, RecordStoreError>;

    /// Rows for an `MM-DD` key, ordered by full date ascending.
    async fn query_by_display_key(&self, display_key: &str)
    -> Result<Vec<Ephemeris>, RecordStoreError>;

    /// One row chosen uniformly from the whole table.
    async fn query_random_record(&self) -> Result<Option<Ephemeris>, RecordStoreError>;
}

/// SQLite-backed store
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, record: CreateEphemeris) -> Result<Ephemeris, RecordStoreError> {
        Ok(Ephemeris::create(&self.pool, Uuid::new_v4(), &record).await?)
    }

    async fn query_by_display_key(
        &self,
        display_key: &str,
    ) -> Result<Vec<Ephemeris>, RecordStoreError> {
        Ok(Ephemeris::find_by_display_date(&self.pool, display_key).await?)
    }

    async fn query_random_record(&self) -> Result<Option<Ephemeris>, RecordStoreError> {
        Ok(Ephemeris::find_random(&self.pool).await?)
    }
}
