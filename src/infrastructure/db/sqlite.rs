use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use super::RecordBackend;
use crate::domain::error::{AppError, Result};
use crate::domain::summary::Summary;
use crate::domain::upload_record::{NewUploadRecord, RecordId, UploadRecord};

/// Durable record store backed by a SQLite file.
pub struct SqliteRecordBackend {
    pool: SqlitePool,
}

impl SqliteRecordBackend {
    pub async fn connect(db_path: &Path) -> Result<Self> {
        let db_url = db_path_to_url(db_path)?;
        let options = SqliteConnectOptions::from_str(&db_url)
            .map_err(|e| AppError::DatabaseError(format!("Failed to parse database URL: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {e}")))?;

        let backend = Self::from_pool(pool).await?;
        info!(path = %db_path.display(), "Upload record database ready");
        Ok(backend)
    }

    /// Wrap an existing pool and make sure the schema exists.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        apply_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_path_to_url(db_path: &Path) -> Result<String> {
    let db_path_str = db_path.to_str().ok_or_else(|| {
        AppError::ConfigError("Database path is not valid UTF-8".to_string())
    })?;
    Ok(format!("sqlite://{}", db_path_str.replace('\\', "/")))
}

async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS upload_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL,
            summary_json TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| AppError::DatabaseError(format!("Failed to create table: {e}")))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_upload_records_created
            ON upload_records(created_at DESC, id DESC)",
    )
    .execute(pool)
    .await
    .map_err(|e| AppError::DatabaseError(format!("Failed to create index: {e}")))?;

    Ok(())
}

#[async_trait]
impl RecordBackend for SqliteRecordBackend {
    async fn insert_retaining(
        &self,
        record: NewUploadRecord,
        keep: usize,
    ) -> Result<(UploadRecord, u64)> {
        let summary_json = serde_json::to_string(&record.summary)
            .map_err(|e| AppError::Internal(format!("Failed to encode summary: {e}")))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {e}")))?;

        let inserted = sqlx::query(
            "INSERT INTO upload_records (filename, summary_json, created_at) VALUES (?, ?, ?)",
        )
        .bind(&record.filename)
        .bind(&summary_json)
        .bind(record.created_at.timestamp_micros())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert upload record: {e}")))?;

        let evicted = sqlx::query(
            "DELETE FROM upload_records WHERE id NOT IN (
                SELECT id FROM upload_records ORDER BY created_at DESC, id DESC LIMIT ?
             )",
        )
        .bind(keep as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to evict old records: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit insert: {e}")))?;

        let id = RecordId(inserted.last_insert_rowid());
        Ok((record.into_record(id), evicted.rows_affected()))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<UploadRecord>> {
        sqlx::query_as::<_, UploadRecordEntity>(
            "SELECT id, filename, summary_json, created_at FROM upload_records
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch history: {e}")))?
        .into_iter()
        .map(UploadRecord::try_from)
        .collect()
    }

    async fn get(&self, id: RecordId) -> Result<UploadRecord> {
        let entity = sqlx::query_as::<_, UploadRecordEntity>(
            "SELECT id, filename, summary_json, created_at FROM upload_records WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch upload record: {e}")))?;

        match entity {
            Some(entity) => entity.try_into(),
            None => Err(AppError::NotFound(format!(
                "Upload record not found: {}",
                id
            ))),
        }
    }
}

// Internal entity for database mapping
#[derive(sqlx::FromRow)]
struct UploadRecordEntity {
    id: i64,
    filename: String,
    summary_json: String,
    created_at: i64,
}

impl TryFrom<UploadRecordEntity> for UploadRecord {
    type Error = AppError;

    fn try_from(e: UploadRecordEntity) -> Result<Self> {
        let summary: Summary = serde_json::from_str(&e.summary_json).map_err(|err| {
            AppError::DatabaseError(format!("Corrupt summary for record {}: {err}", e.id))
        })?;
        let created_at = Utc.timestamp_micros(e.created_at).single().ok_or_else(|| {
            AppError::DatabaseError(format!("Invalid timestamp for record {}", e.id))
        })?;

        Ok(Self {
            id: RecordId(e.id),
            filename: e.filename,
            summary,
            created_at,
        })
    }
}
