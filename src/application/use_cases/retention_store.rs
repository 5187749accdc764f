use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::error::{AppError, Result};
use crate::domain::summary::Summary;
use crate::domain::upload_record::{NewUploadRecord, RecordId, UploadRecord};
use crate::infrastructure::db::RecordBackend;

pub const DEFAULT_RETENTION: usize = 5;

/// Bounded recency window over an injected record backend.
///
/// Inserts are serialized: stamping, storing and evicting happen under one
/// writer lock, so at most `capacity` records exist once any insert returns.
pub struct RetentionStore {
    backend: Arc<dyn RecordBackend + Send + Sync>,
    capacity: usize,
    /// Last issued timestamp in microseconds; `None` until first insert.
    writer: Mutex<Option<i64>>,
}

impl RetentionStore {
    pub fn new(backend: Arc<dyn RecordBackend + Send + Sync>) -> Self {
        Self::with_capacity(backend, DEFAULT_RETENTION)
    }

    pub fn with_capacity(backend: Arc<dyn RecordBackend + Send + Sync>, capacity: usize) -> Self {
        Self {
            backend,
            capacity: capacity.max(1),
            writer: Mutex::new(None),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn insert(&self, filename: String, summary: Summary) -> Result<UploadRecord> {
        let mut last_stamp = self.writer.lock().await;

        let floor = match *last_stamp {
            Some(stamp) => stamp,
            None => self
                .backend
                .list_recent(1)
                .await?
                .first()
                .map(|r| r.created_at.timestamp_micros())
                .unwrap_or(i64::MIN),
        };
        let created_at = next_stamp(Utc::now(), floor)?;

        let (record, evicted) = self
            .backend
            .insert_retaining(
                NewUploadRecord {
                    filename,
                    summary,
                    created_at,
                },
                self.capacity,
            )
            .await?;
        *last_stamp = Some(created_at.timestamp_micros());

        info!(id = %record.id, filename = %record.filename, evicted, "Stored upload record");
        Ok(record)
    }

    /// Up to `limit` records, newest first. Never more than the capacity.
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<UploadRecord>> {
        let records = self.backend.list_recent(limit.min(self.capacity)).await?;
        debug!(count = records.len(), "Listed recent upload records");
        Ok(records)
    }

    pub async fn get(&self, id: RecordId) -> Result<UploadRecord> {
        self.backend.get(id).await
    }
}

/// Microsecond timestamp strictly after `floor_micros`, preferring `now`.
fn next_stamp(now: DateTime<Utc>, floor_micros: i64) -> Result<DateTime<Utc>> {
    let micros = now.timestamp_micros().max(floor_micros.saturating_add(1));
    Utc.timestamp_micros(micros)
        .single()
        .ok_or_else(|| AppError::Internal(format!("Timestamp out of range: {micros}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::InMemoryRecordBackend;
    use std::collections::BTreeMap;

    fn summary(total: u64) -> Summary {
        Summary {
            total_count: total,
            avg_flowrate: 1.5,
            avg_pressure: 2.5,
            avg_temperature: 3.5,
            type_distribution: BTreeMap::from([("Pump".to_string(), total)]),
        }
    }

    fn store() -> RetentionStore {
        RetentionStore::new(Arc::new(InMemoryRecordBackend::new()))
    }

    #[tokio::test]
    async fn test_insert_then_get_returns_same_record() {
        let store = store();
        let inserted = store.insert("a.csv".into(), summary(4)).await.unwrap();
        let fetched = store.get(inserted.id).await.unwrap();

        assert_eq!(fetched, inserted);
        assert_eq!(fetched.filename, "a.csv");
        assert_eq!(fetched.summary, summary(4));
    }

    #[tokio::test]
    async fn test_six_inserts_keep_last_five() {
        let store = store();
        let mut ids = Vec::new();
        for i in 0..6 {
            let record = store.insert(format!("{i}.csv"), summary(i + 1)).await.unwrap();
            ids.push(record.id);
        }

        let recent = store.list_recent(DEFAULT_RETENTION).await.unwrap();
        let names: Vec<_> = recent.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["5.csv", "4.csv", "3.csv", "2.csv", "1.csv"]);

        assert!(matches!(store.get(ids[0]).await, Err(AppError::NotFound(_))));
        assert!(store.get(ids[1]).await.is_ok());
    }

    #[tokio::test]
    async fn test_listing_strictly_descending() {
        let store = store();
        for i in 0..12 {
            store.insert(format!("{i}.csv"), summary(1)).await.unwrap();
            let recent = store.list_recent(DEFAULT_RETENTION).await.unwrap();
            assert!(recent.len() <= DEFAULT_RETENTION);
            for pair in recent.windows(2) {
                assert!(pair[0].created_at > pair[1].created_at);
            }
        }
    }

    #[tokio::test]
    async fn test_list_limit_is_capped() {
        let store = store();
        for i in 0..3 {
            store.insert(format!("{i}.csv"), summary(1)).await.unwrap();
        }
        assert_eq!(store.list_recent(2).await.unwrap().len(), 2);
        assert_eq!(store.list_recent(50).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_id_not_found() {
        let store = store();
        assert!(matches!(
            store.get(RecordId(42)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_inserts_respect_capacity() {
        let store = Arc::new(store());
        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert(format!("{i}.csv"), summary(1)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let recent = store.list_recent(100).await.unwrap();
        assert_eq!(recent.len(), DEFAULT_RETENTION);
    }

    #[tokio::test]
    async fn test_custom_capacity() {
        let store = RetentionStore::with_capacity(Arc::new(InMemoryRecordBackend::new()), 2);
        for i in 0..4 {
            store.insert(format!("{i}.csv"), summary(1)).await.unwrap();
        }
        assert_eq!(store.list_recent(10).await.unwrap().len(), 2);
    }

    #[test]
    fn test_next_stamp_moves_past_floor() {
        let now = Utc.timestamp_micros(1_000).single().unwrap();
        assert_eq!(next_stamp(now, 5_000).unwrap().timestamp_micros(), 5_001);
        assert_eq!(next_stamp(now, 10).unwrap().timestamp_micros(), 1_000);
        assert_eq!(next_stamp(now, i64::MIN).unwrap().timestamp_micros(), 1_000);
    }
}
