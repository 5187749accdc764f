use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::RecordBackend;
use crate::domain::error::{AppError, Result};
use crate::domain::upload_record::{NewUploadRecord, RecordId, UploadRecord};

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    records: BTreeMap<RecordId, UploadRecord>,
}

/// Map-backed store used in tests and for throwaway runs.
#[derive(Default)]
pub struct InMemoryRecordBackend {
    state: Mutex<MemoryState>,
}

impl InMemoryRecordBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("Record store lock poisoned".to_string()))
    }
}

fn newest_first(records: &BTreeMap<RecordId, UploadRecord>) -> Vec<&UploadRecord> {
    let mut ordered: Vec<&UploadRecord> = records.values().collect();
    ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    ordered
}

#[async_trait]
impl RecordBackend for InMemoryRecordBackend {
    async fn insert_retaining(
        &self,
        record: NewUploadRecord,
        keep: usize,
    ) -> Result<(UploadRecord, u64)> {
        let mut state = self.lock()?;

        state.next_id += 1;
        let id = RecordId(state.next_id);
        if state.records.contains_key(&id) {
            return Err(AppError::Internal(format!("Record id collision: {}", id)));
        }
        let stored = record.into_record(id);
        state.records.insert(id, stored.clone());

        let evict: Vec<RecordId> = newest_first(&state.records)
            .into_iter()
            .skip(keep)
            .map(|r| r.id)
            .collect();
        for id in &evict {
            state.records.remove(id);
        }

        Ok((stored, evict.len() as u64))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<UploadRecord>> {
        let state = self.lock()?;
        Ok(newest_first(&state.records)
            .into_iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get(&self, id: RecordId) -> Result<UploadRecord> {
        let state = self.lock()?;
        state
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Upload record not found: {}", id)))
    }
}
