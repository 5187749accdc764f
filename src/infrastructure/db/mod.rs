pub mod memory;
pub mod sqlite;

use crate::domain::error::Result;
use crate::domain::upload_record::{NewUploadRecord, RecordId, UploadRecord};
use async_trait::async_trait;

pub use memory::InMemoryRecordBackend;
pub use sqlite::SqliteRecordBackend;

/// Persistence for upload records.
///
/// Ordering everywhere is `created_at` descending, ties broken by id descending.
#[async_trait]
pub trait RecordBackend {
    /// Store `record`, then delete everything outside the `keep` newest records,
    /// as one atomic step. Returns the stored record and the number evicted.
    async fn insert_retaining(
        &self,
        record: NewUploadRecord,
        keep: usize,
    ) -> Result<(UploadRecord, u64)>;

    async fn list_recent(&self, limit: usize) -> Result<Vec<UploadRecord>>;

    /// Fails with `AppError::NotFound` for unknown ids.
    async fn get(&self, id: RecordId) -> Result<UploadRecord>;
}
