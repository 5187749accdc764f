use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::summary::Summary;

/// Identifier assigned to a record when it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored summary together with the file it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: RecordId,
    pub filename: String,
    pub summary: Summary,
    pub created_at: DateTime<Utc>,
}

/// Record contents before the backend assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUploadRecord {
    pub filename: String,
    pub summary: Summary,
    pub created_at: DateTime<Utc>,
}

impl NewUploadRecord {
    pub fn into_record(self, id: RecordId) -> UploadRecord {
        UploadRecord {
            id,
            filename: self.filename,
            summary: self.summary,
            created_at: self.created_at,
        }
    }
}
