pub mod equipment;
pub mod error;
pub mod report;
pub mod summary;
pub mod upload_record;
