pub mod report;
pub mod retention_store;
pub mod summary;
pub mod upload;
