pub mod use_cases;

pub use use_cases::retention_store::RetentionStore;
pub use use_cases::upload::UploadUseCase;
