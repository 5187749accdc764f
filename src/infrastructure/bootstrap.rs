use std::sync::Arc;

use actix_web::web;
use tracing::{error, info, warn};

use crate::application::{RetentionStore, UploadUseCase};
use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::{RecordBackend, SqliteRecordBackend};
use crate::infrastructure::security::credentials::CredentialStore;
use crate::infrastructure::storage::resolve_data_dir;
use crate::interfaces::http::{add_log, HttpState, LogBuffer};

/// Prepare storage and wire the use case and gateway state from `config`.
pub async fn bootstrap(config: &AppConfig) -> Result<web::Data<HttpState>> {
    let logs = Arc::new(LogBuffer::new(config.logging.buffer_capacity));

    let data_dir = resolve_data_dir(&config.storage.data_dir).map_err(|err| {
        error!(
            error = %err,
            data_dir = %config.storage.data_dir.display(),
            "Failed to create data dir"
        );
        err
    })?;

    let backend = SqliteRecordBackend::connect(&data_dir.join(&config.storage.database_file)).await?;
    let backend: Arc<dyn RecordBackend + Send + Sync> = Arc::new(backend);

    let store = Arc::new(RetentionStore::with_capacity(
        backend,
        config.retention.capacity,
    ));
    let upload_use_case = Arc::new(UploadUseCase::new(store));

    let credentials = Arc::new(CredentialStore::new(&config.auth.users));
    if credentials.is_empty() {
        warn!("No auth users configured; every API request will be rejected");
    }

    add_log(
        &logs,
        "INFO",
        "System",
        &format!(
            "Backend initialized (retention={}, database={})",
            config.retention.capacity,
            config.database_path().display()
        ),
    );
    info!(users = config.auth.users.len(), "Gateway credentials loaded");

    Ok(web::Data::new(HttpState {
        upload_use_case,
        credentials,
        logs,
        max_upload_bytes: config.server.max_upload_bytes,
    }))
}
