use std::sync::Arc;
use tracing::{info, warn};

use crate::application::use_cases::report::build_report;
use crate::application::use_cases::retention_store::RetentionStore;
use crate::application::use_cases::summary::summarize;
use crate::domain::error::Result;
use crate::domain::upload_record::{RecordId, UploadRecord};
use crate::infrastructure::csv::CsvParser;
use crate::infrastructure::pdf::PdfReportWriter;

/// The three operations the gateway exposes: submit, list, report.
pub struct UploadUseCase {
    parser: CsvParser,
    store: Arc<RetentionStore>,
    writer: PdfReportWriter,
}

impl UploadUseCase {
    pub fn new(store: Arc<RetentionStore>) -> Self {
        Self {
            parser: CsvParser::new(),
            store,
            writer: PdfReportWriter::default(),
        }
    }

    /// Parse, summarize and store one upload. Nothing is stored on failure.
    pub async fn submit_upload(&self, filename: String, content: &[u8]) -> Result<UploadRecord> {
        let table = self.parser.parse_bytes(content).map_err(|err| {
            warn!(filename = %filename, error = %err, "Rejected upload");
            err
        })?;
        let summary = summarize(&table).map_err(|err| {
            warn!(filename = %filename, error = %err, "Rejected upload");
            err
        })?;
        info!(
            filename = %filename,
            rows = summary.total_count,
            types = summary.type_distribution.len(),
            "Summarized upload"
        );
        self.store.insert(filename, summary).await
    }

    pub async fn list_recent(&self) -> Result<Vec<UploadRecord>> {
        self.store.list_recent(self.store.capacity()).await
    }

    /// Render the stored record as PDF bytes.
    pub async fn get_report(&self, id: RecordId) -> Result<Vec<u8>> {
        let record = self.store.get(id).await?;
        self.render(&record)
    }

    pub fn render(&self, record: &UploadRecord) -> Result<Vec<u8>> {
        self.writer.render(&build_report(record))
    }
}
