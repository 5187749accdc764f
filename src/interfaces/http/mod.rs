pub mod auth;

use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{dev::Server, get, post, web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use chrono::{DateTime, Local, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use validator::Validate;

use crate::application::UploadUseCase;
use crate::domain::error::{AppError, Result};
use crate::domain::upload_record::{RecordId, UploadRecord};
use crate::infrastructure::response::{attachment_disposition, clean_upload_filename};
use crate::infrastructure::security::credentials::CredentialStore;
use auth::{authenticate, CredentialPolicy};

/// Multipart part that carries the CSV.
const FILE_FIELD: &str = "file";
const NO_FILE_PROVIDED: &str = "No file provided";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

/// Most recent log lines, served at `/api/logs`.
pub struct LogBuffer {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }
}

pub struct HttpState {
    pub upload_use_case: Arc<UploadUseCase>,
    pub credentials: Arc<CredentialStore>,
    pub logs: Arc<LogBuffer>,
    pub max_upload_bytes: usize,
}

/// One stored upload as returned by `/api/upload/` and `/api/history/`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecordView {
    pub id: RecordId,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub total_count: u64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    pub type_distribution: BTreeMap<String, u64>,
}

impl From<&UploadRecord> for RecordView {
    fn from(record: &UploadRecord) -> Self {
        Self {
            id: record.id,
            filename: record.filename.clone(),
            created_at: record.created_at,
            total_count: record.summary.total_count,
            avg_flowrate: record.summary.avg_flowrate,
            avg_pressure: record.summary.avg_pressure,
            avg_temperature: record.summary.avg_temperature,
            type_distribution: record.summary.type_distribution.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// The `file` part of an upload, read fully into memory.
#[derive(Debug, Validate)]
pub struct UploadedFile {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    pub content: Vec<u8>,
}

fn multipart_error(err: actix_multipart::MultipartError) -> AppError {
    AppError::ValidationError(format!("Malformed multipart body: {}", err))
}

/// Reads the first `file` part, skipping any other fields.
///
/// Returns `Ok(None)` when the body has no `file` part.
async fn read_file_part(payload: &mut Multipart, limit: usize) -> Result<Option<UploadedFile>> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(multipart_error)?;

        let disposition = field.content_disposition();
        let is_file = disposition.and_then(|cd| cd.get_name()) == Some(FILE_FIELD);
        let filename = disposition
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();

        if !is_file {
            while let Some(chunk) = field.next().await {
                chunk.map_err(multipart_error)?;
            }
            continue;
        }

        let mut content = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(multipart_error)?;
            if content.len() + chunk.len() > limit {
                return Err(AppError::TooLarge(format!(
                    "file exceeds {} bytes",
                    limit
                )));
            }
            content.extend_from_slice(&chunk);
        }
        return Ok(Some(UploadedFile { filename, content }));
    }
    Ok(None)
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error body; server-side failures are not echoed to the caller.
fn error_response(err: &AppError) -> HttpResponse {
    let status = status_for(err);
    let message = match err {
        AppError::NotFound(_) => "Record not found".to_string(),
        AppError::Unauthorized(_) => "Unauthorized".to_string(),
        e if e.is_client_error() => e.to_string(),
        _ => "Internal server error".to_string(),
    };
    HttpResponse::build(status).json(ErrorBody { error: message })
}

fn require_user(
    data: &HttpState,
    req: &HttpRequest,
    policy: CredentialPolicy,
) -> std::result::Result<String, HttpResponse> {
    authenticate(req, &data.credentials, policy).map_err(|err| {
        add_log(
            &data.logs,
            "WARN",
            "Auth",
            &format!("Rejected {} {}: {}", req.method(), req.path(), err),
        );
        error_response(&err)
    })
}

#[post("/upload/")]
async fn upload(
    data: web::Data<HttpState>,
    req: HttpRequest,
    mut payload: Multipart,
) -> impl Responder {
    if let Err(resp) = require_user(&data, &req, CredentialPolicy::HeaderOnly) {
        return resp;
    }

    let file = match read_file_part(&mut payload, data.max_upload_bytes).await {
        Ok(Some(file)) => file,
        Ok(None) => {
            add_log(&data.logs, "WARN", "HttpApi", "Upload without a file part");
            return HttpResponse::BadRequest().json(ErrorBody {
                error: NO_FILE_PROVIDED.to_string(),
            });
        }
        Err(e) => {
            add_log(&data.logs, "WARN", "HttpApi", &format!("Upload failed: {}", e));
            return error_response(&e);
        }
    };

    if let Err(e) = file.validate() {
        return error_response(&AppError::ValidationError(format!("filename: {}", e)));
    }
    let Some(filename) = clean_upload_filename(&file.filename) else {
        return error_response(&AppError::ValidationError(
            "filename has no usable characters".to_string(),
        ));
    };

    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Upload received: {} ({} bytes)", filename, file.content.len()),
    );

    match data.upload_use_case.submit_upload(filename, &file.content).await {
        Ok(record) => {
            add_log(
                &data.logs,
                "INFO",
                "HttpApi",
                &format!(
                    "Stored record {} ({} rows)",
                    record.id, record.summary.total_count
                ),
            );
            HttpResponse::Created().json(RecordView::from(&record))
        }
        Err(e) => {
            let level = if e.is_client_error() { "WARN" } else { "ERROR" };
            add_log(&data.logs, level, "HttpApi", &format!("Upload failed: {}", e));
            error_response(&e)
        }
    }
}

#[get("/history/")]
async fn history(data: web::Data<HttpState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_user(&data, &req, CredentialPolicy::HeaderOnly) {
        return resp;
    }

    match data.upload_use_case.list_recent().await {
        Ok(records) => {
            let views: Vec<RecordView> = records.iter().map(RecordView::from).collect();
            HttpResponse::Ok().json(views)
        }
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("Failed to list history: {}", e),
            );
            error_response(&e)
        }
    }
}

#[get("/report/{id}/")]
async fn report(
    data: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_user(&data, &req, CredentialPolicy::HeaderOrQuery) {
        return resp;
    }

    let raw_id = path.into_inner();
    let Ok(id) = raw_id.parse::<i64>().map(RecordId) else {
        return error_response(&AppError::NotFound(format!(
            "Invalid record id: {}",
            raw_id
        )));
    };

    match data.upload_use_case.get_report(id).await {
        Ok(pdf) => {
            add_log(
                &data.logs,
                "INFO",
                "HttpApi",
                &format!("Rendered report for record {} ({} bytes)", id, pdf.len()),
            );
            HttpResponse::Ok()
                .content_type("application/pdf")
                .insert_header((
                    "Content-Disposition",
                    attachment_disposition(&format!("report_{}.pdf", id)),
                ))
                .body(pdf)
        }
        Err(e) => {
            let level = if matches!(e, AppError::NotFound(_)) { "WARN" } else { "ERROR" };
            add_log(&data.logs, level, "HttpApi", &format!("Report failed: {}", e));
            error_response(&e)
        }
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_user(&data, &req, CredentialPolicy::HeaderOnly) {
        return resp;
    }
    HttpResponse::Ok().json(data.logs.snapshot())
}

pub fn add_log_entry(logs: &LogBuffer, level: &str, source: &str, message: &str) -> LogEntry {
    match level {
        "ERROR" => tracing::error!(source, "{}", message),
        "WARN" => tracing::warn!(source, "{}", message),
        _ => tracing::info!(source, "{}", message),
    }

    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    if let Ok(mut entries) = logs.entries.lock() {
        entries.push_back(entry.clone());
        while entries.len() > logs.capacity {
            entries.pop_front();
        }
    }
    entry
}

pub fn add_log(logs: &LogBuffer, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

/// Routes under `/api`, shared by the server and tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(upload)
            .service(history)
            .service(report)
            .service(get_logs),
    );
}

pub fn start_server(state: web::Data<HttpState>, host: &str, port: u16) -> std::io::Result<Server> {
    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Desktop and browser clients on other origins

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run();

    Ok(server)
}
