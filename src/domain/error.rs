use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    /// A required CSV column is absent; carries the column name.
    SchemaError(String),
    /// The CSV has a valid header but no data rows.
    EmptyInput,
    ParseError(String),
    ValidationError(String),
    /// An upload over the configured size limit.
    TooLarge(String),
    Unauthorized(String),
    DatabaseError(String),
    ConfigError(String),
    IoError(String),
}

impl AppError {
    /// True for failures caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::SchemaError(_)
                | AppError::EmptyInput
                | AppError::ParseError(_)
                | AppError::ValidationError(_)
                | AppError::TooLarge(_)
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::SchemaError(column) => write!(f, "Missing required column: {}", column),
            AppError::EmptyInput => write!(f, "The CSV file is empty."),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::TooLarge(msg) => write!(f, "Upload too large: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
