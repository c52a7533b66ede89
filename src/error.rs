//! Error types for gdb2xlsx
//!
//! This module defines the error hierarchy for:
//! - Archive extraction and packaging
//! - Layer reading and spreadsheet writing
//! - The conversion pipeline that ties them together
//! - Configuration and the HTTP server
//!
//! Library code returns these thiserror types; the binary wraps them in
//! anyhow with context.

use std::path::PathBuf;
use thiserror::Error;

/// Zip extraction, container lookup and result packaging errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The zip crate rejected the archive
    #[error("Invalid or corrupt zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An entry would be written outside the destination directory
    #[error("Archive entry '{entry}' escapes the extraction directory")]
    UnsafePath { entry: String },

    /// Directory traversal failed
    #[error("Failed to walk extracted files: {0}")]
    Walk(#[from] walkdir::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Layer reading and spreadsheet writing errors
#[derive(Error, Debug)]
pub enum LayerError {
    /// The container could not be opened as a vector dataset
    #[error("Failed to open container '{path}': {reason}")]
    Open { path: PathBuf, reason: String },

    /// A layer could not be read
    #[error("Failed to read layer '{layer}': {reason}")]
    Read { layer: String, reason: String },

    /// Spreadsheet writer error
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while running one conversion
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Layer(#[from] LayerError),

    /// A blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// True when the failure was caused by the uploaded archive itself
    /// rather than by the server.
    pub fn is_bad_input(&self) -> bool {
        matches!(
            self,
            PipelineError::Archive(ArchiveError::Zip(_))
                | PipelineError::Archive(ArchiveError::UnsafePath { .. })
        )
    }
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Bind address and port do not form a socket address
    #[error("Invalid bind address '{address}': {reason}")]
    InvalidBindAddress { address: String, reason: String },

    /// Upload limit out of range
    #[error("Invalid upload limit {mb} MB: must be between 1 and {max}")]
    InvalidUploadLimit { mb: usize, max: usize },

    /// Work directory missing or not a directory
    #[error("Invalid work directory '{path}': {reason}")]
    InvalidWorkDir { path: PathBuf, reason: String },

    /// Input archive missing
    #[error("Invalid input '{path}': {reason}")]
    InvalidInput { path: PathBuf, reason: String },
}

/// HTTP server errors
#[derive(Error, Debug)]
pub enum ServerError {
    /// A required multipart field was not sent
    #[error("Missing form field '{0}'")]
    MissingField(&'static str),

    /// The multipart body could not be parsed
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    /// Conversion failed
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// HTTP status this error is reported with
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            ServerError::MissingField(_) => StatusCode::BAD_REQUEST,
            ServerError::Multipart(e) => e.status(),
            ServerError::Pipeline(e) if e.is_bad_input() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.status_code();
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for ArchiveError
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

/// Result type alias for LayerError
pub type LayerResult<T> = std::result::Result<T, LayerError>;

/// Result type alias for ServerError
pub type ServerResult<T> = std::result::Result<T, ServerError>;
