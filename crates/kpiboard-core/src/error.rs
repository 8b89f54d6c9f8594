//! Error types for kpiboard core.

use thiserror::Error;

/// Errors raised by the sheet builder and the relay actions.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sheet '{0}' does not exist")]
    SheetMissing(String),

    #[error("Sheets missing; run setup_api first")]
    NotSetUp,

    #[error("Sheet '{0}' already exists")]
    SheetExists(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Missing '{0}' parameter")]
    MissingParam(&'static str),

    #[error("Action '{0}' is not valid")]
    UnknownAction(String),

    #[error("Invalid request body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Write to {cell} failed: {message}")]
    Write { cell: String, message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
