//! FILENAME: app/report-session/src/error.rs

use report_engine::ReportError;
use thiserror::Error;

use crate::sink::SinkError;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Save form is missing required fields (listed by name).
    #[error("Missing required fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Column state store error: {0}")]
    Store(String),

    #[error("Report sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Report engine error: {0}")]
    Engine(#[from] ReportError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
