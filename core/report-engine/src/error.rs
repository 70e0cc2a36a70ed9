//! FILENAME: core/report-engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Malformed filter value for '{field}': {reason}")]
    Decode { field: String, reason: String },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field '{field}' is not a {expected} field")]
    KindMismatch { field: String, expected: &'static str },

    #[error("Unknown aggregation operator: {0}")]
    UnknownOperator(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
