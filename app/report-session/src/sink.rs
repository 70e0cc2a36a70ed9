//! FILENAME: app/report-session/src/sink.rs
//! Destination for saved report definitions.

use report_engine::ReportDefinition;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Report rejected: {0}")]
    Rejected(String),
}

pub trait ReportSink {
    /// Accepts one definition. Called once per save; never retried.
    fn submit(&mut self, definition: &ReportDefinition) -> Result<(), SinkError>;
}

/// Keeps every submission in memory, optionally refusing them.
#[derive(Debug, Default)]
pub struct MemorySink {
    submitted: Vec<ReportDefinition>,
    reject_with: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    /// A sink that rejects every submission with `reason`.
    pub fn rejecting(reason: &str) -> Self {
        MemorySink {
            submitted: Vec::new(),
            reject_with: Some(reason.to_string()),
        }
    }

    pub fn submitted(&self) -> &[ReportDefinition] {
        &self.submitted
    }
}

impl ReportSink for MemorySink {
    fn submit(&mut self, definition: &ReportDefinition) -> Result<(), SinkError> {
        if let Some(reason) = &self.reject_with {
            return Err(SinkError::Rejected(reason.clone()));
        }
        self.submitted.push(definition.clone());
        Ok(())
    }
}
