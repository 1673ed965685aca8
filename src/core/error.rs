use std::time::Duration;

use thiserror::Error;

use crate::features::reports::models::TemplateKind;

#[derive(Debug, Error)]
pub enum ReportingError {
    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Unsupported format '{0}': the format can only be json or pdf")]
    UnsupportedFormat(String),

    #[error("Unsupported template {0:?} for this report type")]
    UnsupportedTemplate(TemplateKind),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Report generation failed: {0}")]
    ReportGeneration(String),

    #[error("Transport error: {0}")]
    Transient(#[source] reqwest::Error),

    #[error("Unexpected response from reporting service: {0}")]
    UnexpectedResponse(String),

    #[error("Report {report_id} did not complete within {elapsed:?}")]
    Timeout { report_id: String, elapsed: Duration },

    #[error("Failed to parse report: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportingError {
    /// Whether the call may succeed if issued again unchanged
    pub fn is_transient(&self) -> bool {
        matches!(self, ReportingError::Transient(_) | ReportingError::Timeout { .. })
    }
}

impl From<reqwest::Error> for ReportingError {
    fn from(err: reqwest::Error) -> Self {
        // A request that cannot even be built will never succeed on retry
        if err.is_builder() {
            return ReportingError::Argument(format!("Invalid request: {}", err));
        }
        ReportingError::Transient(err)
    }
}

pub type Result<T> = std::result::Result<T, ReportingError>;
