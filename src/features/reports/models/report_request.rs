use serde::Serialize;
use std::str::FromStr;

use super::{Filter, TemplateKind};
use crate::core::error::{ReportingError, Result};

/// Artifact format produced by the reporting service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pdf,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Json => "json",
        }
    }

    /// File extension used when the artifact is written to disk
    pub fn extension(self) -> &'static str {
        self.as_str()
    }
}

impl FromStr for OutputFormat {
    type Err = ReportingError;

    /// Case-insensitive, surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(OutputFormat::Pdf),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ReportingError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated report-generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    template: TemplateKind,
    entity_ids: Vec<String>,
    report_name: String,
    output_format: OutputFormat,
    filters: Vec<Filter>,
}

impl ReportRequest {
    pub fn new(
        template: TemplateKind,
        entity_ids: Vec<String>,
        report_name: &str,
        output_format: OutputFormat,
        filters: Vec<Filter>,
    ) -> Result<Self> {
        if entity_ids.is_empty() {
            return Err(ReportingError::Argument(
                "at least one entity id is required".to_string(),
            ));
        }

        if report_name.trim().is_empty() {
            return Err(ReportingError::Argument(
                "report name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            template,
            entity_ids,
            report_name: report_name.to_string(),
            output_format,
            filters,
        })
    }

    pub fn template(&self) -> TemplateKind {
        self.template
    }

    pub fn entity_ids(&self) -> &[String] {
        &self.entity_ids
    }

    pub fn report_name(&self) -> &str {
        &self.report_name
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Body of the create-report call
    pub fn to_payload(&self) -> CreateReportPayload<'_> {
        CreateReportPayload {
            template_id: self.template,
            entity_id: &self.entity_ids,
            report_name: &self.report_name,
            output_format: self.output_format,
            filters: &self.filters,
        }
    }
}

/// Wire shape of the create-report request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportPayload<'a> {
    pub template_id: TemplateKind,
    pub entity_id: &'a [String],
    pub report_name: &'a str,
    pub output_format: OutputFormat,
    pub filters: &'a [Filter],
}
