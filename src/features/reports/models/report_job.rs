use serde::{Deserialize, Deserializer};

use super::OutputFormat;

/// Report job status as reported by the backend
///
/// Parsing is case-sensitive; anything outside the known vocabulary is kept
/// verbatim in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportJobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Unknown(String),
}

impl ReportJobStatus {
    pub fn from_wire(status: &str) -> Self {
        match status {
            "Queued" => ReportJobStatus::Queued,
            "Processing" => ReportJobStatus::Processing,
            "Completed" => ReportJobStatus::Completed,
            "Failed" => ReportJobStatus::Failed,
            other => ReportJobStatus::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for ReportJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportJobStatus::Queued => write!(f, "Queued"),
            ReportJobStatus::Processing => write!(f, "Processing"),
            ReportJobStatus::Completed => write!(f, "Completed"),
            ReportJobStatus::Failed => write!(f, "Failed"),
            ReportJobStatus::Unknown(other) => write!(f, "{}", other),
        }
    }
}

impl<'de> Deserialize<'de> for ReportJobStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ReportJobStatus::from_wire(&raw))
    }
}

/// Response of the create-report call
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportResponse {
    #[serde(deserialize_with = "report_id_from_any")]
    pub report_id: String,
}

/// Observed state of a report job
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportJob {
    #[serde(default, deserialize_with = "optional_report_id_from_any")]
    pub report_id: Option<String>,
    #[serde(rename = "reportStatus")]
    pub status: ReportJobStatus,
    #[serde(default)]
    pub message: Option<String>,
}

/// Retrieved report artifact
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub report_id: String,
    pub report_name: String,
    pub format: OutputFormat,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl ReportArtifact {
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    /// Readable handle over the artifact body
    pub fn reader(&self) -> std::io::Cursor<&[u8]> {
        std::io::Cursor::new(self.body.as_slice())
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// File name the artifact is saved under
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.report_name, self.format.extension())
    }
}

// The backend sends report ids as numbers; keep them opaque
fn report_id_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected report id as string or number, got {}",
            other
        ))),
    }
}

fn optional_report_id_from_any<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected report id as string or number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_case_sensitive() {
        assert_eq!(
            ReportJobStatus::from_wire("Processing"),
            ReportJobStatus::Processing
        );
        assert_eq!(
            ReportJobStatus::from_wire("processing"),
            ReportJobStatus::Unknown("processing".to_string())
        );
        assert_eq!(ReportJobStatus::from_wire("Failed"), ReportJobStatus::Failed);
    }

    #[test]
    fn test_create_response_accepts_numeric_id() {
        let parsed: CreateReportResponse =
            serde_json::from_str(r#"{"reportId": 42, "links": {}}"#).unwrap();
        assert_eq!(parsed.report_id, "42");

        let parsed: CreateReportResponse =
            serde_json::from_str(r#"{"reportId": "abc"}"#).unwrap();
        assert_eq!(parsed.report_id, "abc");

        assert!(serde_json::from_str::<CreateReportResponse>(r#"{"reportId": null}"#).is_err());
        assert!(serde_json::from_str::<CreateReportResponse>(r#"{}"#).is_err());
    }

    #[test]
    fn test_job_parsing() {
        let job: ReportJob = serde_json::from_str(
            r#"{"reportId": 7, "reportStatus": "Failed", "message": "quota exceeded"}"#,
        )
        .unwrap();
        assert_eq!(job.report_id.as_deref(), Some("7"));
        assert_eq!(job.status, ReportJobStatus::Failed);
        assert_eq!(job.message.as_deref(), Some("quota exceeded"));

        let job: ReportJob = serde_json::from_str(r#"{"reportStatus": "Completed"}"#).unwrap();
        assert_eq!(job.report_id, None);
        assert_eq!(job.message, None);
    }

    #[test]
    fn test_artifact_file_name_and_reader() {
        use std::io::Read;

        let artifact = ReportArtifact {
            report_id: "1".to_string(),
            report_name: "TeamX".to_string(),
            format: OutputFormat::Pdf,
            content_type: Some("application/pdf".to_string()),
            body: b"%PDF-1.7".to_vec(),
        };
        assert_eq!(artifact.file_name(), "TeamX.pdf");

        let mut content = Vec::new();
        artifact.reader().read_to_end(&mut content).unwrap();
        assert_eq!(content, b"%PDF-1.7");
    }
}
