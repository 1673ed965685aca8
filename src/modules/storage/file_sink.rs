//! Local file storage for report artifacts
//!
//! Writes each artifact as `<report name>.<format>` inside a target
//! directory and returns the absolute path of the written file.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::error::{ReportingError, Result};
use crate::features::reports::models::ReportArtifact;

/// Directory-backed artifact sink
#[derive(Debug, Clone)]
pub struct FileSink {
    directory: PathBuf,
}

impl FileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Persist the artifact, overwriting any previous file of the same name
    pub async fn save(&self, artifact: &ReportArtifact) -> Result<PathBuf> {
        let file_name = artifact.file_name();

        if file_name.contains(['/', '\\']) {
            return Err(ReportingError::Argument(format!(
                "report name '{}' cannot be used as a file name",
                artifact.report_name
            )));
        }

        tokio::fs::create_dir_all(&self.directory).await?;

        let path = self.directory.join(&file_name);
        debug!("Writing report {} to {}", artifact.report_id, path.display());
        tokio::fs::write(&path, artifact.bytes()).await?;

        let path = tokio::fs::canonicalize(&path).await?;
        info!(
            "Saved report {} ({} bytes) to {}",
            artifact.report_id,
            artifact.len(),
            path.display()
        );

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reports::models::OutputFormat;

    fn artifact(name: &str) -> ReportArtifact {
        ReportArtifact {
            report_id: "5".to_string(),
            report_name: name.to_string(),
            format: OutputFormat::Json,
            content_type: Some("application/json".to_string()),
            body: br#"{"reportId": 5}"#.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_save_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("nested"));

        let path = sink.save(&artifact("1001335")).await.unwrap();

        assert!(path.is_absolute());
        assert!(path.ends_with("nested/1001335.json"));
        assert_eq!(
            tokio::fs::read(&path).await.unwrap(),
            br#"{"reportId": 5}"#.to_vec()
        );
    }

    #[tokio::test]
    async fn test_save_rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());
        assert!(matches!(
            sink.save(&artifact("../escape")).await,
            Err(ReportingError::Argument(_))
        ));
    }
}
