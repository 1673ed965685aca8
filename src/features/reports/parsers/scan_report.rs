//! JSON scan report parsing
//!
//! Extracts resolved findings from a JSON report produced by the
//! vulnerability-oriented scan template. Each finding carries the
//! `(scan id, path id)` pair encoded in its viewer hyperlink, which is the
//! key of the external results feed.

use serde::Deserialize;

use crate::core::error::{ReportingError, Result};
use crate::features::reports::models::ReportArtifact;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanJsonReport {
    #[serde(default)]
    pub resolved_vulnerabilities: Option<VulnerabilitySection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilitySection {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub vulnerabilities_list: Vec<VulnerabilityGroup>,
}

/// All findings of one query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityGroup {
    #[serde(default)]
    pub vulnerability_type: String,
    #[serde(default)]
    pub query_path: String,
    #[serde(default)]
    pub query_version: Option<i64>,
    #[serde(default)]
    pub results: Vec<ResultGroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultGroup {
    #[serde(default)]
    pub resolved: Vec<ResolvedResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedResult {
    pub hyperlink: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub first_detection: Option<String>,
    #[serde(default)]
    pub resolved_date: Option<String>,
    #[serde(default)]
    pub time_to_resolve: Option<i64>,
}

/// Flattened resolved finding, ready to be joined with per-path results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFinding {
    pub vulnerability_type: String,
    pub query_path: String,
    pub query_version: Option<i64>,
    pub hyperlink: ResultHyperlink,
    pub level: Option<String>,
    pub first_detection: Option<String>,
    pub resolved_date: Option<String>,
    pub time_to_resolve: Option<i64>,
}

/// Viewer link of a single result path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultHyperlink {
    pub url: String,
    pub scan_id: i64,
    pub path_id: i64,
}

impl ResultHyperlink {
    /// Parse `...?scanid=1000006&projectid=2&pathid=1`
    ///
    /// Parameters are looked up by name; links without names fall back to
    /// the first and third query parameters.
    pub fn parse(url: &str) -> Result<Self> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| ReportingError::Parse(format!("invalid hyperlink '{}': {}", url, e)))?;

        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.to_lowercase(), v.into_owned()))
            .collect();

        let named = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };
        let positional = |index: usize| pairs.get(index).map(|(_, v)| v.as_str());

        let scan_id = named("scanid").or_else(|| positional(0));
        let path_id = named("pathid").or_else(|| positional(2));

        match (scan_id, path_id) {
            (Some(scan_id), Some(path_id)) => Ok(Self {
                url: url.to_string(),
                scan_id: parse_number(url, "scan id", scan_id)?,
                path_id: parse_number(url, "path id", path_id)?,
            }),
            _ => Err(ReportingError::Parse(format!(
                "hyperlink '{}' carries no scan id and path id",
                url
            ))),
        }
    }
}

fn parse_number(url: &str, what: &str, raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| {
        ReportingError::Parse(format!("hyperlink '{}' has invalid {} '{}'", url, what, raw))
    })
}

impl ScanJsonReport {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| ReportingError::Parse(format!("invalid JSON report: {}", e)))
    }

    pub fn from_artifact(artifact: &ReportArtifact) -> Result<Self> {
        Self::from_slice(artifact.bytes())
    }

    pub fn resolved_total(&self) -> u64 {
        self.resolved_vulnerabilities
            .as_ref()
            .map(|section| section.total)
            .unwrap_or(0)
    }

    /// Every resolved result of the report, one entry per path
    pub fn resolved_findings(&self) -> Result<Vec<ResolvedFinding>> {
        let Some(section) = &self.resolved_vulnerabilities else {
            return Ok(Vec::new());
        };

        let mut findings = Vec::new();
        for group in &section.vulnerabilities_list {
            for result in group.results.iter().flat_map(|r| &r.resolved) {
                findings.push(ResolvedFinding {
                    vulnerability_type: group.vulnerability_type.clone(),
                    query_path: group.query_path.clone(),
                    query_version: group.query_version,
                    hyperlink: ResultHyperlink::parse(&result.hyperlink)?,
                    level: result.level.clone(),
                    first_detection: result.first_detection.clone(),
                    resolved_date: result.resolved_date.clone(),
                    time_to_resolve: result.time_to_resolve,
                });
            }
        }

        Ok(findings)
    }
}
