use std::sync::Arc;

use crate::core::config::ReportingConfig;
use crate::core::error::{ReportingError, Result};
use crate::features::identity::IdentityTokenManager;
use crate::features::reports::models::{
    CreateReportResponse, ReportArtifact, ReportJob, ReportRequest,
};

const REPORTS_PATH: &str = "api/reports";

/// Client for the reporting service REST API
pub struct ReportingClient {
    config: ReportingConfig,
    token_manager: Arc<IdentityTokenManager>,
    http_client: reqwest::Client,
}

impl ReportingClient {
    pub fn new(
        config: ReportingConfig,
        token_manager: Arc<IdentityTokenManager>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            config,
            token_manager,
            http_client,
        }
    }

    /// Submit a report for generation, returning the backend report id
    pub async fn create_report(&self, request: &ReportRequest) -> Result<String> {
        let token = self.token_manager.ensure_valid_token().await?;
        let url = self.config.endpoint(REPORTS_PATH);

        tracing::debug!(
            "Creating report '{}' (template {}) at {}",
            request.report_name(),
            request.template().wire_id(),
            url
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&request.to_payload())
            .send()
            .await?;

        let response = self.check_status(response, "create report").await?;

        let created = response.json::<CreateReportResponse>().await.map_err(|e| {
            tracing::error!("Failed to parse create report response: {}", e);
            ReportingError::UnexpectedResponse(format!(
                "create report response carries no report id: {}",
                e
            ))
        })?;

        Ok(created.report_id)
    }

    /// Fetch the current state of a report job
    pub async fn report_status(&self, report_id: &str) -> Result<ReportJob> {
        let token = self.token_manager.ensure_valid_token().await?;
        let url = self.config.endpoint(&format!(
            "{}/{}/status",
            REPORTS_PATH,
            urlencoding::encode(report_id)
        ));

        tracing::debug!("Fetching report status: {}", url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await?;

        let response = self.check_status(response, "report status").await?;

        response.json::<ReportJob>().await.map_err(|e| {
            tracing::error!("Failed to parse report status response: {}", e);
            ReportingError::UnexpectedResponse(format!("invalid report status response: {}", e))
        })
    }

    /// Download the generated artifact of a completed report
    pub async fn fetch_report(
        &self,
        report_id: &str,
        request: &ReportRequest,
    ) -> Result<ReportArtifact> {
        let token = self.token_manager.ensure_valid_token().await?;
        let url = self.config.endpoint(&format!(
            "{}/{}",
            REPORTS_PATH,
            urlencoding::encode(report_id)
        ));

        tracing::debug!("Fetching report artifact: {}", url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await?;

        let response = self.check_status(response, "fetch report").await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response.bytes().await?.to_vec();

        Ok(ReportArtifact {
            report_id: report_id.to_string(),
            report_name: request.report_name().to_string(),
            format: request.output_format(),
            content_type,
            body,
        })
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            // Token was rejected before its assumed expiry
            self.token_manager.invalidate().await;
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!("Reporting API error on {}: HTTP {} - {}", operation, status, body);

        Err(ReportingError::UnexpectedResponse(format!(
            "{} failed: HTTP {} - {}",
            operation, status, body
        )))
    }
}
