use std::sync::Arc;

use crate::core::config::{Config, ReportingConfig};
use crate::core::error::{ReportingError, Result};
use crate::features::identity::IdentityTokenManager;
use crate::features::reports::clients::ReportingClient;
use crate::features::reports::models::{
    Filter, OutputFormat, ReportArtifact, ReportJobStatus, ReportRequest, TemplateKind,
};
use crate::shared::time::{to_chrono, Clock, Sleeper, SystemClock, TokioSleeper};
use crate::shared::validation;

/// Report name used when several teams are reported on without an explicit name
pub const MULTIPLE_TEAMS_REPORT_NAME: &str = "MultipleTeams";

/// Lifecycle of a single report request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLifecycle {
    Submitting,
    Polling { report_id: String, checks: u32 },
    Completed { report_id: String },
    Failed { report_id: String, message: String },
}

/// Requests reports from the reporting service and waits for their artifacts
///
/// Every call regenerates the report server-side. Calls are independent and
/// may run concurrently; they share only the cached bearer token.
pub struct ReportService {
    config: ReportingConfig,
    client: Arc<ReportingClient>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
}

impl ReportService {
    pub fn new(config: Config) -> Self {
        Self::with_time(config, Arc::new(SystemClock), Arc::new(TokioSleeper))
    }

    /// Build the service with an explicit time source and sleep
    pub fn with_time(config: Config, clock: Arc<dyn Clock>, sleeper: Arc<dyn Sleeper>) -> Self {
        let http_client = reqwest::Client::new();

        let token_manager = Arc::new(
            IdentityTokenManager::new(config.identity, http_client.clone())
                .with_clock(Arc::clone(&clock)),
        );

        let client = Arc::new(ReportingClient::new(
            config.reporting.clone(),
            token_manager,
            http_client,
        ));

        Self {
            config: config.reporting,
            client,
            clock,
            sleeper,
        }
    }

    /// Report on a single scan using one of the two scan templates
    pub async fn get_scan_report(
        &self,
        scan_id: i64,
        report_name: &str,
        format: &str,
        template: TemplateKind,
        filters: Vec<Filter>,
    ) -> Result<ReportArtifact> {
        let entity_id = validation::entity_id("scan_id", scan_id)?;
        validation::report_name(report_name)?;
        let format = format.parse::<OutputFormat>()?;

        if !template.is_scan() {
            return Err(ReportingError::UnsupportedTemplate(template));
        }

        let request = ReportRequest::new(template, vec![entity_id], report_name, format, filters)?;
        self.request(request).await
    }

    pub async fn get_project_report(
        &self,
        project_id: i64,
        report_name: &str,
        format: &str,
        filters: Vec<Filter>,
    ) -> Result<ReportArtifact> {
        let entity_id = validation::entity_id("project_id", project_id)?;
        validation::report_name(report_name)?;
        let format = format.parse::<OutputFormat>()?;

        let request = ReportRequest::new(
            TemplateKind::ProjectTemplate,
            vec![entity_id],
            report_name,
            format,
            filters,
        )?;
        self.request(request).await
    }

    pub async fn get_application_report(
        &self,
        project_ids: &[i64],
        report_name: &str,
        format: &str,
        filters: Vec<Filter>,
    ) -> Result<ReportArtifact> {
        let entity_ids = validation::entity_ids("project_ids", project_ids)?;
        validation::report_name(report_name)?;
        let format = format.parse::<OutputFormat>()?;

        let request = ReportRequest::new(
            TemplateKind::Application,
            entity_ids,
            report_name,
            format,
            filters,
        )?;
        self.request(request).await
    }

    /// Report on one team or several teams, identified by their full names
    ///
    /// Without an explicit name the report is named after the single team's
    /// last path segment, or `MultipleTeams`.
    pub async fn get_team_report<S: AsRef<str>>(
        &self,
        team_full_names: &[S],
        report_name: Option<&str>,
        format: &str,
        filters: Vec<Filter>,
    ) -> Result<ReportArtifact> {
        let request = team_report_request(team_full_names, report_name, format, filters)?;
        self.request(request).await
    }

    /// Submit any report request and wait for its artifact
    pub async fn request(&self, request: ReportRequest) -> Result<ReportArtifact> {
        if self.config.strict_filters {
            check_filters(&request)?;
        }

        self.run(&request).await
    }

    async fn run(&self, request: &ReportRequest) -> Result<ReportArtifact> {
        let mut state = ReportLifecycle::Submitting;
        let mut polling_since = None;

        loop {
            state = match state {
                ReportLifecycle::Submitting => {
                    let report_id = self.client.create_report(request).await?;
                    tracing::info!(
                        "Submitted report '{}' as {} (template {:?}, format {})",
                        request.report_name(),
                        report_id,
                        request.template(),
                        request.output_format()
                    );
                    polling_since = Some(self.clock.now());
                    ReportLifecycle::Polling {
                        report_id,
                        checks: 0,
                    }
                }
                ReportLifecycle::Polling { report_id, checks } => {
                    let job = self.client.report_status(&report_id).await?;
                    let checks = checks + 1;

                    match job.status {
                        ReportJobStatus::Processing => {
                            self.check_deadline(&report_id, polling_since)?;
                            tracing::debug!(
                                "Report {} still processing after {} checks",
                                report_id,
                                checks
                            );
                            self.sleeper.sleep(self.config.polling_interval).await;
                            ReportLifecycle::Polling { report_id, checks }
                        }
                        ReportJobStatus::Failed => ReportLifecycle::Failed {
                            report_id,
                            message: job.message.unwrap_or_default(),
                        },
                        ReportJobStatus::Completed => ReportLifecycle::Completed { report_id },
                        ReportJobStatus::Queued => {
                            tracing::warn!(
                                "Report {} is still queued, fetching it as if completed",
                                report_id
                            );
                            ReportLifecycle::Completed { report_id }
                        }
                        other => {
                            tracing::warn!(
                                "Report {} reached unrecognised status '{}', treating it as completed",
                                report_id,
                                other
                            );
                            ReportLifecycle::Completed { report_id }
                        }
                    }
                }
                ReportLifecycle::Completed { report_id } => {
                    let artifact = self.client.fetch_report(&report_id, request).await?;
                    tracing::info!(
                        "Report {} completed ({} bytes)",
                        report_id,
                        artifact.len()
                    );
                    return Ok(artifact);
                }
                ReportLifecycle::Failed { report_id, message } => {
                    tracing::error!("Report {} failed: {}", report_id, message);
                    return Err(ReportingError::ReportGeneration(message));
                }
            };
        }
    }

    /// Fail when another poll interval would run past the configured timeout
    fn check_deadline(
        &self,
        report_id: &str,
        polling_since: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<()> {
        let (Some(timeout), Some(since)) = (self.config.poll_timeout, polling_since) else {
            return Ok(());
        };

        let elapsed = self.clock.now() - since;
        let next_check = elapsed.checked_add(&to_chrono(self.config.polling_interval));
        if next_check.map_or(true, |next| next > to_chrono(timeout)) {
            return Err(ReportingError::Timeout {
                report_id: report_id.to_string(),
                elapsed: elapsed.to_std().unwrap_or_default(),
            });
        }

        Ok(())
    }
}

fn team_report_request<S: AsRef<str>>(
    team_full_names: &[S],
    report_name: Option<&str>,
    format: &str,
    filters: Vec<Filter>,
) -> Result<ReportRequest> {
    let (template, derived_name) = match team_full_names {
        [] => {
            return Err(ReportingError::Argument(
                "team_full_names must contain at least one team".to_string(),
            ))
        }
        [single] => (
            TemplateKind::SingleTeamTemplate,
            team_leaf_name(single.as_ref()).to_string(),
        ),
        _ => (
            TemplateKind::MultiTeamsTemplate,
            MULTIPLE_TEAMS_REPORT_NAME.to_string(),
        ),
    };

    let report_name = match report_name {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => derived_name,
    };
    validation::report_name(&report_name)?;
    let format = format.parse::<OutputFormat>()?;

    let entity_ids = team_full_names
        .iter()
        .map(|team| team.as_ref().to_string())
        .collect();

    ReportRequest::new(template, entity_ids, &report_name, format, filters)
}

/// Last segment of a team full name such as `/CxServer/SP/TeamX`
fn team_leaf_name(full_name: &str) -> &str {
    full_name.rsplit('/').next().unwrap_or(full_name)
}

fn check_filters(request: &ReportRequest) -> Result<()> {
    for filter in request.filters() {
        let entry = filter.kind.catalog_entry();

        if !entry.applies_to(request.template()) {
            return Err(ReportingError::Argument(format!(
                "filter {:?} does not apply to template {:?}",
                filter.kind,
                request.template()
            )));
        }

        if !filter.matches_encoding() {
            return Err(ReportingError::Argument(format!(
                "filter {:?} must be built from {:?} values",
                filter.kind, entry.encoding
            )));
        }
    }

    Ok(())
}
