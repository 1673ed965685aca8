use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use reporting_client::{
    Config, DataPoint, FileSink, Filter, FilterKind, OutputFormat, ReportArtifact, ReportService,
    ScanJsonReport, TemplateKind,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Generate reports through the reporting service and save them locally
#[derive(Debug, Parser)]
#[command(name = "reporting-client", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    filters: FilterArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report on a single scan
    Scan {
        #[arg(long)]
        scan_id: i64,
        #[arg(long)]
        name: String,
        #[arg(long, value_enum, default_value_t = ScanTemplate::VulnerabilityOriented)]
        template: ScanTemplate,
        /// Print resolved findings when the report is JSON
        #[arg(long)]
        list_resolved: bool,
    },
    /// Report on a project
    Project {
        #[arg(long)]
        project_id: i64,
        #[arg(long)]
        name: String,
    },
    /// Report on an application made of several projects
    Application {
        #[arg(long = "project-id", required = true, num_args = 1..)]
        project_ids: Vec<i64>,
        #[arg(long)]
        name: String,
    },
    /// Report on one or more teams by full name
    Team {
        #[arg(long = "team", required = true, num_args = 1..)]
        teams: Vec<String>,
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScanTemplate {
    VulnerabilityOriented,
    ResultStateOriented,
}

impl From<ScanTemplate> for TemplateKind {
    fn from(template: ScanTemplate) -> Self {
        match template {
            ScanTemplate::VulnerabilityOriented => TemplateKind::ScanVulnerabilityOriented,
            ScanTemplate::ResultStateOriented => TemplateKind::ScanResultStateOriented,
        }
    }
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// pdf or json
    #[arg(long, global = true, default_value = "pdf")]
    format: String,

    /// Directory the report is written to
    #[arg(long, global = true, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Severities to exclude, e.g. Information Low
    #[arg(long, global = true, num_args = 0..)]
    exclude_severity: Option<Vec<String>>,

    /// Result states to exclude, e.g. "Not Exploitable"
    #[arg(long, global = true, num_args = 0..)]
    exclude_state: Option<Vec<String>>,

    /// Result statuses to exclude, e.g. Resolved
    #[arg(long, global = true, num_args = 0..)]
    exclude_status: Option<Vec<String>>,

    /// Queries to exclude, e.g. SQL_Injection
    #[arg(long, global = true, num_args = 1..)]
    exclude_query: Option<Vec<String>>,

    /// Limit of results in the scan results section
    #[arg(long, global = true)]
    results_limit: Option<u32>,

    /// Start of the time frame (YYYY-MM-DD)
    #[arg(long, global = true, requires = "to")]
    from: Option<NaiveDate>,

    /// End of the time frame (YYYY-MM-DD)
    #[arg(long, global = true, requires = "from")]
    to: Option<NaiveDate>,

    /// Use the first or last scan as data point
    #[arg(long, global = true, value_parser = ["first", "last"])]
    data_point: Option<String>,
}

impl FilterArgs {
    fn build(&self) -> anyhow::Result<Vec<Filter>> {
        let mut filters = Vec::new();

        let excluded = [
            (FilterKind::Severity, &self.exclude_severity),
            (FilterKind::ResultState, &self.exclude_state),
            (FilterKind::ResultStatus, &self.exclude_status),
            (FilterKind::Query, &self.exclude_query),
        ];
        for (kind, values) in excluded {
            if let Some(values) = values {
                filters.push(Filter::excluding(kind, values.iter().cloned()));
            }
        }

        if let Some(limit) = self.results_limit {
            filters.push(Filter::results_limit(limit));
        }

        if let (Some(from), Some(to)) = (self.from, self.to) {
            filters.push(Filter::timeframe(from, to)?);
        }

        match self.data_point.as_deref() {
            Some("first") => filters.push(Filter::data_point(DataPoint::First)),
            Some("last") => filters.push(Filter::data_point(DataPoint::Last)),
            _ => {}
        }

        Ok(filters)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        "Configuration loaded (server: {}, polling every {:?})",
        config.reporting.server_url,
        config.reporting.polling_interval
    );

    let service = ReportService::new(config);
    let filters = cli.filters.build()?;
    let format = cli.output.format.as_str();

    let (artifact, list_resolved) = match cli.command {
        Command::Scan {
            scan_id,
            name,
            template,
            list_resolved,
        } => (
            service
                .get_scan_report(scan_id, &name, format, template.into(), filters)
                .await?,
            list_resolved,
        ),
        Command::Project { project_id, name } => (
            service
                .get_project_report(project_id, &name, format, filters)
                .await?,
            false,
        ),
        Command::Application { project_ids, name } => (
            service
                .get_application_report(&project_ids, &name, format, filters)
                .await?,
            false,
        ),
        Command::Team { teams, name } => (
            service
                .get_team_report(teams.as_slice(), name.as_deref(), format, filters)
                .await?,
            false,
        ),
    };

    if list_resolved {
        print_resolved(&artifact)?;
    }

    let path = FileSink::new(cli.output.out_dir.clone()).save(&artifact).await?;
    println!("{}", path.display());

    Ok(())
}

fn print_resolved(artifact: &ReportArtifact) -> anyhow::Result<()> {
    if artifact.format != OutputFormat::Json {
        tracing::warn!("Resolved findings can only be listed for JSON reports");
        return Ok(());
    }

    let report = ScanJsonReport::from_artifact(artifact)?;
    let findings = report.resolved_findings()?;
    tracing::info!("Report lists {} resolved findings", findings.len());

    for finding in findings {
        println!(
            "{},{},{},{},{}",
            finding.vulnerability_type,
            finding.hyperlink.scan_id,
            finding.hyperlink.path_id,
            finding.level.unwrap_or_default(),
            finding.resolved_date.unwrap_or_default()
        );
    }

    Ok(())
}
