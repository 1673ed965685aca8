//! Client for a vulnerability-scanning platform's reporting service
//!
//! Authenticates with a password grant, submits report-generation requests,
//! polls the report job until it is terminal and returns the artifact.

pub mod core;
pub mod features;
pub mod modules;
pub mod shared;

pub use crate::core::config::{Config, IdentityConfig, ReportingConfig};
pub use crate::core::error::{ReportingError, Result};
pub use features::identity::IdentityTokenManager;
pub use features::reports::models::{
    DataPoint, Filter, FilterKind, OutputFormat, ReportArtifact, ReportJob, ReportJobStatus,
    ReportRequest, TemplateKind,
};
pub use features::reports::{
    ReportLifecycle, ReportService, ReportingClient, ResolvedFinding, ResultHyperlink,
    ScanJsonReport,
};
pub use modules::storage::FileSink;
pub use shared::time::{Clock, Sleeper, SystemClock, TokioSleeper};
