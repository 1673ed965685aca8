mod filter;
mod report_job;
mod report_request;
mod template;

pub use filter::{
    Applicability, DataPoint, Filter, FilterCatalogEntry, FilterKind, ServerDefault, ValueEncoding,
};
pub use report_job::{CreateReportResponse, ReportArtifact, ReportJob, ReportJobStatus};
pub use report_request::{CreateReportPayload, OutputFormat, ReportRequest};
pub use template::TemplateKind;
