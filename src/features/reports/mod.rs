pub mod clients;
pub mod models;
pub mod parsers;
pub mod services;

pub use clients::ReportingClient;
pub use parsers::{ResolvedFinding, ResultHyperlink, ScanJsonReport};
pub use services::{ReportLifecycle, ReportService};
