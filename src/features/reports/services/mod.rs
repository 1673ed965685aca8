mod report_service;

pub use report_service::{ReportLifecycle, ReportService, MULTIPLE_TEAMS_REPORT_NAME};
