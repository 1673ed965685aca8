mod scan_report;

pub use scan_report::{
    ResolvedFinding, ResolvedResult, ResultGroup, ResultHyperlink, ScanJsonReport,
    VulnerabilityGroup, VulnerabilitySection,
};
