use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::TemplateKind;
use crate::core::error::{ReportingError, Result};

/// Kind of constraint applied during report generation, serialized as its wire id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum FilterKind {
    Severity,
    ResultState,
    Query,
    TimeFrame,
    ResultStatus,
    NumberOfResults,
    DataPointOrder,
    Projects,
    CustomFields,
}

/// Which value list a filter kind is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueEncoding {
    Included,
    Excluded,
}

/// What the server applies when a filter kind is omitted from the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerDefault {
    Nothing,
    Excludes(&'static [&'static str]),
    Includes(&'static [&'static str]),
}

/// Templates a filter kind is honoured by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    AllTemplates,
    ScanTemplates,
    AllButScanTemplates,
    TeamTemplates,
    TeamAndApplicationTemplates,
}

impl Applicability {
    pub fn includes(self, template: TemplateKind) -> bool {
        match self {
            Applicability::AllTemplates => true,
            Applicability::ScanTemplates => template.is_scan(),
            Applicability::AllButScanTemplates => !template.is_scan(),
            Applicability::TeamTemplates => template.is_team(),
            Applicability::TeamAndApplicationTemplates => {
                template.is_team() || template == TemplateKind::Application
            }
        }
    }
}

/// Catalog description of one filter kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterCatalogEntry {
    pub kind: FilterKind,
    pub encoding: ValueEncoding,
    pub default: ServerDefault,
    pub applicability: Applicability,
}

impl FilterCatalogEntry {
    pub fn applies_to(&self, template: TemplateKind) -> bool {
        self.applicability.includes(template)
    }
}

impl FilterKind {
    pub const ALL: [FilterKind; 9] = [
        FilterKind::Severity,
        FilterKind::ResultState,
        FilterKind::Query,
        FilterKind::TimeFrame,
        FilterKind::ResultStatus,
        FilterKind::NumberOfResults,
        FilterKind::DataPointOrder,
        FilterKind::Projects,
        FilterKind::CustomFields,
    ];

    pub fn wire_id(self) -> i32 {
        match self {
            FilterKind::Severity => 1,
            FilterKind::ResultState => 2,
            FilterKind::Query => 3,
            FilterKind::TimeFrame => 4,
            FilterKind::ResultStatus => 5,
            FilterKind::NumberOfResults => 6,
            FilterKind::DataPointOrder => 7,
            FilterKind::Projects => 8,
            FilterKind::CustomFields => 9,
        }
    }

    pub fn from_wire_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.wire_id() == id)
    }

    pub fn catalog_entry(self) -> FilterCatalogEntry {
        use Applicability::*;
        use ServerDefault::*;
        use ValueEncoding::*;

        let (encoding, default, applicability) = match self {
            FilterKind::Severity => (Excluded, Excludes(&["Information", "Low"]), AllTemplates),
            FilterKind::ResultState => (Excluded, Nothing, AllTemplates),
            FilterKind::Query => (Excluded, Nothing, ScanTemplates),
            FilterKind::TimeFrame => (Included, Nothing, AllButScanTemplates),
            FilterKind::ResultStatus => (Excluded, Excludes(&["Resolved"]), AllTemplates),
            FilterKind::NumberOfResults => (Included, Includes(&["5000"]), ScanTemplates),
            FilterKind::DataPointOrder => (Included, Includes(&["last"]), AllButScanTemplates),
            FilterKind::Projects => (Excluded, Nothing, TeamTemplates),
            FilterKind::CustomFields => (Included, Nothing, TeamAndApplicationTemplates),
        };

        FilterCatalogEntry {
            kind: self,
            encoding,
            default,
            applicability,
        }
    }
}

impl From<FilterKind> for i32 {
    fn from(kind: FilterKind) -> Self {
        kind.wire_id()
    }
}

impl TryFrom<i32> for FilterKind {
    type Error = String;

    fn try_from(id: i32) -> std::result::Result<Self, Self::Error> {
        Self::from_wire_id(id).ok_or_else(|| format!("unknown filter type {}", id))
    }
}

/// Data point used by trend templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPoint {
    First,
    Last,
}

impl DataPoint {
    pub fn as_str(self) -> &'static str {
        match self {
            DataPoint::First => "first",
            DataPoint::Last => "last",
        }
    }
}

/// One constraint applied during report generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(rename = "type")]
    pub kind: FilterKind,
    #[serde(default)]
    pub included_values: Vec<String>,
    #[serde(default)]
    pub excluded_values: Vec<String>,
}

impl Filter {
    pub fn including<I, S>(kind: FilterKind, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            included_values: values.into_iter().map(Into::into).collect(),
            excluded_values: Vec::new(),
        }
    }

    pub fn excluding<I, S>(kind: FilterKind, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            included_values: Vec::new(),
            excluded_values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Date range filter; both ends are inclusive
    pub fn timeframe(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ReportingError::Argument(format!(
                "timeframe start {} is after end {}",
                start, end
            )));
        }

        Ok(Self::including(
            FilterKind::TimeFrame,
            [
                start.format("%Y-%m-%d").to_string(),
                end.format("%Y-%m-%d").to_string(),
            ],
        ))
    }

    /// Limit of results printed in the scan results section
    pub fn results_limit(limit: u32) -> Self {
        Self::including(FilterKind::NumberOfResults, [limit.to_string()])
    }

    pub fn data_point(point: DataPoint) -> Self {
        Self::including(FilterKind::DataPointOrder, [point.as_str()])
    }

    pub fn custom_field(name: &str, value: &str) -> Self {
        Self::including(FilterKind::CustomFields, [name, value])
    }

    /// Whether the values sit in the list the catalog expects for this kind
    pub fn matches_encoding(&self) -> bool {
        match self.kind.catalog_entry().encoding {
            ValueEncoding::Included => self.excluded_values.is_empty(),
            ValueEncoding::Excluded => self.included_values.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_timeframe_renders_iso_dates() {
        let filter = Filter::timeframe(date(2021, 1, 1), date(2021, 11, 16)).unwrap();
        assert_eq!(filter.kind, FilterKind::TimeFrame);
        assert_eq!(filter.included_values, vec!["2021-01-01", "2021-11-16"]);
        assert!(filter.excluded_values.is_empty());
    }

    #[test]
    fn test_timeframe_single_day_is_allowed() {
        assert!(Filter::timeframe(date(2021, 5, 5), date(2021, 5, 5)).is_ok());
    }

    #[test]
    fn test_timeframe_rejects_reversed_range() {
        let result = Filter::timeframe(date(2021, 11, 16), date(2021, 1, 1));
        assert!(matches!(result, Err(ReportingError::Argument(_))));
    }

    #[test]
    fn test_wire_shape() {
        let filter = Filter::excluding(FilterKind::Severity, ["Information", "Low"]);
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": 1,
                "includedValues": [],
                "excludedValues": ["Information", "Low"]
            })
        );
    }

    #[test]
    fn test_helper_factories() {
        assert_eq!(Filter::results_limit(100).included_values, vec!["100"]);
        assert_eq!(
            Filter::data_point(DataPoint::First).included_values,
            vec!["first"]
        );
        assert_eq!(
            Filter::custom_field("Version", "1").included_values,
            vec!["Version", "1"]
        );
    }

    #[test]
    fn test_catalog_defaults() {
        assert_eq!(
            FilterKind::Severity.catalog_entry().default,
            ServerDefault::Excludes(&["Information", "Low"])
        );
        assert_eq!(
            FilterKind::ResultStatus.catalog_entry().default,
            ServerDefault::Excludes(&["Resolved"])
        );
        assert_eq!(
            FilterKind::ResultState.catalog_entry().default,
            ServerDefault::Nothing
        );
        assert_eq!(
            FilterKind::NumberOfResults.catalog_entry().default,
            ServerDefault::Includes(&["5000"])
        );
        assert_eq!(
            FilterKind::DataPointOrder.catalog_entry().default,
            ServerDefault::Includes(&["last"])
        );
    }

    #[test]
    fn test_catalog_applicability() {
        let query = FilterKind::Query.catalog_entry();
        assert!(query.applies_to(TemplateKind::ScanVulnerabilityOriented));
        assert!(!query.applies_to(TemplateKind::ProjectTemplate));

        let timeframe = FilterKind::TimeFrame.catalog_entry();
        assert!(!timeframe.applies_to(TemplateKind::ScanResultStateOriented));
        assert!(timeframe.applies_to(TemplateKind::Executive));

        let custom = FilterKind::CustomFields.catalog_entry();
        assert!(custom.applies_to(TemplateKind::Application));
        assert!(custom.applies_to(TemplateKind::SingleTeamTemplate));
        assert!(!custom.applies_to(TemplateKind::ProjectTemplate));
    }

    #[test]
    fn test_matches_encoding() {
        assert!(Filter::excluding(FilterKind::ResultStatus, ["New"]).matches_encoding());
        assert!(!Filter::including(FilterKind::Severity, ["High"]).matches_encoding());
        assert!(Filter::results_limit(10).matches_encoding());
    }
}
