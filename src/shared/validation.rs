use crate::core::error::{ReportingError, Result};

/// Entity ids are non-negative integers on the wire, sent as strings
pub fn entity_id(field: &str, id: i64) -> Result<String> {
    if id < 0 {
        return Err(ReportingError::Argument(format!(
            "{} must be zero or positive, got {}",
            field, id
        )));
    }
    Ok(id.to_string())
}

pub fn entity_ids(field: &str, ids: &[i64]) -> Result<Vec<String>> {
    if ids.is_empty() {
        return Err(ReportingError::Argument(format!(
            "{} must contain at least one id",
            field
        )));
    }
    ids.iter().map(|id| entity_id(field, *id)).collect()
}

pub fn report_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ReportingError::Argument(
            "report name must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id() {
        assert_eq!(entity_id("scan_id", 0).unwrap(), "0");
        assert_eq!(entity_id("scan_id", 1001335).unwrap(), "1001335");
        assert!(matches!(
            entity_id("scan_id", -1),
            Err(ReportingError::Argument(_))
        ));
    }

    #[test]
    fn test_entity_ids() {
        assert_eq!(entity_ids("project_ids", &[1, 2]).unwrap(), vec!["1", "2"]);
        assert!(entity_ids("project_ids", &[]).is_err());
        assert!(entity_ids("project_ids", &[1, -2]).is_err());
    }

    #[test]
    fn test_report_name() {
        assert!(report_name("nightly").is_ok());
        assert!(report_name("").is_err());
        assert!(report_name(" \t").is_err());
    }
}
