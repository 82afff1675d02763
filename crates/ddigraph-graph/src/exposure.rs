//! Drug exposure records.

use crate::dates::{resolve_bound, DateBound};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A required field was absent; the record cannot take part in the graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MissingDataError {
    #[error("exposure record has no report id")]
    ReportId,
    #[error("exposure record in report {report_id} has no drug name")]
    DrugName { report_id: String },
}

/// One drug administered within one report, with a closed date interval.
///
/// Both bounds are always concrete: absent bounds hold `NaiveDate::MIN` /
/// `NaiveDate::MAX`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugExposure {
    pub report_id: String,
    pub drug_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DrugExposure {
    pub fn new(
        report_id: impl Into<String>,
        drug_name: impl Into<String>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            report_id: report_id.into(),
            drug_name: drug_name.into(),
            start_date: start_date.unwrap_or(DateBound::Start.sentinel()),
            end_date: end_date.unwrap_or(DateBound::End.sentinel()),
        }
    }

    /// Closed-interval intersection test.
    pub fn overlaps(&self, other: &DrugExposure) -> bool {
        self.start_date <= other.end_date && self.end_date >= other.start_date
    }

    pub fn is_open_ended(&self) -> bool {
        self.end_date == DateBound::End.sentinel()
    }
}

/// Exposure row as read from the event store, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExposure {
    pub report_id: Option<String>,
    pub drug_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// A validated exposure plus the number of its date bounds that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedExposure {
    pub exposure: DrugExposure,
    pub unparsed_dates: u32,
}

impl RawExposure {
    pub fn new(
        report_id: impl Into<String>,
        drug_name: impl Into<String>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Self {
        Self {
            report_id: Some(report_id.into()),
            drug_name: Some(drug_name.into()),
            start_date: start_date.map(str::to_string),
            end_date: end_date.map(str::to_string),
        }
    }

    /// Validate required fields and resolve both date bounds.
    pub fn normalize(&self) -> Result<NormalizedExposure, MissingDataError> {
        let report_id = non_blank(self.report_id.as_deref()).ok_or(MissingDataError::ReportId)?;
        let drug_name =
            non_blank(self.drug_name.as_deref()).ok_or_else(|| MissingDataError::DrugName {
                report_id: report_id.to_string(),
            })?;

        let (start_date, start_failed) = resolve_bound(self.start_date.as_deref(), DateBound::Start);
        let (end_date, end_failed) = resolve_bound(self.end_date.as_deref(), DateBound::End);

        Ok(NormalizedExposure {
            exposure: DrugExposure {
                report_id: report_id.to_string(),
                drug_name: drug_name.to_string(),
                start_date,
                end_date,
            },
            unparsed_dates: start_failed as u32 + end_failed as u32,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_fills_sentinels() {
        let raw = RawExposure::new("R1", "DrugX", Some("20210601"), None);
        let normalized = raw.normalize().unwrap();
        assert_eq!(normalized.unparsed_dates, 0);
        assert!(normalized.exposure.is_open_ended());
        assert_eq!(
            normalized.exposure.start_date,
            NaiveDate::from_ymd_opt(2021, 6, 1).unwrap()
        );
    }

    #[test]
    fn test_normalize_counts_unparsed_dates() {
        let raw = RawExposure::new("R1", "DrugX", Some("soon"), Some("later"));
        let normalized = raw.normalize().unwrap();
        assert_eq!(normalized.unparsed_dates, 2);
        assert_eq!(normalized.exposure.start_date, NaiveDate::MIN);
        assert_eq!(normalized.exposure.end_date, NaiveDate::MAX);
    }

    #[test]
    fn test_normalize_trims_names() {
        let raw = RawExposure::new(" R1 ", " ASPIRIN ", None, None);
        let exposure = raw.normalize().unwrap().exposure;
        assert_eq!(exposure.report_id, "R1");
        assert_eq!(exposure.drug_name, "ASPIRIN");
    }

    #[test]
    fn test_missing_fields() {
        let no_drug = RawExposure {
            report_id: Some("R9".into()),
            drug_name: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(
            no_drug.normalize().unwrap_err(),
            MissingDataError::DrugName {
                report_id: "R9".into()
            }
        );
        assert_eq!(
            RawExposure::default().normalize().unwrap_err(),
            MissingDataError::ReportId
        );
    }

    #[test]
    fn test_overlap_is_closed_interval() {
        let d = |s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
        let a = DrugExposure::new("R", "A", d("2020-01-01"), d("2020-01-31"));
        let b = DrugExposure::new("R", "B", d("2020-01-31"), d("2020-02-15"));
        let c = DrugExposure::new("R", "C", d("2020-02-01"), d("2020-02-15"));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }
}
