//! Reconciliation output structures

use super::records::{CountryId, PointType};
use crate::calendar::CalendarDate;
use serde::{Deserialize, Serialize};

/// One day of a dense series: `[date, value, type]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesEntry(pub CalendarDate, pub Option<f64>, pub PointType);

impl SeriesEntry {
    pub fn date(&self) -> CalendarDate {
        self.0
    }

    pub fn value(&self) -> Option<f64> {
        self.1
    }

    pub fn point_type(&self) -> &PointType {
        &self.2
    }
}

/// Milestone dates and rates projected from the parameter record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterActuals {
    pub actual_fsiv: Option<CalendarDate>,
    pub actual_25_si: Option<CalendarDate>,
    pub actual_50_si: Option<CalendarDate>,
    pub actual_90_si: Option<CalendarDate>,
    pub actual_sas: Option<f64>,
    pub actual_fpfv_lpfv: Option<f64>,
    pub actual_randomization_rate: Option<f64>,
    pub actual_screening_failure: Option<f64>,
    pub actual_screening_rate: Option<f64>,
    pub actual_f_lpft: Option<f64>,
    pub actual_overallocation: Option<f64>,
    pub original_f_lpft: Option<f64>,
}

/// Dense day-by-day series plus the values of the last actual day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesActuals {
    // Last ACTUALS day seen in the window
    pub actual_date: Option<CalendarDate>,
    pub actual_num_sites: Option<f64>,
    pub actual_sites_enrolling: Option<f64>,
    pub actual_patient_allocation: Option<f64>,

    // One entry per window day
    pub actual_siv: Vec<SeriesEntry>,
    pub actual_screened: Vec<SeriesEntry>,
    pub actual_randomized: Vec<SeriesEntry>,
    pub q75_actual_randomized: Vec<SeriesEntry>,
    pub q25_actual_randomized: Vec<SeriesEntry>,
}

impl SeriesActuals {
    pub fn with_capacity(days: usize) -> Self {
        Self {
            actual_siv: Vec::with_capacity(days),
            actual_screened: Vec::with_capacity(days),
            actual_randomized: Vec::with_capacity(days),
            q75_actual_randomized: Vec::with_capacity(days),
            q25_actual_randomized: Vec::with_capacity(days),
            ..Default::default()
        }
    }

    /// All five series, labelled with their output field names
    pub fn named_series(&self) -> [(&'static str, &[SeriesEntry]); 5] {
        [
            ("actual_siv", &self.actual_siv),
            ("actual_screened", &self.actual_screened),
            ("actual_randomized", &self.actual_randomized),
            ("q75_actual_randomized", &self.q75_actual_randomized),
            ("q25_actual_randomized", &self.q25_actual_randomized),
        ]
    }
}

/// Reconciled actuals for one country
///
/// Either section is absent (not null) in serialized output when the
/// corresponding input was missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualsResult {
    pub country_id: CountryId,

    #[serde(flatten)]
    pub parameters: Option<ParameterActuals>,

    #[serde(flatten)]
    pub series: Option<SeriesActuals>,
}

impl ActualsResult {
    pub fn new(country_id: CountryId) -> Self {
        Self {
            country_id,
            parameters: None,
            series: None,
        }
    }

    /// Whether neither section was produced
    pub fn is_empty(&self) -> bool {
        self.parameters.is_none() && self.series.is_none()
    }

    /// Last day with an `ACTUALS` entry, if series were produced
    pub fn last_actual_date(&self) -> Option<CalendarDate> {
        self.series.as_ref().and_then(|s| s.actual_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> CalendarDate {
        CalendarDate::parse(s).unwrap()
    }

    #[test]
    fn test_series_entry_serializes_as_triple() {
        let entry = SeriesEntry(date("2024-01-15"), Some(45.0), PointType::Actuals);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"["2024-01-15",45.0,"ACTUALS"]"#);

        let empty = SeriesEntry(date("2024-01-16"), None, PointType::Forecast);
        assert_eq!(serde_json::to_string(&empty).unwrap(), r#"["2024-01-16",null,"FORECAST"]"#);
    }

    #[test]
    fn test_missing_sections_are_omitted() {
        let result = ActualsResult::new(7);
        let value = serde_json::to_value(&result).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object["country_id"], 7);
        assert!(result.is_empty());
    }

    #[test]
    fn test_scalar_section_keeps_nulls() {
        let result = ActualsResult {
            country_id: 7,
            parameters: Some(ParameterActuals {
                actual_fsiv: Some(date("2024-01-11")),
                ..Default::default()
            }),
            series: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["actual_fsiv"], "2024-01-11");
        assert!(value["actual_25_si"].is_null());
        assert!(value.get("actual_siv").is_none());
    }
}
