//! Input records as fetched from the platform actuals tables

use crate::calendar::CalendarDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform country identifier
pub type CountryId = u32;

/// Provenance of a time-series point
///
/// Anything other than `ACTUALS` counts as non-actual; unrecognised labels
/// are kept verbatim so they round-trip into the output series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PointType {
    /// Observed enrollment data
    Actuals,
    /// Predicted enrollment data
    Forecast,
    Other(String),
}

impl PointType {
    pub fn is_actual(&self) -> bool {
        matches!(self, PointType::Actuals)
    }

    pub fn as_str(&self) -> &str {
        match self {
            PointType::Actuals => "ACTUALS",
            PointType::Forecast => "FORECAST",
            PointType::Other(label) => label,
        }
    }
}

impl From<&str> for PointType {
    fn from(label: &str) -> Self {
        match label {
            "ACTUALS" => PointType::Actuals,
            "FORECAST" => PointType::Forecast,
            other => PointType::Other(other.to_string()),
        }
    }
}

impl From<String> for PointType {
    fn from(label: String) -> Self {
        PointType::from(label.as_str())
    }
}

impl From<PointType> for String {
    fn from(point_type: PointType) -> Self {
        point_type.as_str().to_string()
    }
}

impl fmt::Display for PointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-country actual parameters (study_country_parameter_actuals)
///
/// The four milestone fields are day offsets from the study's first-patient
/// date; the rest are copied through as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub country_id: CountryId,

    /// Cohort the row belongs to, when actuals are tracked per cohort
    #[serde(default)]
    pub cohort_name: Option<String>,

    /// First patient to first site initiation visit, in days
    #[serde(default)]
    pub fp_fsiv: Option<i64>,
    /// Days until 25% of sites initiated
    #[serde(default)]
    pub si_25: Option<i64>,
    /// Days until 50% of sites initiated
    #[serde(default)]
    pub si_50: Option<i64>,
    /// Days until 90% of sites initiated
    #[serde(default)]
    pub si_90: Option<i64>,

    #[serde(default)]
    pub sas: Option<f64>,
    #[serde(default)]
    pub fpfv_lpfv: Option<f64>,
    #[serde(default)]
    pub randomization_rate: Option<f64>,
    #[serde(default)]
    pub screening_failure: Option<f64>,
    #[serde(default)]
    pub screening_rate: Option<f64>,
    #[serde(default)]
    pub f_lpft: Option<f64>,
    #[serde(default)]
    pub overallocation: Option<f64>,
    #[serde(default)]
    pub original_f_lpft: Option<f64>,
}

/// One (country, date) row of study_country_timeseries_actuals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesPoint {
    pub country_id: CountryId,
    pub date: CalendarDate,
    #[serde(rename = "type")]
    pub point_type: PointType,
    pub sites_initiated: Option<f64>,
    pub patients_screened: Option<f64>,
    pub patients_randomized: Option<f64>,
    pub q75_patients_randomized: Option<f64>,
    pub q25_patients_randomized: Option<f64>,
    pub sites_enrolling: Option<f64>,
    pub cohort_name: Option<String>,
}

impl TimeseriesPoint {
    /// An `ACTUALS` point with the three tracked counts and nothing else set
    pub fn actual(
        country_id: CountryId,
        date: CalendarDate,
        sites_initiated: f64,
        patients_screened: f64,
        patients_randomized: f64,
    ) -> Self {
        Self {
            country_id,
            date,
            point_type: PointType::Actuals,
            sites_initiated: Some(sites_initiated),
            patients_screened: Some(patients_screened),
            patients_randomized: Some(patients_randomized),
            q75_patients_randomized: None,
            q25_patients_randomized: None,
            sites_enrolling: None,
            cohort_name: None,
        }
    }

    /// A `FORECAST` point with quartile bands around the randomized count
    pub fn forecast(
        country_id: CountryId,
        date: CalendarDate,
        sites_initiated: f64,
        patients_screened: f64,
        patients_randomized: f64,
        q25: f64,
        q75: f64,
    ) -> Self {
        Self {
            country_id,
            date,
            point_type: PointType::Forecast,
            sites_initiated: Some(sites_initiated),
            patients_screened: Some(patients_screened),
            patients_randomized: Some(patients_randomized),
            q75_patients_randomized: Some(q75),
            q25_patients_randomized: Some(q25),
            sites_enrolling: None,
            cohort_name: None,
        }
    }
}

/// Most recently known actual state of a country (study_country_latest_actuals)
///
/// `latest_date` stays raw because the upstream table may hold values that
/// do not parse; those snapshots are ignored rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestActualsSnapshot {
    pub country_id: Option<CountryId>,
    pub study_id: Option<String>,
    pub latest_date: Option<String>,
    pub sites_initiated: Option<f64>,
    pub patients_screened: Option<f64>,
    pub patients_randomized: Option<f64>,
    pub sites_enrolling: Option<f64>,
}

impl LatestActualsSnapshot {
    /// Parsed `latest_date`, `None` if missing or malformed
    pub fn latest_date(&self) -> Option<CalendarDate> {
        self.latest_date
            .as_deref()
            .and_then(|raw| CalendarDate::parse(raw).ok())
    }
}
