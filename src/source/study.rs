//! Study metadata and the actuals fetch rules
//!
//! Parameters and time series only exist once a study has started, so they
//! are handed to the engine for known `ACTIVE` and `COMPLETED` studies only.
//! Latest snapshots are used whenever their table is present, even when the
//! study itself is unknown to the platform.

use crate::actuals::{CountryId, LatestActualsSnapshot, ParameterRecord, TimeseriesPoint};
use crate::calendar::CalendarDate;
use crate::error::ActualsError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle status of a platform study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudyStatus {
    Planned,
    Active,
    Completed,
    Cancelled,
}

impl StudyStatus {
    /// Whether parameter and time-series actuals are meaningful
    pub fn has_actuals(&self) -> bool {
        matches!(self, StudyStatus::Active | StudyStatus::Completed)
    }
}

impl FromStr for StudyStatus {
    type Err = ActualsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "PLANNED" => Ok(StudyStatus::Planned),
            "ACTIVE" => Ok(StudyStatus::Active),
            "COMPLETED" => Ok(StudyStatus::Completed),
            "CANCELLED" => Ok(StudyStatus::Cancelled),
            other => Err(ActualsError::UnknownStudyStatus(other.to_string())),
        }
    }
}

/// A platform study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyRecord {
    pub study_id: String,
    pub status: StudyStatus,
    /// First-patient date
    pub fp: Option<CalendarDate>,
}

/// A country planned for a study (planned_study_country joined to country)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedCountry {
    pub study_id: String,
    pub country_id: CountryId,
    pub country_name: String,
    pub region_id: Option<u32>,
    pub region_name: Option<String>,
    pub patient_allocation: Option<f64>,
    pub num_sites: Option<f64>,
    pub fsiv: Option<f64>,
    pub fpfv: Option<f64>,
    pub lpft: Option<f64>,
}

/// A platform region with the number of countries it contains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub region_id: u32,
    pub region_name: String,
    pub country_count: u32,
}

impl RegionRecord {
    pub fn has_single_country(&self) -> bool {
        self.country_count == 1
    }
}

/// Actuals tables of one study as exported; `None` means the table is absent
#[derive(Debug, Clone, Default)]
pub struct ActualsTables {
    pub parameters: Option<Vec<ParameterRecord>>,
    pub timeseries: Option<Vec<TimeseriesPoint>>,
    pub snapshots: Option<Vec<LatestActualsSnapshot>>,
}

/// Everything the engine needs for a study or cohort
#[derive(Debug, Clone, Default)]
pub struct ActualsBundle {
    pub parameters: Vec<ParameterRecord>,
    pub timeseries: Vec<TimeseriesPoint>,
    pub snapshots: Vec<LatestActualsSnapshot>,
    pub fp: Option<CalendarDate>,
}

impl ActualsBundle {
    /// Study-wide actuals.
    ///
    /// Parameters and time series require a known, started study and both
    /// tables; snapshots need a country and a parseable date to be kept.
    pub fn for_study(study_id: &str, study: Option<&StudyRecord>, tables: &ActualsTables) -> Self {
        let mut bundle = Self {
            fp: study.and_then(|s| s.fp),
            ..Default::default()
        };

        if let Some((parameters, timeseries)) = started_study_tables(study_id, study, tables) {
            bundle.parameters = parameters.to_vec();
            bundle.timeseries = timeseries.to_vec();
        }

        if let Some(snapshots) = &tables.snapshots {
            bundle.snapshots = snapshots
                .iter()
                .filter(|s| s.country_id.is_some() && s.latest_date().is_some())
                .cloned()
                .collect();
            let dropped = snapshots.len() - bundle.snapshots.len();
            if dropped > 0 {
                warn!(
                    "study {}: dropped {} latest-actuals rows without country or valid date",
                    study_id, dropped
                );
            }
        }

        bundle
    }

    /// Actuals of one cohort across the given countries. Snapshots are
    /// study-level and never apply to a cohort.
    pub fn for_cohort(
        study_id: &str,
        study: Option<&StudyRecord>,
        tables: &ActualsTables,
        country_ids: &[CountryId],
        cohort_name: &str,
    ) -> Self {
        let mut bundle = Self {
            fp: study.and_then(|s| s.fp),
            ..Default::default()
        };

        if let Some((parameters, timeseries)) = started_study_tables(study_id, study, tables) {
            let in_cohort = |country_id: CountryId, cohort: &Option<String>| {
                country_ids.contains(&country_id) && cohort.as_deref() == Some(cohort_name)
            };
            bundle.parameters = parameters
                .iter()
                .filter(|p| in_cohort(p.country_id, &p.cohort_name))
                .cloned()
                .collect();
            bundle.timeseries = timeseries
                .iter()
                .filter(|t| in_cohort(t.country_id, &t.cohort_name))
                .cloned()
                .collect();
        }

        bundle
    }

    /// The study's first-patient date, else the scenario's own
    pub fn reference_date(&self, fallback: Option<CalendarDate>) -> Option<CalendarDate> {
        self.fp.or(fallback)
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.timeseries.is_empty() && self.snapshots.is_empty()
    }

    /// Date of the earliest `ACTUALS` point
    pub fn earliest_actual_date(&self) -> Option<CalendarDate> {
        self.timeseries
            .iter()
            .filter(|point| point.point_type.is_actual())
            .map(|point| point.date)
            .min()
    }

    /// Actuals were recorded before the study's own first-patient date
    pub fn has_early_actuals(&self) -> bool {
        match (self.fp, self.earliest_actual_date()) {
            (Some(fp), Some(earliest)) => fp > earliest,
            _ => false,
        }
    }
}

fn started_study_tables<'t>(
    study_id: &str,
    study: Option<&StudyRecord>,
    tables: &'t ActualsTables,
) -> Option<(&'t [ParameterRecord], &'t [TimeseriesPoint])> {
    let Some(study) = study else {
        debug!("study {} unknown to the platform, no parameter/timeseries actuals", study_id);
        return None;
    };
    if !study.status.has_actuals() {
        debug!("study {} is {:?}, no parameter/timeseries actuals", study_id, study.status);
        return None;
    }
    match (&tables.parameters, &tables.timeseries) {
        (Some(parameters), Some(timeseries)) => Some((parameters.as_slice(), timeseries.as_slice())),
        _ => {
            warn!("study {}: parameter or timeseries actuals table missing", study_id);
            None
        }
    }
}
