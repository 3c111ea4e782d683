//! Load platform tables from CSV exports
//!
//! Every table is keyed by `study_id`; loaders return the rows of one study.
//! A missing actuals file is reported as `None` rather than an error, the
//! same way the platform treats a table that was never created.

use super::config::SourceConfig;
use super::study::{ActualsBundle, ActualsTables, PlannedCountry, RegionRecord, StudyRecord, StudyStatus};
use crate::actuals::{CountryId, LatestActualsSnapshot, ParameterRecord, PointType, TimeseriesPoint};
use crate::calendar::CalendarDate;
use crate::error::Result;
use csv::Reader;
use log::{info, warn};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;

/// Raw row of studies.csv
#[derive(Debug, serde::Deserialize)]
struct StudyRow {
    study_id: String,
    status: String,
    fp: Option<String>,
}

impl StudyRow {
    fn to_study(self) -> Result<StudyRecord> {
        let status: StudyStatus = self.status.parse()?;
        let fp = match self.fp.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(CalendarDate::parse(raw)?),
        };
        Ok(StudyRecord {
            study_id: self.study_id,
            status,
            fp,
        })
    }
}

/// Raw row of study_country_parameter_actuals.csv
#[derive(Debug, serde::Deserialize)]
struct ParameterRow {
    study_id: String,
    country_id: CountryId,
    cohort_name: Option<String>,
    fp_fsiv: Option<i64>,
    si_25: Option<i64>,
    si_50: Option<i64>,
    si_90: Option<i64>,
    sas: Option<f64>,
    fpfv_lpfv: Option<f64>,
    randomization_rate: Option<f64>,
    screening_failure: Option<f64>,
    screening_rate: Option<f64>,
    f_lpft: Option<f64>,
    overallocation: Option<f64>,
    original_f_lpft: Option<f64>,
}

impl ParameterRow {
    fn to_record(self) -> ParameterRecord {
        ParameterRecord {
            country_id: self.country_id,
            cohort_name: self.cohort_name.filter(|name| !name.is_empty()),
            fp_fsiv: self.fp_fsiv,
            si_25: self.si_25,
            si_50: self.si_50,
            si_90: self.si_90,
            sas: self.sas,
            fpfv_lpfv: self.fpfv_lpfv,
            randomization_rate: self.randomization_rate,
            screening_failure: self.screening_failure,
            screening_rate: self.screening_rate,
            f_lpft: self.f_lpft,
            overallocation: self.overallocation,
            original_f_lpft: self.original_f_lpft,
        }
    }
}

/// Raw row of study_country_timeseries_actuals.csv
#[derive(Debug, serde::Deserialize)]
struct TimeseriesRow {
    study_id: String,
    country_id: CountryId,
    date: String,
    #[serde(rename = "type")]
    point_type: String,
    sites_initiated: Option<f64>,
    patients_screened: Option<f64>,
    patients_randomized: Option<f64>,
    q75_patients_randomized: Option<f64>,
    q25_patients_randomized: Option<f64>,
    sites_enrolling: Option<f64>,
    cohort_name: Option<String>,
}

impl TimeseriesRow {
    fn to_point(self) -> Result<TimeseriesPoint> {
        Ok(TimeseriesPoint {
            country_id: self.country_id,
            date: CalendarDate::parse(&self.date)?,
            point_type: PointType::from(self.point_type.trim()),
            sites_initiated: self.sites_initiated,
            patients_screened: self.patients_screened,
            patients_randomized: self.patients_randomized,
            q75_patients_randomized: self.q75_patients_randomized,
            q25_patients_randomized: self.q25_patients_randomized,
            sites_enrolling: self.sites_enrolling,
            cohort_name: self.cohort_name.filter(|name| !name.is_empty()),
        })
    }
}

/// Load studies from any reader
pub fn load_studies_from_reader<R: Read>(reader: R) -> Result<Vec<StudyRecord>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut studies = Vec::new();

    for result in csv_reader.deserialize() {
        let row: StudyRow = result?;
        studies.push(row.to_study()?);
    }

    Ok(studies)
}

/// Load all studies from a CSV file
pub fn load_studies<P: AsRef<Path>>(path: P) -> Result<Vec<StudyRecord>> {
    let file = std::fs::File::open(path)?;
    load_studies_from_reader(file)
}

/// Look up a single study; `None` when the platform does not know it
pub fn find_study(config: &SourceConfig, study_id: &str) -> Result<Option<StudyRecord>> {
    let study = load_studies(config.studies_path())?
        .into_iter()
        .find(|study| study.study_id == study_id);
    if study.is_none() {
        warn!("study {} not found in {}", study_id, config.studies_path().display());
    }
    Ok(study)
}

/// Parameter actuals of one study
pub fn load_parameters_from_reader<R: Read>(reader: R, study_id: &str) -> Result<Vec<ParameterRecord>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut records = Vec::new();

    for result in csv_reader.deserialize() {
        let row: ParameterRow = result?;
        if row.study_id == study_id {
            records.push(row.to_record());
        }
    }

    Ok(records)
}

/// Time-series actuals of one study. Rows with an unparseable date are
/// skipped with a warning.
pub fn load_timeseries_from_reader<R: Read>(reader: R, study_id: &str) -> Result<Vec<TimeseriesPoint>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut points = Vec::new();

    for result in csv_reader.deserialize() {
        let row: TimeseriesRow = result?;
        if row.study_id != study_id {
            continue;
        }
        let country_id = row.country_id;
        match row.to_point() {
            Ok(point) => points.push(point),
            Err(e) => warn!("study {} country {}: skipping timeseries row: {}", study_id, country_id, e),
        }
    }

    Ok(points)
}

/// Latest-actuals snapshots of one study; dates stay unparsed
pub fn load_snapshots_from_reader<R: Read>(reader: R, study_id: &str) -> Result<Vec<LatestActualsSnapshot>> {
    let rows: Vec<LatestActualsSnapshot> = read_rows(reader)?;
    Ok(rows
        .into_iter()
        .filter(|s| s.study_id.as_deref() == Some(study_id))
        .collect())
}

/// Planned countries of one study
pub fn load_planned_countries_from_reader<R: Read>(reader: R, study_id: &str) -> Result<Vec<PlannedCountry>> {
    let rows: Vec<PlannedCountry> = read_rows(reader)?;
    Ok(rows.into_iter().filter(|c| c.study_id == study_id).collect())
}

/// All regions
pub fn load_regions_from_reader<R: Read>(reader: R) -> Result<Vec<RegionRecord>> {
    read_rows(reader)
}

fn read_rows<R: Read, T: DeserializeOwned>(reader: R) -> Result<Vec<T>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in csv_reader.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

/// Open `path` and run `load` on it, `None` if the file does not exist
fn load_optional<T, F>(path: &Path, load: F) -> Result<Option<Vec<T>>>
where
    F: FnOnce(std::fs::File) -> Result<Vec<T>>,
{
    if !path.exists() {
        warn!("table {} not found", path.display());
        return Ok(None);
    }
    let file = std::fs::File::open(path)?;
    load(file).map(Some)
}

/// Load the three actuals tables of a study concurrently
pub fn load_actuals_tables(config: &SourceConfig, study_id: &str) -> Result<ActualsTables> {
    let parameters_path = config.parameters_path();
    let timeseries_path = config.timeseries_path();
    let latest_path = config.latest_path();

    let (parameters, (timeseries, snapshots)) = rayon::join(
        || load_optional(&parameters_path, |f| load_parameters_from_reader(f, study_id)),
        || {
            rayon::join(
                || load_optional(&timeseries_path, |f| load_timeseries_from_reader(f, study_id)),
                || load_optional(&latest_path, |f| load_snapshots_from_reader(f, study_id)),
            )
        },
    );

    let tables = ActualsTables {
        parameters: parameters?,
        timeseries: timeseries?,
        snapshots: snapshots?,
    };
    info!(
        "study {}: loaded {} parameter rows, {} timeseries rows, {} snapshots",
        study_id,
        tables.parameters.as_ref().map_or(0, Vec::len),
        tables.timeseries.as_ref().map_or(0, Vec::len),
        tables.snapshots.as_ref().map_or(0, Vec::len),
    );
    Ok(tables)
}

/// Study-wide actuals bundle for `study_id`. An unknown study still gets its
/// latest snapshots.
pub fn load_study_actuals(
    config: &SourceConfig,
    study_id: &str,
) -> Result<(Option<StudyRecord>, ActualsBundle)> {
    let study = find_study(config, study_id)?;
    let tables = load_actuals_tables(config, study_id)?;
    let bundle = ActualsBundle::for_study(study_id, study.as_ref(), &tables);
    Ok((study, bundle))
}

/// Cohort-scoped actuals bundle for `study_id`
pub fn load_cohort_actuals(
    config: &SourceConfig,
    study_id: &str,
    country_ids: &[CountryId],
    cohort_name: &str,
) -> Result<(Option<StudyRecord>, ActualsBundle)> {
    let study = find_study(config, study_id)?;
    let tables = load_actuals_tables(config, study_id)?;
    let bundle = ActualsBundle::for_cohort(study_id, study.as_ref(), &tables, country_ids, cohort_name);
    Ok((study, bundle))
}

/// Planned countries of a study from the configured file
pub fn load_planned_countries(config: &SourceConfig, study_id: &str) -> Result<Vec<PlannedCountry>> {
    let file = std::fs::File::open(config.planned_countries_path())?;
    load_planned_countries_from_reader(file, study_id)
}

/// Regions from the configured file; empty if the file is absent
pub fn load_regions(config: &SourceConfig) -> Result<Vec<RegionRecord>> {
    Ok(load_optional(&config.regions_path(), load_regions_from_reader)?.unwrap_or_default())
}
