//! Per-country actuals report for a study
//!
//! Loads the study's actuals once, computes one window for the whole study
//! and reconciles every planned country against it.
//!
//! # Example
//! ```ignore
//! let reporter = StudyReporter::new(SourceConfig::from_env(), ReportConfig::default());
//! let report = reporter.build("CT-1001")?;
//! for country in &report.countries {
//!     println!("{}: {:?}", country.country_name, country.actuals.last_actual_date());
//! }
//! ```

use crate::actuals::{compute_window, ActualsEngine, ActualsResult, CountryId, DateWindow};
use crate::calendar::CalendarDate;
use crate::error::{ActualsError, Result};
use crate::source::{
    load_cohort_actuals, load_planned_countries, load_regions, load_study_actuals, ActualsBundle,
    PlannedCountry, RegionRecord, SourceConfig,
};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Restrict a report to one cohort
#[derive(Debug, Clone, PartialEq)]
pub struct CohortFilter {
    pub cohort_name: String,
    /// Countries to include; empty means every planned country
    pub country_ids: Vec<CountryId>,
}

/// Report options
#[derive(Debug, Clone, Default)]
pub struct ReportConfig {
    /// Scenario first-patient date, used when the study has none
    pub scenario_fp: Option<CalendarDate>,
    pub cohort: Option<CohortFilter>,
}

/// One planned country with its region and reconciled actuals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryReport {
    pub country_id: CountryId,
    pub country_name: String,
    pub region_id: u32,
    pub region_name: String,
    pub region_has_single_country: bool,
    pub patient_allocation: Option<f64>,
    pub num_sites: Option<f64>,
    pub fsiv: Option<f64>,
    pub fpfv: Option<f64>,
    pub lpft: Option<f64>,
    pub actuals: ActualsResult,
}

/// Actuals of every planned country of a study
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyReport {
    pub study_id: String,
    pub reference_date: Option<CalendarDate>,
    /// The study's first-patient date is later than its earliest actual
    pub early_actuals_alert: bool,
    /// `None` when the study has no dated actuals at all
    pub window: Option<DateWindow>,
    pub countries: Vec<CountryReport>,
}

impl StudyReport {
    /// Countries that received dense series
    pub fn countries_with_series(&self) -> usize {
        self.countries.iter().filter(|c| c.actuals.series.is_some()).count()
    }
}

/// Builds study reports from a CSV export
#[derive(Debug, Clone)]
pub struct StudyReporter {
    source: SourceConfig,
    config: ReportConfig,
}

impl StudyReporter {
    pub fn new(source: SourceConfig, config: ReportConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    /// Load everything for `study_id` and assemble its report
    pub fn build(&self, study_id: &str) -> Result<StudyReport> {
        let planned = load_planned_countries(&self.source, study_id)?;
        let regions = load_regions(&self.source)?;

        let (_, bundle) = match &self.config.cohort {
            Some(cohort) => {
                let country_ids: Vec<CountryId> = if cohort.country_ids.is_empty() {
                    planned.iter().map(|c| c.country_id).collect()
                } else {
                    cohort.country_ids.clone()
                };
                load_cohort_actuals(&self.source, study_id, &country_ids, &cohort.cohort_name)?
            }
            None => load_study_actuals(&self.source, study_id)?,
        };

        assemble_report(study_id, &bundle, &planned, &regions, self.config.scenario_fp)
    }
}

/// Assemble a report from already-loaded data.
///
/// Planned countries without a patient allocation or a region are left out;
/// if none remain the study has no report.
pub fn assemble_report(
    study_id: &str,
    bundle: &ActualsBundle,
    planned: &[PlannedCountry],
    regions: &[RegionRecord],
    scenario_fp: Option<CalendarDate>,
) -> Result<StudyReport> {
    let eligible: Vec<(&PlannedCountry, u32, &str)> = planned
        .iter()
        .filter(|c| c.patient_allocation.is_some())
        .filter_map(|c| match (c.region_id, c.region_name.as_deref()) {
            (Some(region_id), Some(region_name)) => Some((c, region_id, region_name)),
            _ => None,
        })
        .collect();
    if eligible.is_empty() {
        return Err(ActualsError::NoPlannedCountries(study_id.to_string()));
    }

    let reference_date = bundle.reference_date(scenario_fp);
    let window = compute_window(&bundle.timeseries, &bundle.snapshots).ok();
    let engine = ActualsEngine::new(&bundle.parameters, &bundle.timeseries, &bundle.snapshots, reference_date);

    let countries: Vec<CountryReport> = eligible
        .par_iter()
        .map(|&(country, region_id, region_name)| {
            let actuals = match &window {
                Some(window) => engine.reconcile(country.country_id, window),
                None => ActualsResult {
                    parameters: engine.parameter_actuals(country.country_id),
                    ..ActualsResult::new(country.country_id)
                },
            };
            CountryReport {
                country_id: country.country_id,
                country_name: country.country_name.clone(),
                region_id,
                region_name: region_name.to_string(),
                region_has_single_country: region_has_single_country(regions, region_name),
                patient_allocation: country.patient_allocation,
                num_sites: country.num_sites,
                fsiv: country.fsiv,
                fpfv: country.fpfv,
                lpft: country.lpft,
                actuals,
            }
        })
        .collect();

    let report = StudyReport {
        study_id: study_id.to_string(),
        reference_date,
        early_actuals_alert: bundle.has_early_actuals(),
        window,
        countries,
    };
    info!(
        "study {}: {} countries, {} with dense series",
        report.study_id,
        report.countries.len(),
        report.countries_with_series()
    );
    Ok(report)
}

/// Region lookup is by name, case-insensitively; unknown regions count as
/// multi-country
fn region_has_single_country(regions: &[RegionRecord], region_name: &str) -> bool {
    regions
        .iter()
        .find(|r| r.region_name.eq_ignore_ascii_case(region_name))
        .is_some_and(RegionRecord::has_single_country)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuals::{LatestActualsSnapshot, ParameterRecord, TimeseriesPoint};

    fn date(s: &str) -> CalendarDate {
        CalendarDate::parse(s).unwrap()
    }

    fn planned(country_id: CountryId, region: Option<&str>, allocation: Option<f64>) -> PlannedCountry {
        PlannedCountry {
            study_id: "CT-9".into(),
            country_id,
            country_name: format!("Country {}", country_id),
            region_id: region.map(|_| 1),
            region_name: region.map(str::to_string),
            patient_allocation: allocation,
            num_sites: Some(4.0),
            fsiv: None,
            fpfv: None,
            lpft: None,
        }
    }

    fn regions() -> Vec<RegionRecord> {
        vec![
            RegionRecord { region_id: 1, region_name: "Europe".into(), country_count: 12 },
            RegionRecord { region_id: 2, region_name: "Japan".into(), country_count: 1 },
        ]
    }

    #[test]
    fn test_report_covers_eligible_countries() {
        let bundle = ActualsBundle {
            parameters: vec![ParameterRecord { country_id: 1, fp_fsiv: Some(10), ..Default::default() }],
            timeseries: vec![
                TimeseriesPoint::actual(1, date("2024-01-05"), 1.0, 3.0, 1.0),
                TimeseriesPoint::actual(2, date("2024-01-08"), 2.0, 6.0, 3.0),
            ],
            snapshots: vec![LatestActualsSnapshot {
                country_id: Some(1),
                latest_date: Some("2024-01-12".into()),
                sites_initiated: Some(2.0),
                patients_screened: Some(5.0),
                patients_randomized: Some(2.0),
                ..Default::default()
            }],
            fp: None,
        };
        let planned = vec![
            planned(1, Some("Europe"), Some(20.0)),
            planned(2, Some("JAPAN"), Some(10.0)),
            planned(3, Some("Europe"), None),
            planned(4, None, Some(5.0)),
            planned(5, Some("LATAM"), Some(5.0)),
        ];

        let report = assemble_report("CT-9", &bundle, &planned, &regions(), Some(date("2024-01-01"))).unwrap();
        let ids: Vec<CountryId> = report.countries.iter().map(|c| c.country_id).collect();
        assert_eq!(ids, vec![1, 2, 5]);

        assert_eq!(report.reference_date, Some(date("2024-01-01")));
        assert!(!report.early_actuals_alert);
        assert_eq!(report.window, Some(DateWindow::new(date("2024-01-05"), date("2024-01-12"))));
        assert_eq!(report.countries_with_series(), 2);

        let first = &report.countries[0];
        assert!(!first.region_has_single_country);
        assert_eq!(first.actuals.last_actual_date(), Some(date("2024-01-12")));
        assert_eq!(
            first.actuals.parameters.as_ref().unwrap().actual_fsiv,
            Some(date("2024-01-11"))
        );
        assert_eq!(first.actuals.series.as_ref().unwrap().actual_siv.len(), 8);

        assert!(report.countries[1].region_has_single_country);
        assert!(!report.countries[2].region_has_single_country);
        assert!(report.countries[2].actuals.is_empty());
    }

    #[test]
    fn test_no_dates_still_reports_parameters() {
        let bundle = ActualsBundle {
            parameters: vec![ParameterRecord { country_id: 1, sas: Some(3.0), ..Default::default() }],
            fp: Some(date("2024-01-01")),
            ..Default::default()
        };
        let report = assemble_report("CT-9", &bundle, &[planned(1, Some("Europe"), Some(8.0))], &[], None).unwrap();

        assert_eq!(report.window, None);
        assert_eq!(report.reference_date, Some(date("2024-01-01")));
        let actuals = &report.countries[0].actuals;
        assert_eq!(actuals.parameters.as_ref().unwrap().actual_sas, Some(3.0));
        assert!(actuals.series.is_none());
    }

    #[test]
    fn test_no_eligible_country_is_an_error() {
        let result = assemble_report(
            "CT-9",
            &ActualsBundle::default(),
            &[planned(1, None, Some(1.0)), planned(2, Some("Europe"), None)],
            &regions(),
            None,
        );
        assert!(matches!(result, Err(ActualsError::NoPlannedCountries(id)) if id == "CT-9"));
    }

    #[test]
    fn test_study_fp_after_first_actual_raises_alert() {
        let bundle = ActualsBundle {
            timeseries: vec![
                TimeseriesPoint::forecast(1, date("2024-01-02"), 1.0, 1.0, 1.0, 1.0, 1.0),
                TimeseriesPoint::actual(1, date("2024-01-05"), 1.0, 3.0, 1.0),
            ],
            fp: Some(date("2024-01-10")),
            ..Default::default()
        };
        let planned = [planned(1, Some("Europe"), Some(8.0))];

        let report = assemble_report("CT-9", &bundle, &planned, &[], None).unwrap();
        assert!(report.early_actuals_alert);

        // a scenario fp is not the study's own date
        let no_study_fp = ActualsBundle { fp: None, ..bundle };
        let report = assemble_report("CT-9", &no_study_fp, &planned, &[], Some(date("2024-01-10"))).unwrap();
        assert!(!report.early_actuals_alert);
    }

    fn fixture_country<'r>(report: &'r StudyReport, country_id: CountryId) -> &'r CountryReport {
        report
            .countries
            .iter()
            .find(|c| c.country_id == country_id)
            .unwrap_or_else(|| panic!("country {} missing from report", country_id))
    }

    #[test]
    fn test_build_fixture_report() {
        let reporter = StudyReporter::new(SourceConfig::default(), ReportConfig::default());
        let report = reporter.build("CT-1001").expect("fixture report should build");

        // 840 has no patient allocation
        let ids: Vec<CountryId> = report.countries.iter().map(|c| c.country_id).collect();
        assert_eq!(ids, vec![250, 276, 392]);
        assert_eq!(report.reference_date, Some(date("2024-01-02")));
        assert!(!report.early_actuals_alert);
        assert_eq!(report.window, Some(DateWindow::new(date("2024-01-16"), date("2024-02-08"))));
        assert_eq!(report.countries_with_series(), 3);

        // 250: monotonic snapshot appended on 2024-01-29
        let france = fixture_country(&report, 250);
        let series = france.actuals.series.as_ref().unwrap();
        assert_eq!(series.actual_date, Some(date("2024-01-29")));
        assert_eq!(series.actual_patient_allocation, Some(6.0));
        assert_eq!(series.actual_screened.len(), 24);
        assert_eq!(series.actual_screened[13].date(), date("2024-01-29"));
        assert_eq!(series.actual_screened[13].value(), Some(11.0));
        assert_eq!(france.actuals.parameters.as_ref().unwrap().actual_fsiv, Some(date("2024-01-16")));

        // 276: snapshot screened 5 < 6, rejected
        let germany = fixture_country(&report, 276);
        assert_eq!(germany.actuals.last_actual_date(), Some(date("2024-01-30")));
        assert_eq!(germany.actuals.series.as_ref().unwrap().actual_patient_allocation, Some(3.0));

        // 392: malformed snapshot date, only the series point counts
        let japan = fixture_country(&report, 392);
        assert!(japan.region_has_single_country);
        assert_eq!(japan.actuals.last_actual_date(), Some(date("2024-01-28")));
    }

    #[test]
    fn test_build_fixture_cohort_report() {
        let config = ReportConfig {
            scenario_fp: None,
            cohort: Some(CohortFilter {
                cohort_name: "Part B".into(),
                country_ids: Vec::new(),
            }),
        };
        let report = StudyReporter::new(SourceConfig::default(), config)
            .build("CT-1001")
            .expect("fixture cohort report should build");

        assert_eq!(report.window, Some(DateWindow::new(date("2024-01-28"), date("2024-01-28"))));
        assert_eq!(report.countries_with_series(), 1);
        assert!(fixture_country(&report, 250).actuals.is_empty());
        assert!(fixture_country(&report, 276).actuals.is_empty());

        let japan = fixture_country(&report, 392);
        assert_eq!(japan.actuals.parameters.as_ref().unwrap().actual_fsiv, Some(date("2024-01-30")));
        let series = japan.actuals.series.as_ref().unwrap();
        assert_eq!(series.actual_randomized.len(), 1);
        assert_eq!(series.actual_date, Some(date("2024-01-28")));
    }

    #[test]
    fn test_build_fixture_edge_studies() {
        let reporter = StudyReporter::new(SourceConfig::default(), ReportConfig::default());

        // CT-2001 is planned but unknown to the platform: no fp, snapshots only
        let report = reporter.build("CT-2001").expect("unknown study still reports");
        assert_eq!(report.reference_date, None);
        assert_eq!(report.window, Some(DateWindow::new(date("2024-03-01"), date("2024-03-01"))));
        assert_eq!(report.countries.len(), 1);
        assert!(report.countries[0].actuals.is_empty());

        let with_fp = StudyReporter::new(
            SourceConfig::default(),
            ReportConfig { scenario_fp: Some(date("2024-02-01")), cohort: None },
        );
        assert_eq!(with_fp.build("CT-2001").unwrap().reference_date, Some(date("2024-02-01")));

        // CT-1002 is PLANNED with no planned countries
        assert!(matches!(reporter.build("CT-1002"), Err(ActualsError::NoPlannedCountries(id)) if id == "CT-1002"));
        assert!(matches!(reporter.build("CT-0000"), Err(ActualsError::NoPlannedCountries(_))));
    }
}
