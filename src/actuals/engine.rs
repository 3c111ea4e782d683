//! Actuals reconciliation engine
//!
//! Turns sparse per-country actuals into dense day-by-day series over a
//! study-wide window. Pure: no I/O, no clock, no shared state.

use std::collections::BTreeMap;

use log::debug;

use super::records::{CountryId, LatestActualsSnapshot, ParameterRecord, PointType, TimeseriesPoint};
use super::result::{ActualsResult, ParameterActuals};
use super::state::FillState;
use super::window::DateWindow;
use crate::calendar::CalendarDate;

/// Reconciles the actuals of one study, country by country
#[derive(Debug, Clone, Copy)]
pub struct ActualsEngine<'a> {
    parameters: &'a [ParameterRecord],
    timeseries: &'a [TimeseriesPoint],
    snapshots: &'a [LatestActualsSnapshot],
    /// Study first-patient date the parameter offsets are measured from
    reference_date: Option<CalendarDate>,
}

impl<'a> ActualsEngine<'a> {
    pub fn new(
        parameters: &'a [ParameterRecord],
        timeseries: &'a [TimeseriesPoint],
        snapshots: &'a [LatestActualsSnapshot],
        reference_date: Option<CalendarDate>,
    ) -> Self {
        Self {
            parameters,
            timeseries,
            snapshots,
            reference_date,
        }
    }

    /// Full reconciliation for one country over `window`
    pub fn reconcile(&self, country_id: CountryId, window: &DateWindow) -> ActualsResult {
        let mut result = ActualsResult::new(country_id);
        result.parameters = self.parameter_actuals(country_id);

        let points = self.country_points(country_id);
        if points.is_empty() {
            return result;
        }

        let by_day: BTreeMap<CalendarDate, &TimeseriesPoint> =
            points.iter().map(|point| (point.date, point)).collect();

        let mut state = FillState::new(window.len_days());
        for day in window.days() {
            match by_day.get(&day) {
                Some(point) => state.observe(day, point),
                None => state.carry(day),
            }
        }

        result.series = state.finish();
        if result.series.is_none() {
            debug!(
                "country {}: incomplete series over {}..{}, series omitted",
                country_id, window.min, window.max
            );
        }
        result
    }

    /// Scalar section only; `None` when the country has no parameter record
    pub fn parameter_actuals(&self, country_id: CountryId) -> Option<ParameterActuals> {
        let params = self.parameters.iter().find(|p| p.country_id == country_id)?;
        let offset_date = |offset: Option<i64>| -> Option<CalendarDate> {
            Some(self.reference_date?.add_days(offset?))
        };

        Some(ParameterActuals {
            actual_fsiv: offset_date(params.fp_fsiv),
            actual_25_si: offset_date(params.si_25),
            actual_50_si: offset_date(params.si_50),
            actual_90_si: offset_date(params.si_90),
            actual_sas: params.sas,
            actual_fpfv_lpfv: params.fpfv_lpfv,
            actual_randomization_rate: params.randomization_rate,
            actual_screening_failure: params.screening_failure,
            actual_screening_rate: params.screening_rate,
            actual_f_lpft: params.f_lpft,
            actual_overallocation: params.overallocation,
            original_f_lpft: params.original_f_lpft,
        })
    }

    /// The country's points sorted by date, plus the snapshot-derived point
    /// when the snapshot passes [`trailing_actual`]
    pub fn country_points(&self, country_id: CountryId) -> Vec<TimeseriesPoint> {
        let mut points: Vec<TimeseriesPoint> = self
            .timeseries
            .iter()
            .filter(|point| point.country_id == country_id)
            .cloned()
            .collect();
        // stable: same-day points keep input order
        points.sort_by_key(|point| point.date);

        let snapshot = self
            .snapshots
            .iter()
            .find(|s| s.country_id == Some(country_id));

        if let Some(snapshot) = snapshot {
            if let Some(extra) = trailing_actual(&points, snapshot) {
                points.push(extra);
                points.sort_by_key(|point| point.date);
            }
        }

        points
    }
}

/// Point synthesized from the latest snapshot, if the snapshot can be trusted.
///
/// Requires an existing `ACTUALS` point, a parseable snapshot date on or after
/// it, and non-null sites/screened/randomized counts that do not go below the
/// last actual's. A snapshot reporting fewer than the time series is dropped.
pub fn trailing_actual(
    sorted_points: &[TimeseriesPoint],
    snapshot: &LatestActualsSnapshot,
) -> Option<TimeseriesPoint> {
    let last_actual = sorted_points.iter().rev().find(|p| p.point_type.is_actual())?;
    let country_id = snapshot.country_id?;

    let Some(latest_date) = snapshot.latest_date() else {
        debug!("country {}: snapshot date {:?} unusable", country_id, snapshot.latest_date);
        return None;
    };
    if latest_date < last_actual.date {
        debug!(
            "country {}: snapshot {} predates last actual {}",
            country_id, latest_date, last_actual.date
        );
        return None;
    }

    let not_below = |latest: Option<f64>, last: Option<f64>| match latest {
        Some(value) => value >= last.unwrap_or(0.0),
        None => false,
    };
    if !(not_below(snapshot.sites_initiated, last_actual.sites_initiated)
        && not_below(snapshot.patients_screened, last_actual.patients_screened)
        && not_below(snapshot.patients_randomized, last_actual.patients_randomized))
    {
        debug!("country {}: snapshot regresses below last actual, ignored", country_id);
        return None;
    }

    Some(TimeseriesPoint {
        country_id,
        date: latest_date,
        point_type: PointType::Actuals,
        sites_initiated: snapshot.sites_initiated,
        patients_screened: snapshot.patients_screened,
        patients_randomized: snapshot.patients_randomized,
        q75_patients_randomized: None,
        q25_patients_randomized: None,
        sites_enrolling: snapshot.sites_enrolling,
        cohort_name: None,
    })
}

/// Reconcile one country from raw collections.
///
/// Convenience over [`ActualsEngine`] for callers holding all inputs at once.
pub fn reconcile(
    parameters: &[ParameterRecord],
    timeseries: &[TimeseriesPoint],
    country_id: CountryId,
    reference_date: Option<CalendarDate>,
    snapshots: &[LatestActualsSnapshot],
    window: &DateWindow,
) -> ActualsResult {
    ActualsEngine::new(parameters, timeseries, snapshots, reference_date).reconcile(country_id, window)
}
