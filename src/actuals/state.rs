//! Running state of the dense window fill for a single country

use super::records::{PointType, TimeseriesPoint};
use super::result::{SeriesActuals, SeriesEntry};
use crate::calendar::CalendarDate;

/// The five tracked metrics of the last effective point
#[derive(Debug, Clone, PartialEq)]
pub struct CarriedMetrics {
    pub sites_initiated: Option<f64>,
    pub patients_screened: Option<f64>,
    pub patients_randomized: Option<f64>,
    pub q75_patients_randomized: Option<f64>,
    pub q25_patients_randomized: Option<f64>,
    pub point_type: PointType,
}

impl CarriedMetrics {
    /// Zero-valued forecast used for days before the first real point
    pub fn sentinel() -> Self {
        Self {
            sites_initiated: Some(0.0),
            patients_screened: Some(0.0),
            patients_randomized: Some(0.0),
            q75_patients_randomized: None,
            q25_patients_randomized: None,
            point_type: PointType::Forecast,
        }
    }

    pub fn from_point(point: &TimeseriesPoint) -> Self {
        Self {
            sites_initiated: point.sites_initiated,
            patients_screened: point.patients_screened,
            patients_randomized: point.patients_randomized,
            q75_patients_randomized: point.q75_patients_randomized,
            q25_patients_randomized: point.q25_patients_randomized,
            point_type: point.point_type.clone(),
        }
    }
}

/// Accumulates the series while walking the window day by day
#[derive(Debug)]
pub struct FillState {
    /// Last day that matched a real point; gaps repeat it unchanged
    carried: CarriedMetrics,

    /// Series being built
    series: SeriesActuals,

    // Whether any entry of the three required series carries a value
    siv_valued: bool,
    screened_valued: bool,
    randomized_valued: bool,
}

impl FillState {
    pub fn new(days: usize) -> Self {
        Self {
            carried: CarriedMetrics::sentinel(),
            series: SeriesActuals::with_capacity(days),
            siv_valued: false,
            screened_valued: false,
            randomized_valued: false,
        }
    }

    /// Record a day that has a real point
    pub fn observe(&mut self, day: CalendarDate, point: &TimeseriesPoint) {
        let metrics = CarriedMetrics::from_point(point);
        self.push(day, &metrics);

        if point.point_type.is_actual() {
            self.series.actual_date = Some(day);
            self.series.actual_num_sites = point.sites_initiated;
            self.series.actual_sites_enrolling = point.sites_enrolling;
            self.series.actual_patient_allocation = point.patients_randomized;
        }

        self.carried = metrics;
    }

    /// Record a day without a point by repeating the carried metrics
    pub fn carry(&mut self, day: CalendarDate) {
        let metrics = self.carried.clone();
        self.push(day, &metrics);
    }

    fn push(&mut self, day: CalendarDate, m: &CarriedMetrics) {
        self.siv_valued |= m.sites_initiated.is_some();
        self.screened_valued |= m.patients_screened.is_some();
        self.randomized_valued |= m.patients_randomized.is_some();

        let t = &m.point_type;
        self.series.actual_siv.push(SeriesEntry(day, m.sites_initiated, t.clone()));
        self.series.actual_screened.push(SeriesEntry(day, m.patients_screened, t.clone()));
        self.series.actual_randomized.push(SeriesEntry(day, m.patients_randomized, t.clone()));
        self.series.q75_actual_randomized.push(SeriesEntry(day, m.q75_patients_randomized, t.clone()));
        self.series.q25_actual_randomized.push(SeriesEntry(day, m.q25_patients_randomized, t.clone()));
    }

    /// Finished series, or `None` unless siv, screened and randomized each
    /// hold at least one non-null value. Sentinel zeros count.
    pub fn finish(self) -> Option<SeriesActuals> {
        if self.siv_valued && self.screened_valued && self.randomized_valued {
            Some(self.series)
        } else {
            None
        }
    }
}
