//! Actuals reconciliation: records, window and the dense-series engine

mod records;
mod result;
mod state;
mod window;
mod engine;

pub use records::{CountryId, PointType, ParameterRecord, TimeseriesPoint, LatestActualsSnapshot};
pub use result::{ActualsResult, ParameterActuals, SeriesActuals, SeriesEntry};
pub use state::{FillState, CarriedMetrics};
pub use window::{DateWindow, WindowDays, compute_window};
pub use engine::{ActualsEngine, reconcile, trailing_actual};
