//! Trial Actuals - reconciliation of clinical-trial enrollment actuals
//!
//! This library provides:
//! - A calendar-only date type for day-granularity arithmetic
//! - The actuals reconciliation engine: sparse per-country actuals in,
//!   dense day-by-day series with ACTUALS/FORECAST provenance out
//! - Loading of the platform's actuals tables from CSV exports
//! - Per-country study reports combining planned countries, regions and actuals

pub mod error;
pub mod calendar;
pub mod actuals;
pub mod source;
pub mod report;

// Re-export commonly used types
pub use error::{ActualsError, Result};
pub use calendar::CalendarDate;
pub use actuals::{ActualsEngine, ActualsResult, DateWindow, compute_window, reconcile};
pub use source::{ActualsBundle, SourceConfig};
pub use report::{ReportConfig, StudyReport, StudyReporter};
