//! Error types for actuals loading and reporting
//!
//! The reconciliation engine itself never fails; these errors come from the
//! window computation, the CSV sources and the study report assembly.

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, ActualsError>;

#[derive(Debug, Error)]
pub enum ActualsError {
    /// Neither time-series points nor snapshots carried a usable date
    #[error("no dates available to build a reconciliation window")]
    EmptyDateRange,

    #[error("invalid calendar date: {0:?}")]
    InvalidDate(String),

    #[error("unknown study status: {0:?}")]
    UnknownStudyStatus(String),

    /// No planned country of the study has an allocation and a region
    #[error("no planned countries with patient allocation for study {0}")]
    NoPlannedCountries(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
