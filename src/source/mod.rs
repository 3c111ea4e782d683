//! Platform data access: CSV exports of the study and actuals tables

mod config;
mod study;
pub mod loader;

pub use config::{SourceConfig, DEFAULT_DATA_PATH, DATA_DIR_ENV};
pub use study::{ActualsBundle, ActualsTables, PlannedCountry, RegionRecord, StudyRecord, StudyStatus};
pub use loader::{
    find_study, load_actuals_tables, load_cohort_actuals, load_planned_countries, load_regions,
    load_study_actuals,
};
