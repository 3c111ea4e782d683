//! Locations of the platform tables exported as CSV

use std::env;
use std::path::{Path, PathBuf};

/// Default directory holding the exported tables
pub const DEFAULT_DATA_PATH: &str = "data/actuals";

/// Environment variable overriding [`DEFAULT_DATA_PATH`]
pub const DATA_DIR_ENV: &str = "ACTUALS_DATA_DIR";

/// File layout of an actuals export
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub data_dir: PathBuf,
    pub studies_file: String,
    pub parameters_file: String,
    pub timeseries_file: String,
    pub latest_file: String,
    pub planned_countries_file: String,
    pub regions_file: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::with_data_dir(DEFAULT_DATA_PATH)
    }
}

impl SourceConfig {
    /// Standard file names under `data_dir`
    pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            studies_file: "studies.csv".to_string(),
            parameters_file: "study_country_parameter_actuals.csv".to_string(),
            timeseries_file: "study_country_timeseries_actuals.csv".to_string(),
            latest_file: "study_country_latest_actuals.csv".to_string(),
            planned_countries_file: "planned_study_countries.csv".to_string(),
            regions_file: "regions.csv".to_string(),
        }
    }

    /// Default layout, rooted at `$ACTUALS_DATA_DIR` when set
    pub fn from_env() -> Self {
        match env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Self::with_data_dir(dir.trim()),
            _ => Self::default(),
        }
    }

    pub fn studies_path(&self) -> PathBuf {
        self.data_dir.join(&self.studies_file)
    }

    pub fn parameters_path(&self) -> PathBuf {
        self.data_dir.join(&self.parameters_file)
    }

    pub fn timeseries_path(&self) -> PathBuf {
        self.data_dir.join(&self.timeseries_file)
    }

    pub fn latest_path(&self) -> PathBuf {
        self.data_dir.join(&self.latest_file)
    }

    pub fn planned_countries_path(&self) -> PathBuf {
        self.data_dir.join(&self.planned_countries_file)
    }

    pub fn regions_path(&self) -> PathBuf {
        self.data_dir.join(&self.regions_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_rooted_at_data_dir() {
        let config = SourceConfig::with_data_dir("/tmp/export");
        assert_eq!(config.studies_path(), PathBuf::from("/tmp/export/studies.csv"));
        assert_eq!(
            config.latest_path(),
            PathBuf::from("/tmp/export/study_country_latest_actuals.csv")
        );
        assert_eq!(SourceConfig::default().data_dir, PathBuf::from(DEFAULT_DATA_PATH));
    }

    #[test]
    fn test_from_env_overrides_data_dir() {
        // only this test touches the variable
        env::set_var(DATA_DIR_ENV, " /srv/actuals ");
        assert_eq!(SourceConfig::from_env().data_dir, PathBuf::from("/srv/actuals"));

        env::set_var(DATA_DIR_ENV, "  ");
        assert_eq!(SourceConfig::from_env().data_dir, PathBuf::from(DEFAULT_DATA_PATH));

        env::remove_var(DATA_DIR_ENV);
        assert_eq!(SourceConfig::from_env(), SourceConfig::default());
    }
}
