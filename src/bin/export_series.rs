//! Export the dense actuals series of a study as a long CSV
//!
//! One row per (country, day, metric) for charting and spreadsheet checks.
//!
//! Usage: export_series <study_id> [output.csv]
//! Reads tables from $ACTUALS_DATA_DIR (default data/actuals).

use anyhow::{bail, Context, Result};
use std::env;
use std::time::Instant;
use trial_actuals::{ReportConfig, SourceConfig, StudyReporter};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(study_id) = args.first() else {
        bail!("usage: export_series <study_id> [output.csv]");
    };
    let output_path = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| format!("actuals_series_{}.csv", study_id));

    let start = Instant::now();
    let source = SourceConfig::from_env();
    println!("Loading study {} from {}...", study_id, source.data_dir.display());

    let report = StudyReporter::new(source, ReportConfig::default())
        .build(study_id)
        .with_context(|| format!("failed to build report for study {}", study_id))?;

    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("unable to create {}", output_path))?;
    writer.write_record(["country_id", "country_name", "date", "metric", "value", "type"])?;

    let mut rows = 0usize;
    for country in &report.countries {
        let Some(series) = &country.actuals.series else {
            continue;
        };
        let country_id = country.country_id.to_string();
        for (metric, entries) in series.named_series() {
            for entry in entries {
                let date = entry.date().to_string();
                let value = entry.value().map(|v| v.to_string()).unwrap_or_default();
                writer.write_record([
                    country_id.as_str(),
                    country.country_name.as_str(),
                    date.as_str(),
                    metric,
                    value.as_str(),
                    entry.point_type().as_str(),
                ])?;
                rows += 1;
            }
        }
    }
    writer.flush()?;

    println!("Wrote {} rows for {} countries to {}", rows, report.countries_with_series(), output_path);
    if let Some(window) = report.window {
        println!("  Window: {} .. {} ({} days)", window.min, window.max, window.len_days());
    }
    println!("Total time: {:?}", start.elapsed());
    Ok(())
}
