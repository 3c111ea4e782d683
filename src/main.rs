//! Trial Actuals CLI
//!
//! Builds reconciled actuals reports from a CSV export of the platform tables.
//!
//! Usage:
//!   trial-actuals report --study <id> [--fp <date>] [--cohort <name> [--country <id>...]] [--output <file>]
//!   trial-actuals window --study <id>

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use trial_actuals::actuals::compute_window;
use trial_actuals::report::CohortFilter;
use trial_actuals::source::load_study_actuals;
use trial_actuals::{CalendarDate, ReportConfig, SourceConfig, StudyReporter};

#[derive(Parser)]
#[command(name = "trial-actuals")]
#[command(version = "0.1.0")]
#[command(about = "Reconcile clinical-trial enrollment actuals into dense daily series", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory with the exported tables (defaults to $ACTUALS_DATA_DIR or data/actuals)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the per-country actuals report of a study as JSON
    Report {
        /// Platform study id
        #[arg(short, long)]
        study: String,

        /// Scenario first-patient date (YYYY-MM-DD), used when the study has none
        #[arg(long)]
        fp: Option<String>,

        /// Restrict actuals to one cohort
        #[arg(long)]
        cohort: Option<String>,

        /// Countries for the cohort filter (defaults to all planned countries)
        #[arg(long = "country", requires = "cohort")]
        countries: Vec<u32>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Print the reconciliation window of a study
    Window {
        /// Platform study id
        #[arg(short, long)]
        study: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let source = match cli.data_dir {
        Some(dir) => SourceConfig::with_data_dir(dir),
        None => SourceConfig::from_env(),
    };

    match cli.command {
        Commands::Report { study, fp, cohort, countries, output, pretty } => {
            let scenario_fp = fp
                .as_deref()
                .map(CalendarDate::parse)
                .transpose()
                .context("invalid --fp date")?;
            let config = ReportConfig {
                scenario_fp,
                cohort: cohort.map(|cohort_name| CohortFilter {
                    cohort_name,
                    country_ids: countries,
                }),
            };

            let reporter = StudyReporter::new(source, config);
            let report = reporter
                .build(&study)
                .with_context(|| format!("failed to build report for study {}", study))?;

            let json = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };

            match output {
                Some(path) => {
                    let mut file = File::create(&path)
                        .with_context(|| format!("unable to create {}", path.display()))?;
                    writeln!(file, "{}", json)?;
                    eprintln!(
                        "Report for {} ({} countries, {} with series) written to {}",
                        report.study_id,
                        report.countries.len(),
                        report.countries_with_series(),
                        path.display()
                    );
                }
                None => writeln!(io::stdout().lock(), "{}", json)?,
            }
        }

        Commands::Window { study } => {
            let (_, bundle) = load_study_actuals(&source, &study)
                .with_context(|| format!("failed to load actuals for study {}", study))?;
            let window = compute_window(&bundle.timeseries, &bundle.snapshots)
                .with_context(|| format!("study {} has no dated actuals", study))?;
            println!("{} {} ({} days)", window.min, window.max, window.len_days());
        }
    }

    Ok(())
}
