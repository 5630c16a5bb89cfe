use std::path::PathBuf;

use anyhow::Result;

use nhl_dops::config::{
    self, CLEAN_CSV, CORRELATED_CSV, INJURY_CSV, PipelineConfig, has_flag, parse_flag_value,
};
use nhl_dops::dataset::Dataset;
use nhl_dops::injury::{self, CorrelateOptions, InjuryMultiplicity};
use nhl_dops::{export, logging};

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = PipelineConfig::from_env().with_args(&args);

    let options = CorrelateOptions {
        multiplicity: if has_flag(&args, "--all-injuries") {
            InjuryMultiplicity::AllPerSeason
        } else {
            InjuryMultiplicity::FirstPerSeason
        },
    };

    let dataset = Dataset::read_csv(&config.data_path(CLEAN_CSV))?;
    let load = injury::load_injuries(&config.data_path(INJURY_CSV))?;
    let report = injury::correlate(&dataset, &load.injuries, config.season_cutoff, options);
    let out = config.data_path(CORRELATED_CSV);
    injury::write_correlated_csv(&out, &report.rows)?;

    println!("Injury correlation complete");
    println!("Output: {}", out.display());
    println!(
        "Injuries: {} kept, {} excluded types",
        load.injuries.len(),
        load.excluded
    );
    println!("Correlated rows: {}", report.rows.len());
    println!("Truncated injuries: {}", report.truncated.len());
    for dropped in report.truncated.iter().take(10) {
        println!(
            "   - {} {} {} ({} games)",
            dropped.victim, dropped.date, dropped.inj_type, dropped.games_missed
        );
    }

    if let Some(xlsx) = parse_flag_value(&args, "--xlsx").map(PathBuf::from) {
        let exported = export::export_correlation_xlsx(&xlsx, &report)?;
        println!(
            "Workbook: {} ({} correlated, {} truncated)",
            xlsx.display(),
            exported.correlated,
            exported.truncated
        );
    }

    if !load.errors.is_empty() {
        println!("  errors: {}", load.errors.len());
        for err in load.errors.iter().take(10) {
            println!("   - {err}");
        }
    }
    Ok(())
}
