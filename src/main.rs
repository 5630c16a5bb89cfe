use anyhow::Result;
use tracing::warn;

use nhl_dops::config::{
    self, CLEAN_CSV, CORRELATED_CSV, INJURY_CSV, PipelineConfig, RAW_CSV, STATS_CSV,
};
use nhl_dops::http_client::HttpSource;
use nhl_dops::injury::{self, CorrelateOptions};
use nhl_dops::{clean, logging, stat_augment, wiki_scrape};

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = PipelineConfig::from_env().with_args(&args);
    let mut source = HttpSource::new(&config)?;

    let scrape = wiki_scrape::scrape_seasons(&mut source, &config);
    let mut dataset = scrape.dataset;
    dataset.write_csv(&config.data_path(RAW_CSV))?;
    println!(
        "scrape: pages {}/{} rows={} row failures={}",
        scrape.pages_succeeded,
        scrape.pages_total,
        dataset.len(),
        scrape.row_failures.len()
    );

    let cleaned = clean::clean_dataset(&mut dataset);
    dataset.write_csv(&config.data_path(CLEAN_CSV))?;
    println!(
        "clean: rows {} -> {} patches={} errors={}",
        cleaned.rows_in,
        cleaned.rows_out,
        cleaned.patches_applied,
        cleaned.errors.len()
    );

    let augmented = stat_augment::augment_dataset(&mut dataset, &mut source, &config);
    dataset.write_csv(&config.data_path(STATS_CSV))?;
    println!(
        "stats: offenders={} victims={} errors={}",
        augmented.offenders_enriched,
        augmented.victims_enriched,
        augmented.errors.len()
    );

    let injury_path = config.data_path(INJURY_CSV);
    if !injury_path.exists() {
        warn!(path = %injury_path.display(), "no injury file, skipping correlation");
        println!("correlate: skipped (no {})", injury_path.display());
        return Ok(());
    }
    let load = injury::load_injuries(&injury_path)?;
    let report = injury::correlate(
        &dataset,
        &load.injuries,
        config.season_cutoff,
        CorrelateOptions::default(),
    );
    injury::write_correlated_csv(&config.data_path(CORRELATED_CSV), &report.rows)?;
    println!(
        "correlate: rows={} truncated={}",
        report.rows.len(),
        report.truncated.len()
    );
    Ok(())
}
