use anyhow::Result;

use nhl_dops::config::{self, CLEAN_CSV, PipelineConfig, STATS_CSV};
use nhl_dops::dataset::Dataset;
use nhl_dops::http_client::HttpSource;
use nhl_dops::{logging, stat_augment};

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = PipelineConfig::from_env().with_args(&args);

    let input = config.data_path(CLEAN_CSV);
    let mut dataset = Dataset::read_csv(&input)?;
    let mut source = HttpSource::new(&config)?;
    let summary = stat_augment::augment_dataset(&mut dataset, &mut source, &config);
    let out = config.data_path(STATS_CSV);
    dataset.write_csv(&out)?;

    println!("Stat augment complete");
    println!("Output: {}", out.display());
    println!("Records: {}", summary.records_total);
    println!("Game logs fetched: {}", summary.pages_fetched);
    println!(
        "Enriched: offenders={} victims={} unresolved sides={}",
        summary.offenders_enriched, summary.victims_enriched, summary.unresolved
    );
    if !summary.errors.is_empty() {
        println!("  errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(10) {
            println!("   - {err}");
        }
    }
    Ok(())
}
