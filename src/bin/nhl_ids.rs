use std::path::PathBuf;

use anyhow::Result;

use nhl_dops::config::{self, CLEAN_CSV, PipelineConfig, parse_flag_value};
use nhl_dops::dataset::Dataset;
use nhl_dops::http_client::HttpSource;
use nhl_dops::{logging, suggest};

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = PipelineConfig::from_env().with_args(&args);

    let input = config.data_path(CLEAN_CSV);
    let out = parse_flag_value(&args, "--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| input.clone());

    let mut dataset = Dataset::read_csv(&input)?;
    let mut source = HttpSource::new(&config)?;
    let summary = suggest::assign_nhl_ids(&mut dataset, &mut source, &config);
    dataset.write_csv(&out)?;

    println!("NHL id lookup complete");
    println!("Output: {}", out.display());
    println!("Records: {}", summary.records_total);
    println!("Suggest queries: {}", summary.queries);
    println!(
        "Ids found: offenders={} victims={}",
        summary.offender_ids, summary.victim_ids
    );
    if !summary.errors.is_empty() {
        println!("  errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(10) {
            println!("   - {err}");
        }
    }
    Ok(())
}
