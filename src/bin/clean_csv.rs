use anyhow::Result;

use nhl_dops::config::{self, CLEAN_CSV, PipelineConfig, RAW_CSV};
use nhl_dops::dataset::Dataset;
use nhl_dops::money::format_currency;
use nhl_dops::{clean, logging};

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = PipelineConfig::from_env().with_args(&args);

    let input = config.data_path(RAW_CSV);
    let mut dataset = Dataset::read_csv(&input)?;
    let summary = clean::clean_dataset(&mut dataset);
    let out = config.data_path(CLEAN_CSV);
    dataset.write_csv(&out)?;

    println!("CSV clean complete");
    println!("Input: {}", input.display());
    println!("Output: {}", out.display());
    println!("Rows: {} -> {}", summary.rows_in, summary.rows_out);
    println!("Patches applied: {}", summary.patches_applied);
    println!(
        "Unparsed offenses: {}  no player victim: {}  money errors: {}",
        summary.no_parse, summary.no_victim, summary.money_errors
    );
    println!(
        "Total forfeited salary: {}",
        format_currency(summary.forfeited_total)
    );
    if !summary.errors.is_empty() {
        println!("  errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(10) {
            println!("   - {err}");
        }
    }
    Ok(())
}
