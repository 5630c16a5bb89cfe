use anyhow::Result;

use nhl_dops::config::{self, PipelineConfig, RAW_CSV};
use nhl_dops::http_client::HttpSource;
use nhl_dops::{logging, wiki_scrape};

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = PipelineConfig::from_env().with_args(&args);

    let mut source = HttpSource::new(&config)?;
    let summary = wiki_scrape::scrape_seasons(&mut source, &config);
    let out = config.data_path(RAW_CSV);
    summary.dataset.write_csv(&out)?;

    println!("Wiki scrape complete");
    println!("Output: {}", out.display());
    println!(
        "Pages: {}/{}",
        summary.pages_succeeded, summary.pages_total
    );
    println!("Rows: {}", summary.dataset.len());
    if !summary.errors.is_empty() {
        println!("Page errors: {}", summary.errors.len());
        for err in &summary.errors {
            println!("   - {err}");
        }
    }
    if !summary.row_failures.is_empty() {
        println!("Row failures: {}", summary.row_failures.len());
        for failure in summary.row_failures.iter().take(10) {
            println!("   - {failure}");
        }
    }
    Ok(())
}
