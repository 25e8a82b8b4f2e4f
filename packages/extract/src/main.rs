#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the SEWIK XML extraction stage.

use std::path::PathBuf;
use std::time::Instant;

use accident_map_cli_utils::IndicatifProgress;
use accident_map_extract::{
    DEFAULT_CSV_DIR, DEFAULT_FIRST_YEAR, DEFAULT_LAST_YEAR, DEFAULT_SOURCE_DIR, ExtractArgs,
};
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "accident_map_extract",
    about = "Flatten SEWIK XML exports into CSV files"
)]
struct Cli {
    /// Directory containing one subdirectory of XML files per year
    #[arg(long, default_value = DEFAULT_SOURCE_DIR)]
    source_dir: PathBuf,
    /// Directory to write `sewik_*.csv` files to
    #[arg(long, default_value = DEFAULT_CSV_DIR)]
    csv_dir: PathBuf,
    /// First year to extract
    #[arg(long, default_value_t = DEFAULT_FIRST_YEAR)]
    from_year: i32,
    /// Last year to extract (inclusive)
    #[arg(long, default_value_t = DEFAULT_LAST_YEAR)]
    to_year: i32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = accident_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let args = ExtractArgs {
        source_dir: cli.source_dir,
        csv_dir: cli.csv_dir,
        years: cli.from_year..=cli.to_year,
    };

    let start = Instant::now();
    let progress = IndicatifProgress::files_bar(&multi, "Extracting", 0);
    let summary = accident_map_extract::run(&args, Some(progress))?;

    log::info!(
        "Extracted {} accidents, {} vehicles, {} participants from {} files in {:.1}s ({} failed)",
        summary.accidents,
        summary.vehicles,
        summary.participants,
        summary.files_processed,
        start.elapsed().as_secs_f64(),
        summary.files_failed,
    );

    Ok(())
}
