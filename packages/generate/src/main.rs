#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI tool for generating the per-year, per-voivodeship `GeoJSON` files
//! consumed by the map viewer.

use std::path::PathBuf;
use std::time::Instant;

use accident_map_cli_utils::IndicatifProgress;
use accident_map_enrich::{DEFAULT_CSV_DIR, JoinMode};
use accident_map_generate::{DEFAULT_OUTPUT_DIR, GenerateArgs};
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "accident_map_generate",
    about = "Enrich extracted accidents and write partitioned GeoJSON"
)]
struct Cli {
    /// Directory containing the `sewik_*.csv` files
    #[arg(long, default_value = DEFAULT_CSV_DIR)]
    csv_dir: PathBuf,
    /// Directory to write `metadata.json` and `data/` to
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
    /// Drop accidents that have no participant rows
    #[arg(long)]
    legacy_inner_join: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = accident_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let args = GenerateArgs {
        csv_dir: cli.csv_dir,
        output_dir: cli.output_dir,
        join_mode: if cli.legacy_inner_join {
            JoinMode::Inner
        } else {
            JoinMode::Outer
        },
    };

    let start = Instant::now();
    let progress = IndicatifProgress::partitions_bar(&multi, "Generating");
    let summary = accident_map_generate::run(&args, Some(progress))?;

    log::info!(
        "Generated {} files with {} accidents in {:.1}s ({} input accidents, {} without coordinates)",
        summary.metadata.total_files,
        summary.metadata.total_accidents,
        start.elapsed().as_secs_f64(),
        summary.report.input_events,
        summary.report.dropped_missing_coordinates,
    );

    Ok(())
}
