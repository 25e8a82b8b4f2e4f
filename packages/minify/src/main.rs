#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI tool for compacting the generated `GeoJSON` files in place.

use std::path::PathBuf;

use accident_map_cli_utils::IndicatifProgress;
use accident_map_minify::{DEFAULT_DATA_DIR, MinifyArgs};
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "accident_map_minify",
    about = "Strip whitespace from generated GeoJSON files"
)]
struct Cli {
    /// Directory whose `*.geojson` files are compacted
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    dir: PathBuf,
    /// Compact only this file
    #[arg(long)]
    file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = accident_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let args = MinifyArgs {
        dir: cli.dir,
        file: cli.file,
    };

    let progress = IndicatifProgress::files_bar(&multi, "Minifying", 0);
    let reports = accident_map_minify::run(&args, Some(progress))?;

    let before: u64 = reports.iter().map(|r| r.before).sum();
    let after: u64 = reports.iter().map(|r| r.after).sum();
    log::info!(
        "Minified {} files: {before} -> {after} bytes",
        reports.len()
    );

    Ok(())
}
