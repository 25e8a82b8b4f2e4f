#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive CLI orchestrator for the accident map pipeline.
//!
//! Provides a single entry point that lets users pick a stage (extract,
//! generate, minify) or run all of them in order with the default
//! directory layout.
//!
//! Uses `indicatif-log-bridge` (via [`accident_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod pipeline;

use dialoguer::Select;

/// Top-level tool selection.
enum Tool {
    RunPipeline,
    Extract,
    Generate,
    Minify,
}

impl Tool {
    const ALL: &[Self] = &[Self::RunPipeline, Self::Extract, Self::Generate, Self::Minify];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::RunPipeline => "Run full pipeline",
            Self::Extract => "Extract XML to CSV",
            Self::Generate => "Generate GeoJSON partitions",
            Self::Minify => "Minify GeoJSON files",
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = accident_map_cli_utils::init_logger();

    println!("Accident Map Toolchain");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::RunPipeline => pipeline::run(&multi)?,
        Tool::Extract => {
            pipeline::extract(&multi, &pipeline::prompt_extract_args()?)?;
        }
        Tool::Generate => {
            pipeline::generate(&multi, &pipeline::prompt_generate_args()?)?;
        }
        Tool::Minify => {
            pipeline::minify(&multi, &accident_map_minify::MinifyArgs::default())?;
        }
    }

    Ok(())
}
