//! Stage runners and the full pipeline flow.
//!
//! Chains extract -> generate -> minify, prompting only for the year range
//! and the join behavior. Every other setting uses the default directory
//! layout.

use std::time::Instant;

use accident_map_cli_utils::{IndicatifProgress, MultiProgress};
use accident_map_enrich::JoinMode;
use accident_map_extract::{DEFAULT_FIRST_YEAR, DEFAULT_LAST_YEAR, ExtractArgs};
use accident_map_generate::GenerateArgs;
use accident_map_minify::MinifyArgs;
use dialoguer::{Confirm, Input};

/// Prompts for the year range to extract.
///
/// # Errors
///
/// Returns an error if a prompt fails or the range is empty.
pub fn prompt_extract_args() -> Result<ExtractArgs, Box<dyn std::error::Error>> {
    let from: i32 = Input::new()
        .with_prompt("First year")
        .default(DEFAULT_FIRST_YEAR)
        .interact_text()?;
    let to: i32 = Input::new()
        .with_prompt("Last year")
        .default(DEFAULT_LAST_YEAR)
        .interact_text()?;

    if from > to {
        return Err(format!("First year {from} is after last year {to}").into());
    }

    Ok(ExtractArgs {
        years: from..=to,
        ..ExtractArgs::default()
    })
}

/// Prompts for the join behavior.
///
/// # Errors
///
/// Returns an error if the prompt fails.
pub fn prompt_generate_args() -> Result<GenerateArgs, Box<dyn std::error::Error>> {
    let inner = Confirm::new()
        .with_prompt("Drop accidents without participant records?")
        .default(false)
        .interact()?;

    Ok(GenerateArgs {
        join_mode: if inner {
            JoinMode::Inner
        } else {
            JoinMode::Outer
        },
        ..GenerateArgs::default()
    })
}

/// Runs the extraction stage.
///
/// # Errors
///
/// Returns an error if extraction fails.
pub fn extract(multi: &MultiProgress, args: &ExtractArgs) -> Result<(), Box<dyn std::error::Error>> {
    let progress = IndicatifProgress::files_bar(multi, "Extracting", 0);
    let summary = accident_map_extract::run(args, Some(progress))?;
    log::info!(
        "Extracted {} accidents, {} vehicles, {} participants ({} files failed)",
        summary.accidents,
        summary.vehicles,
        summary.participants,
        summary.files_failed
    );
    Ok(())
}

/// Runs enrichment and partitioning.
///
/// # Errors
///
/// Returns an error if generation fails.
pub fn generate(multi: &MultiProgress, args: &GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let progress = IndicatifProgress::partitions_bar(multi, "Generating");
    let summary = accident_map_generate::run(args, Some(progress))?;
    log::info!(
        "Generated {} files with {} accidents",
        summary.metadata.total_files,
        summary.metadata.total_accidents
    );
    Ok(())
}

/// Runs the compaction stage.
///
/// # Errors
///
/// Returns an error if the data directory cannot be listed.
pub fn minify(multi: &MultiProgress, args: &MinifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let progress = IndicatifProgress::files_bar(multi, "Minifying", 0);
    let reports = accident_map_minify::run(args, Some(progress))?;
    log::info!("Minified {} files", reports.len());
    Ok(())
}

/// Runs every stage in order.
///
/// # Errors
///
/// Returns an error if a prompt or any stage fails.
pub fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let extract_args = prompt_extract_args()?;
    let generate_args = prompt_generate_args()?;
    let minify_args = MinifyArgs {
        dir: generate_args.data_dir(),
        file: None,
    };

    let start = Instant::now();

    extract(multi, &extract_args)?;
    generate(multi, &generate_args)?;
    minify(multi, &minify_args)?;

    log::info!("Pipeline finished in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}
