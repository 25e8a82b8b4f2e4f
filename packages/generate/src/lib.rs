#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Library for generating the viewer data set from the extracted accident
//! CSV files.
//!
//! Runs enrichment, splits the accidents into one `GeoJSON` file per
//! (year, voivodeship) pair under `<output>/data/`, and writes a
//! `file_index.json` listing those files plus a `metadata.json` summary at
//! `<output>/`.
//!
//! Accidents without a parseable date or a known voivodeship are counted
//! by enrichment but not written to any partition.

pub mod features;
pub mod metadata;
pub mod partition;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use accident_map_enrich::{EnrichArgs, EnrichError, EnrichedEvent, EnrichmentReport, JoinMode};
use accident_map_relation::progress::{ProgressCallback, null_progress};

use crate::metadata::{FileIndexEntry, Metadata};

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "deckgl_viz";

/// Subdirectory of the output directory holding the partition files.
pub const DATA_DIR: &str = "data";

/// File name of the partition index (inside [`DATA_DIR`]).
pub const FILE_INDEX: &str = "file_index.json";

/// File name of the data set summary (in the output directory).
pub const METADATA: &str = "metadata.json";

/// Errors that can occur during generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Filesystem error while writing outputs.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Enrichment of the input CSV files failed.
    #[error(transparent)]
    Enrich(#[from] EnrichError),
}

/// Arguments for a generation run.
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    /// Directory holding the extracted CSV files.
    pub csv_dir: PathBuf,
    /// Directory receiving `metadata.json` and the `data/` subdirectory.
    pub output_dir: PathBuf,
    /// Accident/participant join behavior.
    pub join_mode: JoinMode,
}

impl GenerateArgs {
    /// Directory receiving the partition files and the index.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.output_dir.join(DATA_DIR)
    }
}

impl Default for GenerateArgs {
    fn default() -> Self {
        Self {
            csv_dir: PathBuf::from(accident_map_enrich::DEFAULT_CSV_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            join_mode: JoinMode::default(),
        }
    }
}

/// Outcome of a generation run.
#[derive(Debug, Clone)]
pub struct GenerateSummary {
    /// Data-quality counters from enrichment.
    pub report: EnrichmentReport,
    /// One entry per partition file written.
    pub files: Vec<FileIndexEntry>,
    /// The written summary document.
    pub metadata: Metadata,
}

/// Enriches the CSV files in `args.csv_dir` and writes the partitioned
/// output.
///
/// # Errors
///
/// Returns an error if enrichment fails or any output cannot be written.
pub fn run(
    args: &GenerateArgs,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<GenerateSummary, GenerateError> {
    let progress = progress.unwrap_or_else(null_progress);

    progress.set_message("Enriching accidents...".to_string());
    let enrich_args = EnrichArgs {
        join_mode: args.join_mode,
        ..EnrichArgs::in_dir(&args.csv_dir)
    };
    let enrichment = accident_map_enrich::run(&enrich_args)?;

    let (files, metadata) = write_outputs(&enrichment.events, &args.output_dir, progress.as_ref())?;

    Ok(GenerateSummary {
        report: enrichment.report,
        files,
        metadata,
    })
}

/// Partitions `events` and writes every partition, the index and the
/// metadata under `output_dir`.
///
/// # Errors
///
/// Returns an error if a directory or file cannot be written.
pub fn write_outputs(
    events: &[EnrichedEvent],
    output_dir: &Path,
    progress: &dyn ProgressCallback,
) -> Result<(Vec<FileIndexEntry>, Metadata), GenerateError> {
    let data_dir = output_dir.join(DATA_DIR);
    std::fs::create_dir_all(&data_dir)?;

    let partitions = partition::partition(events);
    log::info!(
        "Writing {} accidents into {} partition files...",
        partitions.values().map(Vec::len).sum::<usize>(),
        partitions.len()
    );

    progress.set_message("Writing partitions...".to_string());
    progress.set_total(partitions.len() as u64);

    let mut files = Vec::with_capacity(partitions.len());
    for (key, members) in &partitions {
        let collection = features::collection(&key.stem(), members);
        features::write_collection(&data_dir.join(key.file_name()), &collection)?;

        log::debug!("Wrote {} ({} accidents)", key.file_name(), members.len());
        files.push(FileIndexEntry::new(*key, members));
        progress.inc(1);
    }

    let index_path = data_dir.join(FILE_INDEX);
    metadata::write_json_atomic(&index_path, &files)?;
    log::info!("File index written: {}", index_path.display());

    let metadata = Metadata::build(events, files.len());
    let metadata_path = output_dir.join(METADATA);
    metadata::write_json_atomic(&metadata_path, &metadata)?;
    log::info!("Metadata written: {}", metadata_path.display());

    let written: usize = files.iter().map(|f| f.accident_count).sum();
    progress.finish(format!("{written} accidents in {} files", files.len()));
    log::info!(
        "Severity distribution: {:?}, years {:?}..={:?}, {} voivodeships with data",
        metadata.severity_counts,
        metadata.date_range.min_year,
        metadata.date_range.max_year,
        files
            .iter()
            .map(|f| f.voivodeship.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    );

    Ok((files, metadata))
}
