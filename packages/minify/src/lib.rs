#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Compaction of generated `GeoJSON` files.
//!
//! Each file is parsed and rewritten in place as compact JSON. Key order
//! and non-ASCII text are kept as they are, so a second pass over the same
//! file changes nothing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use accident_map_relation::progress::{ProgressCallback, null_progress};

/// Default directory scanned for `GeoJSON` files.
pub const DEFAULT_DATA_DIR: &str = "deckgl_viz/data";

/// Extension of the files that get compacted.
pub const EXTENSION: &str = "geojson";

/// Errors that can occur while compacting a file.
#[derive(Debug, thiserror::Error)]
pub enum MinifyError {
    /// Reading or writing the file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What to compact.
#[derive(Debug, Clone)]
pub struct MinifyArgs {
    /// Directory whose `*.geojson` files are compacted.
    pub dir: PathBuf,
    /// A single file to compact instead of the whole directory.
    pub file: Option<PathBuf>,
}

impl Default for MinifyArgs {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_DATA_DIR),
            file: None,
        }
    }
}

/// Size change of one compacted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinifyReport {
    /// The rewritten file.
    pub path: PathBuf,
    /// Size in bytes before compaction.
    pub before: u64,
    /// Size in bytes after compaction.
    pub after: u64,
}

impl MinifyReport {
    /// Size reduction as a percentage of the original size.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn reduction_pct(&self) -> f64 {
        if self.before == 0 {
            return 0.0;
        }
        (self.before as f64 - self.after as f64) / self.before as f64 * 100.0
    }
}

/// Rewrites `path` as compact JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid JSON, or
/// cannot be written back.
pub fn minify_file(path: &Path) -> Result<MinifyReport, MinifyError> {
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let compact = serde_json::to_string(&value)?;

    std::fs::write(path, &compact)?;

    let report = MinifyReport {
        path: path.to_path_buf(),
        before: text.len() as u64,
        after: compact.len() as u64,
    };
    log::info!(
        "Minified {}: {} -> {} bytes ({:.1}% reduction)",
        file_label(path),
        report.before,
        report.after,
        report.reduction_pct()
    );
    Ok(report)
}

/// Compacts every `*.geojson` file directly inside `dir`.
///
/// Files that fail to parse or rewrite are logged and skipped. A missing
/// directory or one without matching files yields an empty result.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be listed.
pub fn minify_dir(
    dir: &Path,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<Vec<MinifyReport>, MinifyError> {
    let progress = progress.unwrap_or_else(null_progress);

    if !dir.is_dir() {
        log::warn!("Directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == EXTENSION))
        .collect();
    files.sort();

    if files.is_empty() {
        log::warn!("No .{EXTENSION} files found in {}", dir.display());
        return Ok(Vec::new());
    }

    log::info!("Found {} .{EXTENSION} files to minify", files.len());
    progress.set_message("Minifying".to_string());
    progress.set_total(files.len() as u64);

    let mut reports = Vec::with_capacity(files.len());
    for path in &files {
        match minify_file(path) {
            Ok(report) => reports.push(report),
            Err(e) => log::error!("Failed to minify {}: {e}", file_label(path)),
        }
        progress.inc(1);
    }

    let before: u64 = reports.iter().map(|r| r.before).sum();
    let after: u64 = reports.iter().map(|r| r.after).sum();
    progress.finish(format!(
        "{} files, {before} -> {after} bytes",
        reports.len()
    ));

    Ok(reports)
}

/// Compacts one named file. Returns `None` (after logging why) if the file
/// does not exist, lacks the `.geojson` extension, or cannot be compacted.
#[must_use]
pub fn minify_single(path: &Path) -> Option<MinifyReport> {
    if !path.is_file() {
        log::warn!("File {} does not exist", path.display());
        return None;
    }
    if !path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(EXTENSION))
    {
        log::warn!("File {} is not a .{EXTENSION} file", path.display());
        return None;
    }

    match minify_file(path) {
        Ok(report) => Some(report),
        Err(e) => {
            log::error!("Failed to minify {}: {e}", file_label(path));
            None
        }
    }
}

/// Runs compaction for `args`: the single file if one is given, otherwise
/// the whole directory.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be listed.
pub fn run(
    args: &MinifyArgs,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<Vec<MinifyReport>, MinifyError> {
    match &args.file {
        Some(file) => Ok(minify_single(file).into_iter().collect()),
        None => minify_dir(&args.dir, progress),
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
