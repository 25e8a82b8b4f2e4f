#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Library for flattening SEWIK XML exports into three CSV relations.
//!
//! Walks `{source_dir}/{year}/*.xml` for each year in the requested range,
//! selects accident (`ZDARZENIE`), vehicle (`POJAZD`) and participant
//! (`OSOBA`) records from every file, tags them with their provenance and
//! writes one concatenated CSV per collection.
//!
//! A file that cannot be read or parsed is logged and skipped; the batch
//! always continues with the next file.

pub mod xml;

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use accident_map_accident_models::voivodeship::LABEL_PREFIX;
use accident_map_relation::progress::ProgressCallback;
use accident_map_relation::{Relation, RelationError};

/// Default root of the per-year XML directories.
pub const DEFAULT_SOURCE_DIR: &str = "baza";

/// Default directory for the intermediate CSV files.
pub const DEFAULT_CSV_DIR: &str = "csv";

/// First year extracted by default.
pub const DEFAULT_FIRST_YEAR: i32 = 2018;

/// Last year (inclusive) extracted by default.
pub const DEFAULT_LAST_YEAR: i32 = 2024;

/// Provenance column holding the source file's basename.
pub const SOURCE_FILE_COLUMN: &str = "source_file";

/// Provenance column holding the year directory the file came from.
pub const YEAR_COLUMN: &str = "year";

/// Errors that can occur during extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File bytes could not be decoded to text.
    #[error("Decode error: {0}")]
    Decode(#[from] xml::DecodeError),

    /// XML was not well-formed.
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Writing a relation failed.
    #[error(transparent)]
    Relation(#[from] RelationError),

    /// Invalid arguments.
    #[error("Invalid arguments: {message}")]
    InvalidArgs {
        /// Description of what went wrong.
        message: String,
    },
}

/// The three record collections selected from every source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// `ZDARZENIE` elements.
    Accidents,
    /// `POJAZD` elements.
    Vehicles,
    /// `OSOBA` elements.
    Participants,
}

impl Collection {
    /// All collections in output order.
    pub const ALL: [Self; 3] = [Self::Accidents, Self::Vehicles, Self::Participants];

    /// XML element name selected for this collection.
    #[must_use]
    pub const fn element(self) -> &'static str {
        match self {
            Self::Accidents => "ZDARZENIE",
            Self::Vehicles => "POJAZD",
            Self::Participants => "OSOBA",
        }
    }

    /// CSV file name written for this collection.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Accidents => "sewik_accidents.csv",
            Self::Vehicles => "sewik_vehicles.csv",
            Self::Participants => "sewik_participants.csv",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Accidents => "accidents",
            Self::Vehicles => "vehicles",
            Self::Participants => "participants",
        }
    }
}

/// Arguments for an extraction run.
#[derive(Debug, Clone)]
pub struct ExtractArgs {
    /// Root directory containing one subdirectory per year.
    pub source_dir: PathBuf,
    /// Directory the CSV files are written to.
    pub csv_dir: PathBuf,
    /// Years to process, inclusive.
    pub years: RangeInclusive<i32>,
}

impl Default for ExtractArgs {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            csv_dir: PathBuf::from(DEFAULT_CSV_DIR),
            years: DEFAULT_FIRST_YEAR..=DEFAULT_LAST_YEAR,
        }
    }
}

/// Records extracted from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileExtract {
    /// Accident rows.
    pub accidents: Relation,
    /// Vehicle rows.
    pub vehicles: Relation,
    /// Participant rows.
    pub participants: Relation,
}

impl FileExtract {
    fn take(&mut self, collection: Collection) -> Relation {
        std::mem::take(match collection {
            Collection::Accidents => &mut self.accidents,
            Collection::Vehicles => &mut self.vehicles,
            Collection::Participants => &mut self.participants,
        })
    }
}

/// Outcome of an extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Files extracted successfully.
    pub files_processed: usize,
    /// Files skipped because they could not be read or parsed.
    pub files_failed: usize,
    /// Total accident rows.
    pub accidents: usize,
    /// Total vehicle rows.
    pub vehicles: usize,
    /// Total participant rows.
    pub participants: usize,
    /// CSV files written.
    pub written: Vec<PathBuf>,
}

/// Lists the `*.xml` files directly inside `dir`, sorted by name.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn list_source_files(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_xml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("xml"));
        if is_xml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Extracts the three collections from one XML file and tags every row
/// with `source_file` and `year`.
///
/// A collection with no matching elements yields an empty relation, not an
/// error.
///
/// # Errors
///
/// Returns an error if the file cannot be read, cannot be decoded in its
/// declared encoding, or is not well-formed XML.
pub fn extract_file(path: &Path, year: i32) -> Result<FileExtract, ExtractError> {
    let bytes = std::fs::read(path)?;
    let text = xml::decode_document(&bytes)?;
    let doc = xml::parse_document(&text)?;

    let source_file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let year = year.to_string();

    let collect = |collection: Collection| {
        let records = xml::select_records(&doc, collection.element());
        if records.is_empty() {
            return Relation::default();
        }
        Relation::from_records(records)
            .with_constant(SOURCE_FILE_COLUMN, &source_file)
            .with_constant(YEAR_COLUMN, &year)
    };

    Ok(FileExtract {
        accidents: collect(Collection::Accidents).map_column("WOJ", strip_region_prefix),
        vehicles: collect(Collection::Vehicles),
        participants: collect(Collection::Participants),
    })
}

fn strip_region_prefix(raw: &str) -> String {
    raw.strip_prefix(LABEL_PREFIX).unwrap_or(raw).to_owned()
}

/// Runs the extraction over every year in `args.years` and writes the
/// concatenated CSV files.
///
/// Collections that are empty across all files are not written.
///
/// # Errors
///
/// Returns an error for an empty year range or if writing a CSV file
/// fails. Per-file read/parse failures are logged and skipped.
pub fn run(
    args: &ExtractArgs,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<ExtractionSummary, ExtractError> {
    if args.years.is_empty() {
        return Err(ExtractError::InvalidArgs {
            message: format!(
                "empty year range {}..={}",
                args.years.start(),
                args.years.end()
            ),
        });
    }

    let progress = progress.unwrap_or_else(accident_map_relation::progress::null_progress);

    log::info!("Starting data extraction from {}", args.source_dir.display());

    let mut work: Vec<(i32, PathBuf)> = Vec::new();
    for year in args.years.clone() {
        let folder = args.source_dir.join(year.to_string());
        match list_source_files(&folder) {
            Ok(files) => {
                log::info!("Processing year {year}, found {} files", files.len());
                work.extend(files.into_iter().map(|f| (year, f)));
            }
            Err(e) => {
                log::warn!("Skipping year {year}: cannot read {}: {e}", folder.display());
            }
        }
    }

    progress.set_total(work.len() as u64);

    let mut summary = ExtractionSummary::default();
    let mut parts: Vec<FileExtract> = Vec::with_capacity(work.len());

    for (year, path) in &work {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        progress.set_message(format!("{year}/{name}"));
        log::info!("  Processing: {name}");

        match extract_file(path, *year) {
            Ok(extract) => {
                log::debug!(
                    "    {} accidents, {} vehicles, {} participants",
                    extract.accidents.len(),
                    extract.vehicles.len(),
                    extract.participants.len()
                );
                summary.files_processed += 1;
                parts.push(extract);
            }
            Err(e) => {
                log::error!("    Error processing {}: {e}", path.display());
                summary.files_failed += 1;
            }
        }
        progress.inc(1);
    }

    log::info!("Combining data...");

    for collection in Collection::ALL {
        let combined = Relation::concat(parts.iter_mut().map(|p| p.take(collection)));
        let count = combined.len();
        match collection {
            Collection::Accidents => summary.accidents = count,
            Collection::Vehicles => summary.vehicles = count,
            Collection::Participants => summary.participants = count,
        }

        if combined.is_empty() {
            log::warn!("No {} found; not writing {}", collection.label(), collection.file_name());
            continue;
        }

        let path = args.csv_dir.join(collection.file_name());
        log::info!("Total {}: {count}", collection.label());
        combined.write_csv(&path)?;
        log::info!("Saved {}", path.display());
        summary.written.push(path);
    }

    progress.finish(format!(
        "Extracted {} files ({} failed)",
        summary.files_processed, summary.files_failed
    ));
    log::info!("Data extraction complete!");

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn args(root: &Path, years: RangeInclusive<i32>) -> ExtractArgs {
        ExtractArgs {
            source_dir: root.join("baza"),
            csv_dir: root.join("csv"),
            years,
        }
    }

    #[test]
    fn extract_file_tags_provenance_and_strips_region_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "a.xml",
            "<R><ZDARZENIE><ID>1</ID><WOJ>WOJ. OPOLSKIE</WOJ></ZDARZENIE></R>",
        );

        let extract = extract_file(&path, 2020).unwrap();

        let accidents = &extract.accidents;
        assert_eq!(accidents.columns(), ["ID", "WOJ", "source_file", "year"]);
        assert_eq!(accidents.rows()[0], ["1", "OPOLSKIE", "a.xml", "2020"]);
        assert!(extract.vehicles.is_empty());
        assert!(extract.participants.is_empty());
    }

    #[test]
    fn extract_file_decodes_declared_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cp1250.xml");
        std::fs::write(
            &path,
            b"<?xml version=\"1.0\" encoding=\"windows-1250\"?>\
              <R><ZDARZENIE><ID>1</ID><WOJ>WOJ. \xA3\xD3DZKIE</WOJ></ZDARZENIE></R>",
        )
        .unwrap();

        let extract = extract_file(&path, 2021).unwrap();

        assert_eq!(extract.accidents.rows()[0], ["1", "ŁÓDZKIE", "cp1250.xml", "2021"]);
    }

    #[test]
    fn file_without_accidents_still_contributes_vehicles() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "baza/2019/only_vehicles.xml",
            "<R><POJAZD><ID>5</ID><RODZAJ_POJAZDU>IS01</RODZAJ_POJAZDU></POJAZD></R>",
        );

        let summary = run(&args(dir.path(), 2019..=2019), None).unwrap();

        assert_eq!(summary.files_processed, 1);
        assert_eq!(summary.files_failed, 0);
        assert_eq!(summary.accidents, 0);
        assert_eq!(summary.vehicles, 1);
        assert!(!dir.path().join("csv/sewik_accidents.csv").exists());

        let vehicles = Relation::read_csv(&dir.path().join("csv/sewik_vehicles.csv")).unwrap();
        assert_eq!(vehicles.rows()[0], ["5", "IS01", "only_vehicles.xml", "2019"]);
    }

    #[test]
    fn malformed_file_is_skipped_and_batch_continues() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "baza/2018/bad.xml", "<R><ZDARZENIE>");
        write(
            dir.path(),
            "baza/2018/good.xml",
            "<R><ZDARZENIE><ID>1</ID></ZDARZENIE></R>",
        );
        write(
            dir.path(),
            "baza/2019/more.xml",
            "<R><ZDARZENIE><ID>2</ID><lon>21.0</lon></ZDARZENIE></R>",
        );
        write(dir.path(), "baza/2019/notes.txt", "ignored");

        let summary = run(&args(dir.path(), 2018..=2020), None).unwrap();

        assert_eq!(summary.files_processed, 2);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.accidents, 2);

        let accidents = Relation::read_csv(&dir.path().join("csv/sewik_accidents.csv")).unwrap();
        assert_eq!(accidents.columns(), ["ID", "source_file", "year", "lon"]);
        assert_eq!(accidents.rows()[0], ["1", "good.xml", "2018", ""]);
        assert_eq!(accidents.rows()[1], ["2", "more.xml", "2019", "21.0"]);
    }

    #[test]
    fn empty_year_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        #[allow(clippy::reversed_empty_ranges)]
        let result = run(&args(dir.path(), 2020..=2019), None);
        assert!(matches!(result, Err(ExtractError::InvalidArgs { .. })));
    }
}
