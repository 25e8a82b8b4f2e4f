//! The `file_index.json` and `metadata.json` documents.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use accident_map_accident_models::Voivodeship;
use accident_map_enrich::EnrichedEvent;
use serde::Serialize;

use crate::GenerateError;
use crate::partition::PartitionKey;

/// Value of the `format` field in `metadata.json`.
pub const FORMAT: &str = "GeoJSON";

/// Value of the `structure` field in `metadata.json`.
pub const STRUCTURE: &str = "year_voivodeship";

/// One entry of `file_index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileIndexEntry {
    /// Partition file name (no directory).
    pub filename: String,
    /// Partition year.
    pub year: i32,
    /// Voivodeship name.
    pub voivodeship: String,
    /// Number of accidents in the file.
    pub accident_count: usize,
    /// Accidents per severity ordinal.
    pub severity_distribution: BTreeMap<u8, usize>,
}

impl FileIndexEntry {
    /// Describes one written partition.
    #[must_use]
    pub fn new(key: PartitionKey, events: &[&EnrichedEvent]) -> Self {
        Self {
            filename: key.file_name(),
            year: key.year,
            voivodeship: key.voivodeship.name().to_owned(),
            accident_count: events.len(),
            severity_distribution: severity_counts(events.iter().copied()),
        }
    }
}

/// Year span of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    /// Earliest year.
    pub min_year: Option<i32>,
    /// Latest year.
    pub max_year: Option<i32>,
}

/// Coordinate extent of the output, as `[min, max]` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoordinatesRange {
    /// Longitude extent.
    pub lon: [f64; 2],
    /// Latitude extent.
    pub lat: [f64; 2],
}

/// Contents of `metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// Enriched accidents, including those without a partition.
    pub total_accidents: usize,
    /// Partition files written.
    pub total_files: usize,
    /// Distinct years, ascending.
    pub years: Vec<i32>,
    /// Voivodeship name to code, in canonical order.
    pub voivodeships: serde_json::Map<String, serde_json::Value>,
    /// Year span.
    pub date_range: DateRange,
    /// Coordinate extent, `null` when there are no accidents.
    pub coordinates_range: Option<CoordinatesRange>,
    /// Accidents per severity ordinal.
    pub severity_counts: BTreeMap<u8, usize>,
    /// Local generation time, ISO 8601.
    pub generated_at: String,
    /// Always [`FORMAT`].
    pub format: &'static str,
    /// Always [`STRUCTURE`].
    pub structure: &'static str,
}

impl Metadata {
    /// Summarizes every enriched accident, including those that could not
    /// be assigned to a partition.
    #[must_use]
    pub fn build(events: &[EnrichedEvent], total_files: usize) -> Self {
        let years: Vec<i32> = events
            .iter()
            .filter_map(|e| e.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let voivodeships = Voivodeship::all()
            .iter()
            .map(|v| (v.name().to_owned(), serde_json::Value::from(v.code())))
            .collect();

        Self {
            total_accidents: events.len(),
            total_files,
            date_range: DateRange {
                min_year: years.first().copied(),
                max_year: years.last().copied(),
            },
            years,
            voivodeships,
            coordinates_range: coordinates_range(events.iter()),
            severity_counts: severity_counts(events.iter()),
            generated_at: chrono::Local::now()
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            format: FORMAT,
            structure: STRUCTURE,
        }
    }
}

/// Counts accidents per severity ordinal. Levels with no accidents are
/// omitted.
pub fn severity_counts<'a>(events: impl Iterator<Item = &'a EnrichedEvent>) -> BTreeMap<u8, usize> {
    let mut counts = BTreeMap::new();
    for event in events {
        *counts.entry(event.severity.ordinal()).or_insert(0) += 1;
    }
    counts
}

fn coordinates_range<'a>(
    mut events: impl Iterator<Item = &'a EnrichedEvent>,
) -> Option<CoordinatesRange> {
    let first = events.next()?;
    let mut range = CoordinatesRange {
        lon: [first.longitude; 2],
        lat: [first.latitude; 2],
    };
    for event in events {
        range.lon[0] = range.lon[0].min(event.longitude);
        range.lon[1] = range.lon[1].max(event.longitude);
        range.lat[0] = range.lat[0].min(event.latitude);
        range.lat[1] = range.lat[1].max(event.latitude);
    }
    Some(range)
}

/// Serializes `value` as pretty JSON to `path`.
///
/// Writes to a `.tmp` sibling first and renames it into place so readers
/// never see a partial document.
///
/// # Errors
///
/// Returns an error if serialization or any file operation fails.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), GenerateError> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    let contents = serde_json::to_string_pretty(value)?;
    std::fs::write(tmp_path, contents)?;
    std::fs::rename(tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use accident_map_accident_models::Severity;

    use super::*;
    use crate::partition::partition;
    use crate::test_support::event;

    fn sample() -> Vec<EnrichedEvent> {
        let mut unplaced = event("4", Some(2022), None);
        unplaced.longitude = 23.1;
        unplaced.latitude = 53.1;
        let mut a = event("1", Some(2019), Some(Voivodeship::Mazowieckie));
        a.longitude = 21.0;
        a.latitude = 52.2;
        let mut b = event("2", Some(2021), Some(Voivodeship::Opolskie));
        b.longitude = 17.9;
        b.latitude = 50.6;
        b.severity = Severity::Slight;
        let mut c = event("3", Some(2019), Some(Voivodeship::Mazowieckie));
        c.longitude = 20.5;
        c.latitude = 52.9;
        vec![a, b, c, unplaced]
    }

    #[test]
    fn index_entry_describes_partition() {
        let events = sample();
        let partitions = partition(&events);
        let (key, members) = partitions.iter().next().unwrap();

        let entry = FileIndexEntry::new(*key, members);

        assert_eq!(entry.filename, "accidents_2019_MAZOWIECKIE.geojson");
        assert_eq!(entry.year, 2019);
        assert_eq!(entry.voivodeship, "MAZOWIECKIE");
        assert_eq!(entry.accident_count, 2);
        assert_eq!(entry.severity_distribution, BTreeMap::from([(3, 2)]));
    }

    #[test]
    fn metadata_summarizes_every_enriched_accident() {
        let events = sample();
        let metadata = Metadata::build(&events, partition(&events).len());

        assert_eq!(metadata.total_accidents, 4);
        assert_eq!(metadata.total_files, 2);
        assert_eq!(metadata.years, [2019, 2021, 2022]);
        assert_eq!(metadata.date_range.min_year, Some(2019));
        assert_eq!(metadata.date_range.max_year, Some(2022));
        assert_eq!(metadata.severity_counts, BTreeMap::from([(1, 1), (3, 3)]));

        let range = metadata.coordinates_range.unwrap();
        assert_eq!(range.lon, [17.9, 23.1]);
        assert_eq!(range.lat, [50.6, 53.1]);

        assert_eq!(metadata.voivodeships.len(), 16);
        let first = metadata.voivodeships.iter().next().unwrap();
        assert_eq!(first.0, "DOLNOŚLĄSKIE");
        assert_eq!(first.1, &serde_json::json!(2));
        assert_eq!(metadata.voivodeships["ZACHODNIOPOMORSKIE"], 32);
    }

    #[test]
    fn empty_metadata_has_null_ranges() {
        let metadata = Metadata::build(&[], 0);
        let value = serde_json::to_value(&metadata).unwrap();

        assert_eq!(value["total_accidents"], 0);
        assert_eq!(value["coordinates_range"], serde_json::Value::Null);
        assert_eq!(value["date_range"]["min_year"], serde_json::Value::Null);
        assert_eq!(value["format"], "GeoJSON");
        assert_eq!(value["structure"], "year_voivodeship");
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.json");

        write_json_atomic(&path, &serde_json::json!({ "a": 1 })).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("metadata.json.tmp").exists());
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"a\": 1"));
    }
}
