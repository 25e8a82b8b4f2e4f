#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Accident enrichment: joins the extracted relations and classifies each
//! accident by severity and vulnerable road user involvement.
//!
//! The pipeline, in order:
//!
//! 1. drop accidents without coordinates
//! 2. map the `WOJ` label to a [`Voivodeship`]
//! 3. parse `DATA_ZDARZENIA` into year/month/day
//! 4. map participant outcome codes to a [`Severity`]
//! 5. join participants to vehicles and map the vehicle type to a category
//! 6. compute per-participant vulnerable-user markers
//! 7. aggregate participants per accident and join onto the accidents
//! 8. derive accident severity and color, round coordinates
//!
//! Unknown codes and missing join counterparts are data-quality gaps, not
//! errors; they are counted in the [`EnrichmentReport`].

pub mod aggregate;
pub mod event;
pub mod participant;

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use accident_map_accident_models::{Rgba, Severity, Voivodeship};
use accident_map_relation::{Relation, RelationError};
use chrono::{Datelike as _, NaiveDateTime};

use crate::aggregate::{EventAggregate, SeverityHistogram};
use crate::event::{BaseEvent, EventColumns};
use crate::participant::VulnerableMarkers;

/// Default directory holding the extracted CSV files.
pub const DEFAULT_CSV_DIR: &str = "csv";

/// Accidents CSV file name.
pub const ACCIDENTS_CSV: &str = "sewik_accidents.csv";

/// Vehicles CSV file name.
pub const VEHICLES_CSV: &str = "sewik_vehicles.csv";

/// Participants CSV file name.
pub const PARTICIPANTS_CSV: &str = "sewik_participants.csv";

/// Errors that can occur during enrichment.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    /// Reading an input relation failed or a required column is missing.
    #[error("Failed to load {path}: {source}")]
    Load {
        /// The input file.
        path: PathBuf,
        /// Underlying error.
        source: RelationError,
    },

    /// A required column is missing from an in-memory relation.
    #[error(transparent)]
    Relation(#[from] RelationError),
}

/// How accidents without any participant rows are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JoinMode {
    /// Keep them with an all-zero histogram, severity 0 and no vulnerable
    /// users.
    #[default]
    Outer,
    /// Drop them, matching the legacy output.
    Inner,
}

/// Locations of the three input relations.
#[derive(Debug, Clone)]
pub struct EnrichArgs {
    /// Accidents CSV.
    pub accidents: PathBuf,
    /// Vehicles CSV.
    pub vehicles: PathBuf,
    /// Participants CSV.
    pub participants: PathBuf,
    /// Accident/participant join behavior.
    pub join_mode: JoinMode,
}

impl EnrichArgs {
    /// Uses the standard file names inside `csv_dir`.
    #[must_use]
    pub fn in_dir(csv_dir: &Path) -> Self {
        Self {
            accidents: csv_dir.join(ACCIDENTS_CSV),
            vehicles: csv_dir.join(VEHICLES_CSV),
            participants: csv_dir.join(PARTICIPANTS_CSV),
            join_mode: JoinMode::default(),
        }
    }
}

impl Default for EnrichArgs {
    fn default() -> Self {
        Self::in_dir(Path::new(DEFAULT_CSV_DIR))
    }
}

/// The extracted relations consumed by [`enrich`].
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    /// Accident rows.
    pub accidents: Relation,
    /// Vehicle rows.
    pub vehicles: Relation,
    /// Participant rows.
    pub participants: Relation,
}

/// A fully enriched accident, ready for partitioning.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedEvent {
    /// Accident identifier.
    pub id: String,
    /// Longitude (WGS84), rounded to 6 decimal places.
    pub longitude: f64,
    /// Latitude (WGS84), rounded to 6 decimal places.
    pub latitude: f64,
    /// Accident timestamp.
    pub timestamp: Option<NaiveDateTime>,
    /// Year of the accident.
    pub year: Option<i32>,
    /// Month of the accident (1-12).
    pub month: Option<u32>,
    /// Day of month.
    pub day: Option<u32>,
    /// Region.
    pub voivodeship: Option<Voivodeship>,
    /// Accident severity (the most severe participant outcome).
    pub severity: Severity,
    /// Participants per severity.
    pub histogram: SeverityHistogram,
    /// Vulnerable road user markers.
    pub vulnerable: VulnerableMarkers,
    /// Display color for [`Self::severity`].
    pub color: Rgba,
}

impl EnrichedEvent {
    fn new(base: BaseEvent, aggregate: EventAggregate) -> Self {
        let severity = aggregate.histogram.severity();
        Self {
            id: base.id,
            longitude: event::round_coordinate(base.longitude),
            latitude: event::round_coordinate(base.latitude),
            year: base.timestamp.map(|t| t.year()),
            month: base.timestamp.map(|t| t.month()),
            day: base.timestamp.map(|t| t.day()),
            timestamp: base.timestamp,
            voivodeship: base.voivodeship,
            severity,
            histogram: aggregate.histogram,
            vulnerable: aggregate.vulnerable,
            color: severity.color(),
        }
    }
}

/// Data-quality counters collected during enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    /// Accident rows read.
    pub input_events: usize,
    /// Accidents dropped for missing or invalid coordinates.
    pub dropped_missing_coordinates: usize,
    /// Accidents dropped because their identifier was already seen.
    pub duplicate_ids: usize,
    /// Retained accidents whose region label is not a voivodeship.
    pub unmapped_regions: usize,
    /// Retained accidents whose timestamp could not be parsed.
    pub unparseable_dates: usize,
    /// Participant rows read.
    pub participants: usize,
    /// Participants referencing a vehicle that does not exist.
    pub unmatched_vehicle_refs: usize,
    /// Distinct vehicle type codes with no category mapping.
    pub unmapped_vehicle_codes: BTreeSet<String>,
    /// Accidents with no participant rows.
    pub events_without_participants: usize,
    /// Accidents dropped by the join (only with [`JoinMode::Inner`]).
    pub dropped_by_join: usize,
    /// Enriched accidents produced.
    pub output_events: usize,
}

/// Enriched accidents plus the data-quality report.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    /// One entry per retained accident, in input order.
    pub events: Vec<EnrichedEvent>,
    /// Data-quality counters.
    pub report: EnrichmentReport,
}

/// Normalizes an identifier for joining: trims whitespace and drops a
/// trailing `.0` left by float-typed exports (`"12.0"` -> `"12"`).
#[must_use]
pub fn normalize_id(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.strip_suffix(".0") {
        Some(int) if !int.is_empty() && int.bytes().all(|b| b.is_ascii_digit()) => int.to_owned(),
        _ => trimmed.to_owned(),
    }
}

/// Reads the three input relations.
///
/// # Errors
///
/// Returns [`EnrichError::Load`] naming the file that could not be read.
pub fn load_inputs(args: &EnrichArgs) -> Result<Inputs, EnrichError> {
    let load = |path: &Path| {
        log::info!("Loading {}...", path.display());
        Relation::read_csv(path).map_err(|source| EnrichError::Load {
            path: path.to_path_buf(),
            source,
        })
    };

    let inputs = Inputs {
        accidents: load(&args.accidents)?,
        vehicles: load(&args.vehicles)?,
        participants: load(&args.participants)?,
    };

    log::info!(
        "Loaded {} accidents, {} vehicles, {} participants",
        inputs.accidents.len(),
        inputs.vehicles.len(),
        inputs.participants.len()
    );

    Ok(inputs)
}

/// Runs the enrichment pipeline over in-memory relations.
///
/// # Errors
///
/// Returns an error if a required column is missing from any relation.
pub fn enrich(inputs: &Inputs, join_mode: JoinMode) -> Result<Enrichment, EnrichError> {
    let mut report = EnrichmentReport {
        input_events: inputs.accidents.len(),
        participants: inputs.participants.len(),
        ..EnrichmentReport::default()
    };

    let cols = EventColumns::resolve(&inputs.accidents)?;
    let mut seen: HashSet<String> = HashSet::with_capacity(inputs.accidents.len());
    let mut base_events = Vec::with_capacity(inputs.accidents.len());

    for row in inputs.accidents.rows() {
        let Some(base) = BaseEvent::from_row(row, cols) else {
            report.dropped_missing_coordinates += 1;
            continue;
        };
        if !seen.insert(base.id.clone()) {
            report.duplicate_ids += 1;
            continue;
        }
        if base.voivodeship.is_none() {
            report.unmapped_regions += 1;
        }
        if base.timestamp.is_none() {
            report.unparseable_dates += 1;
        }
        base_events.push(base);
    }

    log::info!(
        "Filtered to {} accidents with valid coordinates ({} removed)",
        base_events.len(),
        report.dropped_missing_coordinates
    );
    if report.duplicate_ids > 0 {
        log::warn!("Dropped {} accidents with duplicate IDs", report.duplicate_ids);
    }
    if report.unmapped_regions > 0 {
        log::warn!(
            "{} accidents have an unknown voivodeship and will not be partitioned",
            report.unmapped_regions
        );
    }
    if report.unparseable_dates > 0 {
        log::warn!(
            "{} accidents have an unparseable date and will not be partitioned",
            report.unparseable_dates
        );
    }

    let vehicle_types = participant::vehicle_types(&inputs.vehicles)?;
    let classification = participant::classify_participants(&inputs.participants, &vehicle_types)?;
    report.unmatched_vehicle_refs = classification.unmatched_vehicle_refs;
    report.unmapped_vehicle_codes = classification.unmapped_vehicle_codes;

    if !report.unmapped_vehicle_codes.is_empty() {
        log::warn!(
            "Some vehicle types were not properly mapped: {:?}",
            report.unmapped_vehicle_codes
        );
    }

    let aggregates = aggregate::aggregate_by_event(&classification.participants);

    let mut events = Vec::with_capacity(base_events.len());
    for base in base_events {
        let aggregate = if let Some(agg) = aggregates.get(&base.id) {
            *agg
        } else {
            report.events_without_participants += 1;
            match join_mode {
                JoinMode::Outer => EventAggregate::default(),
                JoinMode::Inner => {
                    report.dropped_by_join += 1;
                    continue;
                }
            }
        };
        events.push(EnrichedEvent::new(base, aggregate));
    }

    if report.events_without_participants > 0 {
        match join_mode {
            JoinMode::Outer => log::info!(
                "{} accidents have no participants; kept with zero counts",
                report.events_without_participants
            ),
            JoinMode::Inner => log::warn!(
                "Dropped {} accidents with no participants",
                report.dropped_by_join
            ),
        }
    }

    report.output_events = events.len();
    log::info!("Enriched {} accidents", report.output_events);

    Ok(Enrichment { events, report })
}

/// Loads the input CSV files and enriches them.
///
/// # Errors
///
/// Returns an error if an input cannot be read or lacks a required column.
pub fn run(args: &EnrichArgs) -> Result<Enrichment, EnrichError> {
    let inputs = load_inputs(args)?;
    enrich(&inputs, args.join_mode)
}

#[cfg(test)]
mod tests {
    use accident_map_accident_models::VulnerableCategory;
    use accident_map_relation::Record;

    use super::*;

    fn relation(rows: &[&[(&str, &str)]]) -> Relation {
        Relation::from_records(rows.iter().map(|fields| {
            fields
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect::<Record>()
        }))
    }

    fn accident<'a>(id: &'a str, date: &'a str, woj: &'a str, lon: &'a str, lat: &'a str) -> [(&'a str, &'a str); 5] {
        [
            ("ID", id),
            ("DATA_ZDARZENIA", date),
            ("WOJ", woj),
            ("lon", lon),
            ("lat", lat),
        ]
    }

    fn person<'a>(event: &'a str, outcome: &'a str, role: &'a str, vehicle: &'a str) -> [(&'a str, &'a str); 4] {
        [
            ("ZSZD_ID", event),
            ("STUC_KOD", outcome),
            ("SSRU_KOD", role),
            ("ZSPO_ID", vehicle),
        ]
    }

    fn sample_inputs() -> Inputs {
        Inputs {
            accidents: relation(&[
                &accident("1", "2019-06-01 10:00:00", "MAZOWIECKIE", "21.0122228", "52.2296756"),
                &accident("2", "2019-06-02", "WOJ. ŚLĄSKIE", "19.0", "50.25"),
                &accident("3", "2020-01-01", "MAZOWIECKIE", "", "52.0"),
                &accident("4", "bad", "NOWHERE", "20.0", "51.0"),
                &accident("1", "2019-06-01", "MAZOWIECKIE", "21.0", "52.0"),
            ]),
            vehicles: relation(&[
                &[("ID", "10"), ("RODZAJ_POJAZDU", "IS101")],
                &[("ID", "11"), ("RODZAJ_POJAZDU", "IS121")],
                &[("ID", "12"), ("RODZAJ_POJAZDU", "IS777")],
            ]),
            participants: relation(&[
                &person("1", "ZM", "K", "10"),
                &person("1", "", "K", "11"),
                &person("1", "RL", "I", ""),
                &person("2", "RC", "K", "12"),
            ]),
        }
    }

    #[test]
    fn enriches_fatal_cyclist_accident() {
        let result = enrich(&sample_inputs(), JoinMode::Outer).unwrap();
        let event = &result.events[0];

        assert_eq!(event.id, "1");
        assert_eq!(event.severity, Severity::Fatal);
        assert_eq!(event.color, [255, 0, 0, 160]);
        assert_eq!(event.histogram.fatal, 1);
        assert_eq!(event.histogram.slight, 1);
        assert_eq!(event.histogram.damage_only, 1);
        assert_eq!(event.histogram.total(), 3);
        assert_eq!(event.vulnerable.get(VulnerableCategory::Cyclist), 3);
        assert_eq!(event.vulnerable.get(VulnerableCategory::Pedestrian), 1);
        assert_eq!(event.vulnerable.get(VulnerableCategory::Motorcyclist), -1);
        assert_eq!(event.voivodeship, Some(Voivodeship::Mazowieckie));
        assert_eq!(event.voivodeship.map(Voivodeship::code), Some(14));
        assert_eq!((event.year, event.month, event.day), (Some(2019), Some(6), Some(1)));
        assert_eq!(event.longitude, 21.012_223);
        assert_eq!(event.latitude, 52.229_676);
    }

    #[test]
    fn report_counts_data_quality_gaps() {
        let result = enrich(&sample_inputs(), JoinMode::Outer).unwrap();
        let report = &result.report;

        assert_eq!(report.input_events, 5);
        assert_eq!(report.dropped_missing_coordinates, 1);
        assert_eq!(report.duplicate_ids, 1);
        assert_eq!(report.unmapped_regions, 1);
        assert_eq!(report.unparseable_dates, 1);
        assert_eq!(report.events_without_participants, 1);
        assert_eq!(report.dropped_by_join, 0);
        assert_eq!(report.output_events, 3);
        assert_eq!(
            report.unmapped_vehicle_codes.iter().collect::<Vec<_>>(),
            ["IS777"]
        );
    }

    #[test]
    fn outer_join_zero_fills_accidents_without_participants() {
        let result = enrich(&sample_inputs(), JoinMode::Outer).unwrap();
        let event = result.events.iter().find(|e| e.id == "4").unwrap();

        assert_eq!(event.histogram, SeverityHistogram::default());
        assert_eq!(event.severity, Severity::DamageOnly);
        assert_eq!(event.color, [128, 128, 128, 160]);
        assert_eq!(event.vulnerable, VulnerableMarkers::default());
        assert_eq!(event.year, None);
        assert_eq!(event.voivodeship, None);
    }

    #[test]
    fn inner_join_drops_accidents_without_participants() {
        let result = enrich(&sample_inputs(), JoinMode::Inner).unwrap();

        let ids: Vec<&str> = result.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
        assert_eq!(result.report.dropped_by_join, 1);
    }

    #[test]
    fn severity_matches_histogram_for_every_event() {
        let result = enrich(&sample_inputs(), JoinMode::Outer).unwrap();
        for event in &result.events {
            let h = event.histogram;
            let expected = if h.fatal > 0 {
                3
            } else if h.serious > 0 {
                2
            } else if h.slight > 0 {
                1
            } else {
                0
            };
            assert_eq!(event.severity.ordinal(), expected);
            assert_eq!(event.color, event.severity.color());
        }
    }

    #[test]
    fn normalize_id_strips_float_suffix_only_for_integers() {
        assert_eq!(normalize_id(" 12.0 "), "12");
        assert_eq!(normalize_id("12"), "12");
        assert_eq!(normalize_id("12.05"), "12.05");
        assert_eq!(normalize_id("A.0"), "A.0");
        assert_eq!(normalize_id(".0"), ".0");
    }

    #[test]
    fn run_reads_csv_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = sample_inputs();
        inputs.accidents.write_csv(&dir.path().join(ACCIDENTS_CSV)).unwrap();
        inputs.vehicles.write_csv(&dir.path().join(VEHICLES_CSV)).unwrap();
        inputs.participants.write_csv(&dir.path().join(PARTICIPANTS_CSV)).unwrap();

        let result = run(&EnrichArgs::in_dir(dir.path())).unwrap();
        assert_eq!(result.events.len(), 3);
    }

    #[test]
    fn missing_input_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&EnrichArgs::in_dir(dir.path())).unwrap_err();
        assert!(matches!(err, EnrichError::Load { ref path, .. } if path.ends_with(ACCIDENTS_CSV)));
    }
}
