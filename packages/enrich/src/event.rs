//! Accident row parsing: coordinates, region and timestamp.

use accident_map_accident_models::Voivodeship;
use accident_map_relation::{Relation, RelationError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::normalize_id;

/// Column candidates for longitude, in order of preference.
pub const LONGITUDE_COLUMNS: &[&str] = &["lon", "WSP_GPS_X"];

/// Column candidates for latitude, in order of preference.
pub const LATITUDE_COLUMNS: &[&str] = &["lat", "WSP_GPS_Y"];

/// Datetime layouts accepted for `DATA_ZDARZENIA` (besides RFC 3339 and a
/// bare date).
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Column positions of the accident fields used by enrichment.
#[derive(Debug, Clone, Copy)]
pub struct EventColumns {
    id: usize,
    timestamp: usize,
    region: usize,
    lon: usize,
    lat: usize,
}

impl EventColumns {
    /// Resolves the accident columns.
    ///
    /// # Errors
    ///
    /// Returns an error if a required column is missing.
    pub fn resolve(events: &Relation) -> Result<Self, RelationError> {
        Ok(Self {
            id: events.require_column("ID", "accidents")?,
            timestamp: events.require_column("DATA_ZDARZENIA", "accidents")?,
            region: events.require_column("WOJ", "accidents")?,
            lon: events.require_any_column(LONGITUDE_COLUMNS, "accidents")?,
            lat: events.require_any_column(LATITUDE_COLUMNS, "accidents")?,
        })
    }
}

/// An accident with coordinates, before participant data is joined.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseEvent {
    /// Normalized accident identifier.
    pub id: String,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Region, `None` if the label is not a known voivodeship.
    pub voivodeship: Option<Voivodeship>,
    /// Parsed timestamp, `None` if unparseable.
    pub timestamp: Option<NaiveDateTime>,
}

impl BaseEvent {
    /// Parses one accident row. Returns `None` when either coordinate is
    /// missing or not a finite number.
    #[must_use]
    pub fn from_row(row: &[String], cols: EventColumns) -> Option<Self> {
        let longitude = parse_coordinate(&row[cols.lon])?;
        let latitude = parse_coordinate(&row[cols.lat])?;

        Some(Self {
            id: normalize_id(&row[cols.id]),
            longitude,
            latitude,
            voivodeship: Voivodeship::from_label(&row[cols.region]),
            timestamp: parse_timestamp(&row[cols.timestamp]),
        })
    }
}

/// Parses a coordinate, accepting a decimal comma.
#[must_use]
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parses an accident timestamp. Returns `None` for empty or unrecognized
/// values.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Rounds a coordinate to 6 decimal places (about 0.11 m), halves to even.
#[must_use]
pub fn round_coordinate(value: f64) -> f64 {
    (value * 1e6).round_ties_even() / 1e6
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike as _, Timelike as _};

    use super::*;

    #[test]
    fn parses_supported_timestamp_layouts() {
        let date = parse_timestamp("2019-03-04").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2019, 3, 4));
        assert_eq!(date.hour(), 0);

        let dt = parse_timestamp("2019-03-04 17:25:00").unwrap();
        assert_eq!(dt.hour(), 17);
        assert_eq!(dt.minute(), 25);

        assert!(parse_timestamp("2019-03-04T17:25").is_some());
        assert!(parse_timestamp("2019-03-04T17:25:00.123").is_some());
        assert!(parse_timestamp("2019-03-04T17:25:00+01:00").is_some());
    }

    #[test]
    fn unparseable_timestamps_are_none() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp("2019-13-40"), None);
    }

    #[test]
    fn coordinates() {
        assert_eq!(parse_coordinate("21.0122"), Some(21.0122));
        assert_eq!(parse_coordinate(" 52,2297 "), Some(52.2297));
        assert_eq!(parse_coordinate(""), None);
        assert_eq!(parse_coordinate("NaN"), None);
        assert_eq!(parse_coordinate("52*13'"), None);
    }

    #[test]
    fn rounding_to_six_places() {
        assert_eq!(round_coordinate(21.012_345_678), 21.012_346);
        assert_eq!(round_coordinate(-0.000_000_4), 0.0);
        assert_eq!(round_coordinate(52.5), 52.5);
    }

    #[test]
    fn rounding_halves_go_to_even() {
        assert_eq!(round_coordinate(52.123_456_5), 52.123_456);
        assert_eq!(round_coordinate(19.456_789_5), 19.456_79);
        assert_eq!(round_coordinate(0.000_002_5), 0.000_002);
        assert_eq!(round_coordinate(-0.000_002_5), -0.000_002);
    }

    #[test]
    fn row_without_coordinates_is_skipped() {
        let events = Relation::new(
            ["ID", "DATA_ZDARZENIA", "WOJ", "lon", "lat"]
                .map(str::to_owned)
                .to_vec(),
        );
        let cols = EventColumns::resolve(&events).unwrap();

        let row: Vec<String> = ["1", "2020-01-01", "OPOLSKIE", "", "50.1"]
            .map(str::to_owned)
            .to_vec();
        assert!(BaseEvent::from_row(&row, cols).is_none());

        let row: Vec<String> = ["2", "garbage", "NOWHERE", "17.9", "50.6"]
            .map(str::to_owned)
            .to_vec();
        let event = BaseEvent::from_row(&row, cols).unwrap();
        assert_eq!(event.voivodeship, None);
        assert_eq!(event.timestamp, None);
    }
}
