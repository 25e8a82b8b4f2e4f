//! `GeoJSON` encoding of enriched accidents.

use std::io::{BufWriter, Write as _};
use std::path::Path;

use accident_map_accident_models::{Severity, VulnerableCategory};
use accident_map_enrich::EnrichedEvent;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

use crate::GenerateError;

/// Coordinate reference system name written on every collection.
pub const CRS84: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";

/// Layout of the `dt` property.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Builds the property map of one accident feature.
///
/// Identifiers that are integers are written as numbers so the viewer can
/// compare them without parsing.
#[must_use]
pub fn properties(event: &EnrichedEvent) -> JsonObject {
    let mut props = JsonObject::new();

    let id = event
        .id
        .parse::<i64>()
        .map_or_else(|_| json!(event.id), |n| json!(n));
    props.insert("ID".to_owned(), id);
    props.insert("yr".to_owned(), json!(event.year));
    props.insert("month".to_owned(), json!(event.month));
    props.insert("day".to_owned(), json!(event.day));
    props.insert(
        "dt".to_owned(),
        json!(event.timestamp.map(|t| t.format(DATETIME_FORMAT).to_string())),
    );
    props.insert(
        "WOJ".to_owned(),
        json!(event.voivodeship.map(|v| v.code())),
    );
    props.insert("sev".to_owned(), json!(event.severity.ordinal()));
    props.insert("c".to_owned(), json!(event.color));

    for &severity in Severity::all() {
        props.insert(
            severity.bucket_name().to_owned(),
            json!(event.histogram.get(severity)),
        );
    }
    for &category in VulnerableCategory::all() {
        props.insert(
            category.as_ref().to_owned(),
            json!(event.vulnerable.get(category)),
        );
    }

    props
}

/// Converts one accident into a point feature.
#[must_use]
pub fn feature(event: &EnrichedEvent) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            event.longitude,
            event.latitude,
        ]))),
        id: None,
        properties: Some(properties(event)),
        foreign_members: None,
    }
}

/// Builds a named feature collection tagged with the CRS84 reference
/// system.
#[must_use]
pub fn collection(name: &str, events: &[&EnrichedEvent]) -> FeatureCollection {
    let mut foreign = JsonObject::new();
    foreign.insert("name".to_owned(), json!(name));
    foreign.insert(
        "crs".to_owned(),
        json!({ "type": "name", "properties": { "name": CRS84 } }),
    );

    FeatureCollection {
        bbox: None,
        features: events.iter().map(|&e| feature(e)).collect(),
        foreign_members: Some(foreign),
    }
}

/// Writes a feature collection as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_collection(path: &Path, collection: &FeatureCollection) -> Result<(), GenerateError> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, collection)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
