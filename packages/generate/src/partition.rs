//! Grouping of enriched accidents into (year, voivodeship) partitions.

use std::collections::BTreeMap;

use accident_map_accident_models::Voivodeship;
use accident_map_enrich::EnrichedEvent;

/// Extension of the partition files.
pub const EXTENSION: &str = "geojson";

/// Identity of one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey {
    /// Accident year.
    pub year: i32,
    /// Accident region.
    pub voivodeship: Voivodeship,
}

impl PartitionKey {
    /// Partition key of an accident, `None` when its year or region is
    /// unknown.
    #[must_use]
    pub fn of(event: &EnrichedEvent) -> Option<Self> {
        Some(Self {
            year: event.year?,
            voivodeship: event.voivodeship?,
        })
    }

    /// Collection name, e.g. `accidents_2019_MAZOWIECKIE`.
    #[must_use]
    pub fn stem(&self) -> String {
        format!("accidents_{}_{}", self.year, self.voivodeship.name())
    }

    /// Output file name, e.g. `accidents_2019_MAZOWIECKIE.geojson`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{EXTENSION}", self.stem())
    }
}

/// Groups accidents by partition, ordered by year and then canonical
/// voivodeship order. Accidents keep their input order within a partition;
/// accidents without a key are left out and empty partitions never appear.
#[must_use]
pub fn partition(events: &[EnrichedEvent]) -> BTreeMap<PartitionKey, Vec<&EnrichedEvent>> {
    let mut partitions: BTreeMap<PartitionKey, Vec<&EnrichedEvent>> = BTreeMap::new();
    for event in events {
        if let Some(key) = PartitionKey::of(event) {
            partitions.entry(key).or_default().push(event);
        }
    }
    partitions
}
