//! Per-accident aggregation of classified participants.

use std::collections::HashMap;

use accident_map_accident_models::Severity;

use crate::participant::{ClassifiedParticipant, VulnerableMarkers};

/// Count of participants per severity level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityHistogram {
    /// Participants with no injury (`dmg`).
    pub damage_only: u32,
    /// Slightly injured participants (`sli`).
    pub slight: u32,
    /// Seriously injured participants (`ser`).
    pub serious: u32,
    /// Killed participants (`fat`).
    pub fatal: u32,
}

impl SeverityHistogram {
    /// Adds one participant with the given severity.
    pub const fn add(&mut self, severity: Severity) {
        match severity {
            Severity::DamageOnly => self.damage_only += 1,
            Severity::Slight => self.slight += 1,
            Severity::Serious => self.serious += 1,
            Severity::Fatal => self.fatal += 1,
        }
    }

    /// Count for one severity bucket.
    #[must_use]
    pub const fn get(&self, severity: Severity) -> u32 {
        match severity {
            Severity::DamageOnly => self.damage_only,
            Severity::Slight => self.slight,
            Severity::Serious => self.serious,
            Severity::Fatal => self.fatal,
        }
    }

    /// Total number of participants counted.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.damage_only + self.slight + self.serious + self.fatal
    }

    /// Accident severity: the most severe non-empty bucket, or
    /// [`Severity::DamageOnly`] when nobody was injured.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        if self.fatal > 0 {
            Severity::Fatal
        } else if self.serious > 0 {
            Severity::Serious
        } else if self.slight > 0 {
            Severity::Slight
        } else {
            Severity::DamageOnly
        }
    }
}

/// Aggregated participant data for one accident.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventAggregate {
    /// Participants per severity.
    pub histogram: SeverityHistogram,
    /// Maximum marker per vulnerable-user category.
    pub vulnerable: VulnerableMarkers,
}

impl EventAggregate {
    fn add(&mut self, participant: &ClassifiedParticipant) {
        self.histogram.add(participant.severity);
        self.vulnerable = self.vulnerable.max(participant.markers);
    }
}

/// Groups participants by accident identifier.
#[must_use]
pub fn aggregate_by_event(participants: &[ClassifiedParticipant]) -> HashMap<String, EventAggregate> {
    let mut by_event: HashMap<String, EventAggregate> = HashMap::new();
    for participant in participants {
        by_event
            .entry(participant.event_id.clone())
            .or_default()
            .add(participant);
    }
    by_event
}
