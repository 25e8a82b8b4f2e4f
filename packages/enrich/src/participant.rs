//! Per-participant classification.
//!
//! Each participant row is projected into a [`ClassifiedParticipant`]:
//! severity from the outcome code, vehicle category via the vehicle join,
//! and one severity marker per [`VulnerableCategory`].

use std::collections::{BTreeSet, HashMap};

use accident_map_accident_models::{
    NOT_APPLICABLE, ParticipantRole, Severity, VehicleCategory, VulnerableCategory,
};
use accident_map_relation::{Relation, RelationError};

use crate::normalize_id;

/// Per-category severity markers for a participant or an accident.
///
/// A marker is [`NOT_APPLICABLE`] (`-1`) unless the participant belongs to
/// that category, in which case it holds the participant's severity
/// ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VulnerableMarkers([i8; 5]);

impl Default for VulnerableMarkers {
    fn default() -> Self {
        Self([NOT_APPLICABLE; 5])
    }
}

impl VulnerableMarkers {
    /// Computes the markers for one participant.
    #[must_use]
    pub fn classify(
        severity: Severity,
        vehicle: Option<VehicleCategory>,
        role: Option<ParticipantRole>,
    ) -> Self {
        let mut markers = Self::default();
        for &category in VulnerableCategory::all() {
            if category.matches(vehicle, role) {
                #[allow(clippy::cast_possible_wrap)]
                let ordinal = severity.ordinal() as i8;
                markers.0[category.index()] = ordinal;
            }
        }
        markers
    }

    /// Marker value for `category`.
    #[must_use]
    pub const fn get(&self, category: VulnerableCategory) -> i8 {
        self.0[category.index()]
    }

    /// Element-wise maximum with `other`.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        let mut out = self;
        for (a, b) in out.0.iter_mut().zip(other.0) {
            *a = (*a).max(b);
        }
        out
    }
}

/// A participant after severity and vehicle-category derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedParticipant {
    /// Normalized identifier of the owning accident.
    pub event_id: String,
    /// Severity derived from the outcome code.
    pub severity: Severity,
    /// Raw vehicle type code from the joined vehicle, if any.
    pub vehicle_type: Option<String>,
    /// Category of the joined vehicle, if the code is known.
    pub vehicle_category: Option<VehicleCategory>,
    /// Role of the participant, if the code is known.
    pub role: Option<ParticipantRole>,
    /// Per-category severity markers.
    pub markers: VulnerableMarkers,
}

/// Result of classifying the participants relation.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// One entry per participant row.
    pub participants: Vec<ClassifiedParticipant>,
    /// Participants whose vehicle reference matched no vehicle.
    pub unmatched_vehicle_refs: usize,
    /// Distinct non-empty vehicle type codes with no category mapping.
    pub unmapped_vehicle_codes: BTreeSet<String>,
}

/// Builds the vehicle id -> vehicle type code lookup.
///
/// When an identifier occurs more than once the first row wins.
///
/// # Errors
///
/// Returns an error if `ID` or `RODZAJ_POJAZDU` is missing.
pub fn vehicle_types(vehicles: &Relation) -> Result<HashMap<String, String>, RelationError> {
    let id = vehicles.require_column("ID", "vehicles")?;
    let kind = vehicles.require_column("RODZAJ_POJAZDU", "vehicles")?;

    let mut map = HashMap::with_capacity(vehicles.len());
    for row in vehicles.rows() {
        let key = normalize_id(&row[id]);
        if key.is_empty() {
            continue;
        }
        map.entry(key).or_insert_with(|| row[kind].trim().to_owned());
    }
    Ok(map)
}

/// Classifies every participant row.
///
/// # Errors
///
/// Returns an error if a required participant column is missing.
pub fn classify_participants(
    participants: &Relation,
    vehicle_types: &HashMap<String, String>,
) -> Result<Classification, RelationError> {
    let event_col = participants.require_column("ZSZD_ID", "participants")?;
    let outcome_col = participants.require_column("STUC_KOD", "participants")?;
    let role_col = participants.require_column("SSRU_KOD", "participants")?;
    let vehicle_col = participants.require_column("ZSPO_ID", "participants")?;

    let mut out = Classification {
        participants: Vec::with_capacity(participants.len()),
        ..Classification::default()
    };

    for row in participants.rows() {
        let severity = Severity::from_outcome_code(&row[outcome_col]);
        let role = ParticipantRole::from_code(&row[role_col]);

        let vehicle_ref = normalize_id(&row[vehicle_col]);
        let vehicle_type = if vehicle_ref.is_empty() {
            None
        } else {
            let found = vehicle_types.get(&vehicle_ref).cloned();
            if found.is_none() {
                out.unmatched_vehicle_refs += 1;
            }
            found
        };

        let vehicle_category = vehicle_type.as_deref().and_then(VehicleCategory::from_code);
        if vehicle_category.is_none()
            && let Some(code) = vehicle_type.as_deref()
            && !code.is_empty()
        {
            out.unmapped_vehicle_codes.insert(code.to_owned());
        }

        out.participants.push(ClassifiedParticipant {
            event_id: normalize_id(&row[event_col]),
            severity,
            vehicle_type,
            vehicle_category,
            role,
            markers: VulnerableMarkers::classify(severity, vehicle_category, role),
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
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

    #[test]
    fn markers_only_set_for_matching_category() {
        let markers = VulnerableMarkers::classify(
            Severity::Fatal,
            Some(VehicleCategory::Bicycle),
            Some(ParticipantRole::Driver),
        );
        assert_eq!(markers.get(VulnerableCategory::Cyclist), 3);
        assert_eq!(markers.get(VulnerableCategory::Motorcyclist), -1);
        assert_eq!(markers.get(VulnerableCategory::Pedestrian), -1);
        assert_eq!(markers.get(VulnerableCategory::PersonalDevice), -1);
        assert_eq!(markers.get(VulnerableCategory::OtherVulnerable), -1);
    }

    #[test]
    fn role_based_markers() {
        let pedestrian =
            VulnerableMarkers::classify(Severity::DamageOnly, None, Some(ParticipantRole::Pedestrian));
        assert_eq!(pedestrian.get(VulnerableCategory::Pedestrian), 0);

        let other = VulnerableMarkers::classify(
            Severity::Serious,
            None,
            Some(ParticipantRole::OtherVulnerable),
        );
        assert_eq!(other.get(VulnerableCategory::OtherVulnerable), 2);
        assert_eq!(other.get(VulnerableCategory::Pedestrian), -1);
    }

    #[test]
    fn markers_max_keeps_sentinel_only_when_nobody_qualifies() {
        let a = VulnerableMarkers::classify(
            Severity::Slight,
            Some(VehicleCategory::Motorcycle),
            None,
        );
        let b = VulnerableMarkers::classify(
            Severity::Serious,
            Some(VehicleCategory::Motorcycle),
            None,
        );
        let merged = a.max(b).max(VulnerableMarkers::default());
        assert_eq!(merged.get(VulnerableCategory::Motorcyclist), 2);
        assert_eq!(merged.get(VulnerableCategory::Cyclist), -1);
    }

    #[test]
    fn first_vehicle_with_an_id_wins() {
        let vehicles = relation(&[
            &[("ID", "7"), ("RODZAJ_POJAZDU", "IS101")],
            &[("ID", "7"), ("RODZAJ_POJAZDU", "IS121")],
            &[("ID", ""), ("RODZAJ_POJAZDU", "IS03")],
        ]);
        let map = vehicle_types(&vehicles).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("7").map(String::as_str), Some("IS101"));
    }

    #[test]
    fn classifies_through_vehicle_join() {
        let vehicles = relation(&[
            &[("ID", "7"), ("RODZAJ_POJAZDU", "IS241")],
            &[("ID", "8"), ("RODZAJ_POJAZDU", "IS999")],
        ]);
        let participants = relation(&[
            &[("ZSZD_ID", "1"), ("STUC_KOD", "RC"), ("SSRU_KOD", "K"), ("ZSPO_ID", "7.0")],
            &[("ZSZD_ID", "1"), ("STUC_KOD", ""), ("SSRU_KOD", "P"), ("ZSPO_ID", "8")],
            &[("ZSZD_ID", "2"), ("STUC_KOD", "RL"), ("SSRU_KOD", "I"), ("ZSPO_ID", "")],
            &[("ZSZD_ID", "2"), ("STUC_KOD", "ZC"), ("SSRU_KOD", "K"), ("ZSPO_ID", "99")],
        ]);

        let result = classify_participants(&participants, &vehicle_types(&vehicles).unwrap()).unwrap();
        let p = &result.participants;

        assert_eq!(p[0].vehicle_category, Some(VehicleCategory::PersonalTransportDevice));
        assert_eq!(p[0].markers.get(VulnerableCategory::PersonalDevice), 2);
        assert_eq!(p[1].severity, Severity::DamageOnly);
        assert_eq!(p[1].vehicle_type.as_deref(), Some("IS999"));
        assert_eq!(p[1].vehicle_category, None);
        assert_eq!(p[2].vehicle_type, None);
        assert_eq!(p[2].markers.get(VulnerableCategory::Pedestrian), 1);
        assert_eq!(p[3].vehicle_type, None);

        assert_eq!(result.unmatched_vehicle_refs, 1);
        assert_eq!(
            result.unmapped_vehicle_codes.into_iter().collect::<Vec<_>>(),
            ["IS999"]
        );
    }

    #[test]
    fn missing_column_is_an_error() {
        let participants = relation(&[&[("ZSZD_ID", "1")]]);
        let err = classify_participants(&participants, &HashMap::new()).unwrap_err();
        assert!(matches!(err, RelationError::MissingColumn { .. }));
    }
}
