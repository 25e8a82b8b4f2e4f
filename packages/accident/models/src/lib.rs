#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Accident severity, participant and region lookup tables.
//!
//! This crate defines the fixed dictionaries used across the accident-map
//! pipeline. SEWIK source codes (outcome codes, participant role codes,
//! vehicle type codes and voivodeship labels) are normalized into the
//! typed enums defined here.

pub mod vehicle;
pub mod voivodeship;

use strum_macros::{AsRefStr, Display, EnumString};

pub use vehicle::VehicleCategory;
pub use voivodeship::Voivodeship;

/// Sentinel stored in a vulnerable-user marker when the participant does
/// not belong to that category.
pub const NOT_APPLICABLE: i8 = -1;

/// RGBA display color for a severity level.
pub type Rgba = [u8; 4];

/// Injury severity of a participant or an accident, from 0 (damage only)
/// to 3 (fatal).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Level 0: material damage only
    #[default]
    DamageOnly = 0,
    /// Level 1: slightly injured (`RL`)
    Slight = 1,
    /// Level 2: seriously injured (`RC`)
    Serious = 2,
    /// Level 3: killed at the scene or died within 30 days (`ZC`, `ZM`)
    Fatal = 3,
}

impl Severity {
    /// Maps a SEWIK outcome code (`STUC_KOD`) to a severity.
    ///
    /// Empty and unrecognized codes map to [`Severity::DamageOnly`].
    #[must_use]
    pub fn from_outcome_code(code: &str) -> Self {
        match code.trim() {
            "RL" => Self::Slight,
            "RC" => Self::Serious,
            "ZC" | "ZM" => Self::Fatal,
            _ => Self::DamageOnly,
        }
    }

    /// Returns the numeric ordinal of this severity.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Returns the map display color for this severity.
    #[must_use]
    pub const fn color(self) -> Rgba {
        match self {
            Self::DamageOnly => [128, 128, 128, 160],
            Self::Slight => [255, 255, 0, 160],
            Self::Serious => [255, 165, 0, 160],
            Self::Fatal => [255, 0, 0, 160],
        }
    }

    /// Short property name of the histogram bucket for this severity.
    #[must_use]
    pub const fn bucket_name(self) -> &'static str {
        match self {
            Self::DamageOnly => "dmg",
            Self::Slight => "sli",
            Self::Serious => "ser",
            Self::Fatal => "fat",
        }
    }

    /// Returns all variants in ascending order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::DamageOnly, Self::Slight, Self::Serious, Self::Fatal]
    }
}

/// Role of a participant in an accident (`SSRU_KOD`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ParticipantRole {
    /// Kierujący
    #[strum(serialize = "K")]
    Driver,
    /// Pasażer
    #[strum(serialize = "P")]
    Passenger,
    /// Pieszy
    #[strum(serialize = "I")]
    Pedestrian,
    /// Uczestnik wymagający rozpoznania (other vulnerable road user)
    #[strum(serialize = "O")]
    OtherVulnerable,
}

impl ParticipantRole {
    /// Parses a raw role code, returning `None` for empty or unknown codes.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        code.trim().parse().ok()
    }
}

/// Vulnerable road user categories tracked per accident.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum VulnerableCategory {
    /// Rider of a bicycle
    #[strum(serialize = "row")]
    Cyclist,
    /// Rider of a motorcycle
    #[strum(serialize = "mot")]
    Motorcyclist,
    /// Pedestrian
    #[strum(serialize = "pie")]
    Pedestrian,
    /// User of a personal transport device (UTO)
    #[strum(serialize = "uto")]
    PersonalDevice,
    /// Other vulnerable road user
    #[strum(serialize = "uwr")]
    OtherVulnerable,
}

impl VulnerableCategory {
    /// Returns all variants in output column order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Cyclist,
            Self::Motorcyclist,
            Self::Pedestrian,
            Self::PersonalDevice,
            Self::OtherVulnerable,
        ]
    }

    /// Whether a participant with the given vehicle category and role
    /// belongs to this category.
    #[must_use]
    pub fn matches(self, vehicle: Option<VehicleCategory>, role: Option<ParticipantRole>) -> bool {
        match self {
            Self::Cyclist => vehicle == Some(VehicleCategory::Bicycle),
            Self::Motorcyclist => vehicle == Some(VehicleCategory::Motorcycle),
            Self::Pedestrian => role == Some(ParticipantRole::Pedestrian),
            Self::PersonalDevice => vehicle == Some(VehicleCategory::PersonalTransportDevice),
            Self::OtherVulnerable => role == Some(ParticipantRole::OtherVulnerable),
        }
    }

    /// Position of this category in [`Self::all`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}
