//! Polish voivodeship (region) utilities.
//!
//! Provides the 16 voivodeships in canonical order together with their
//! stable numeric TERYT codes.

use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Prefix prepended to voivodeship names in raw SEWIK `WOJ` values.
pub const LABEL_PREFIX: &str = "WOJ. ";

/// One of the 16 Polish voivodeships.
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
    IntoStaticStr,
)]
pub enum Voivodeship {
    #[strum(serialize = "DOLNOŚLĄSKIE")]
    Dolnoslaskie,
    #[strum(serialize = "KUJAWSKO-POMORSKIE")]
    KujawskoPomorskie,
    #[strum(serialize = "LUBELSKIE")]
    Lubelskie,
    #[strum(serialize = "LUBUSKIE")]
    Lubuskie,
    #[strum(serialize = "ŁÓDZKIE")]
    Lodzkie,
    #[strum(serialize = "MAŁOPOLSKIE")]
    Malopolskie,
    #[strum(serialize = "MAZOWIECKIE")]
    Mazowieckie,
    #[strum(serialize = "OPOLSKIE")]
    Opolskie,
    #[strum(serialize = "PODKARPACKIE")]
    Podkarpackie,
    #[strum(serialize = "PODLASKIE")]
    Podlaskie,
    #[strum(serialize = "POMORSKIE")]
    Pomorskie,
    #[strum(serialize = "ŚLĄSKIE")]
    Slaskie,
    #[strum(serialize = "ŚWIĘTOKRZYSKIE")]
    Swietokrzyskie,
    #[strum(serialize = "WARMIŃSKO-MAZURSKIE")]
    WarminskoMazurskie,
    #[strum(serialize = "WIELKOPOLSKIE")]
    Wielkopolskie,
    #[strum(serialize = "ZACHODNIOPOMORSKIE")]
    Zachodniopomorskie,
}

impl Voivodeship {
    /// Returns all voivodeships in canonical (alphabetical by code) order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Dolnoslaskie,
            Self::KujawskoPomorskie,
            Self::Lubelskie,
            Self::Lubuskie,
            Self::Lodzkie,
            Self::Malopolskie,
            Self::Mazowieckie,
            Self::Opolskie,
            Self::Podkarpackie,
            Self::Podlaskie,
            Self::Pomorskie,
            Self::Slaskie,
            Self::Swietokrzyskie,
            Self::WarminskoMazurskie,
            Self::Wielkopolskie,
            Self::Zachodniopomorskie,
        ]
    }

    /// Numeric TERYT code (even numbers 2 through 32).
    #[must_use]
    pub const fn code(self) -> u8 {
        (self as u8 + 1) * 2
    }

    /// Upper-case Polish name, as used in output filenames.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Parses a raw `WOJ` label such as `"WOJ. MAZOWIECKIE"` or
    /// `"mazowieckie"`.
    ///
    /// Returns `None` when the label does not name a voivodeship.
    #[must_use]
    pub fn from_label(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let name = trimmed.strip_prefix(LABEL_PREFIX).unwrap_or(trimmed);
        name.trim().to_uppercase().parse().ok()
    }
}
