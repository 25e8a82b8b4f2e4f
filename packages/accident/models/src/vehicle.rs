//! SEWIK vehicle type code utilities.
//!
//! Maps `RODZAJ_POJAZDU` codes (`IS01`..`IS32`, the `IS1xx` series used
//! from 2015-11-01 and the `IS2xx` series of the current dictionary) to a
//! coarse [`VehicleCategory`].

use strum_macros::{AsRefStr, Display, EnumString};

/// Coarse vehicle category shared by several SEWIK vehicle type codes.
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
pub enum VehicleCategory {
    /// Rower
    #[strum(serialize = "Rower")]
    Bicycle,
    /// Motorower
    #[strum(serialize = "Motorower")]
    Moped,
    /// Motocykl
    #[strum(serialize = "Motocykl")]
    Motorcycle,
    /// Samochód osobowy
    #[strum(serialize = "Samochód osobowy")]
    Car,
    /// Autobus
    #[strum(serialize = "Autobus")]
    Bus,
    /// Samochód ciężarowy
    #[strum(serialize = "Samochód ciężarowy")]
    Truck,
    /// Ciągnik rolniczy (includes slow-moving vehicles)
    #[strum(serialize = "Ciągnik rolniczy")]
    Tractor,
    /// Tramwaj/trolejbus
    #[strum(serialize = "Tramwaj/trolejbus")]
    TramTrolleybus,
    /// Trolejbus (legacy `IS16` only)
    #[strum(serialize = "Trolejbus")]
    Trolleybus,
    /// Pojazd zaprzęgowy
    #[strum(serialize = "Pojazd zaprzęgowy")]
    HorseDrawn,
    /// Pociąg
    #[strum(serialize = "Pociąg")]
    Train,
    /// Pojazd uprzywilejowany
    #[strum(serialize = "Pojazd uprzywilejowany")]
    Emergency,
    /// Inny
    #[strum(serialize = "Inny")]
    Other,
    /// Nieustalony
    #[strum(serialize = "Nieustalony")]
    Undetermined,
    /// Pojazd przewożący materiały niebezpieczne
    #[strum(serialize = "Pojazd mat. niebezp.")]
    HazardousMaterials,
    /// Czterokołowiec
    #[strum(serialize = "Quad")]
    Quad,
    /// Hulajnoga elektryczna
    #[strum(serialize = "Hulajnoga elektryczna")]
    ElectricScooter,
    /// Urządzenie transportu osobistego
    #[strum(serialize = "UTO")]
    PersonalTransportDevice,
}

impl VehicleCategory {
    /// Maps a raw `RODZAJ_POJAZDU` code to its category.
    ///
    /// Returns `None` for empty or unrecognized codes.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let category = match code.trim() {
            "IS01" | "IS101" | "IS201" => Self::Bicycle,
            "IS02" | "IS102" | "IS202" => Self::Moped,
            "IS03" | "IS27" | "IS28" | "IS127" | "IS128" | "IS227" | "IS228" => Self::Motorcycle,
            "IS04" | "IS05" | "IS06" | "IS21" | "IS121" | "IS221" => Self::Car,
            "IS07" | "IS08" | "IS107" | "IS108" | "IS207" | "IS208" => Self::Bus,
            "IS09" | "IS10" | "IS11" | "IS31" | "IS32" | "IS131" | "IS132" | "IS231" | "IS232" => {
                Self::Truck
            }
            "IS12" | "IS13" | "IS14" | "IS22" | "IS122" | "IS222" => Self::Tractor,
            "IS15" | "IS23" | "IS123" | "IS223" => Self::TramTrolleybus,
            "IS16" => Self::Trolleybus,
            "IS17" => Self::HorseDrawn,
            "IS18" | "IS118" | "IS218" => Self::Train,
            "IS19" => Self::Emergency,
            "IS20" | "IS120" | "IS220" => Self::Other,
            "IS25" | "IS125" | "IS225" => Self::Undetermined,
            "IS26" => Self::HazardousMaterials,
            "IS29" | "IS30" | "IS129" | "IS130" | "IS229" | "IS230" => Self::Quad,
            "IS240" => Self::ElectricScooter,
            "IS241" => Self::PersonalTransportDevice,
            _ => return None,
        };
        Some(category)
    }
}
