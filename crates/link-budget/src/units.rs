//! Unit normalization
//!
//! Every physical quantity class has a unit enum and a total conversion into the
//! engine's canonical unit:
//!
//! | Class      | Canonical | Accepted tags          |
//! |------------|-----------|------------------------|
//! | Power      | dBm       | dBm, mW, W             |
//! | Length     | m         | m, cm, mm, km          |
//! | Wavelength | m (via nm)| nm, μm, m              |
//! | Efficiency | fraction  | %, decimal             |
//! | Loss       | dB        | dB, linear             |
//! | Angle      | rad       | rad, µrad, nrad        |
//!
//! Conversions never fail for a finite input. Unknown tags are rejected when parsed.

use std::str::FromStr;

use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::error::{EngineError, Result};

/// A unit tag belonging to one quantity class.
pub trait Unit: FromStr + Default + Copy + Into<&'static str> {
    /// Quantity class name used in error messages
    const QUANTITY: &'static str;
}

/// Parse an optional unit tag. A missing tag selects the canonical unit.
pub fn parse_unit<U: Unit>(tag: Option<&str>) -> Result<U> {
    match tag.map(str::trim) {
        None | Some("") => Ok(U::default()),
        Some(t) => U::from_str(t).map_err(|_| EngineError::InvalidUnit {
            quantity: U::QUANTITY,
            unit: t.to_string(),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum PowerUnit {
    #[default]
    #[strum(to_string = "dBm")]
    Dbm,
    #[strum(to_string = "mW")]
    Milliwatt,
    #[strum(to_string = "W")]
    Watt,
}

impl Unit for PowerUnit {
    const QUANTITY: &'static str = "power";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum LengthUnit {
    #[default]
    #[strum(to_string = "m")]
    Meter,
    #[strum(to_string = "cm")]
    Centimeter,
    #[strum(to_string = "mm")]
    Millimeter,
    #[strum(to_string = "km")]
    Kilometer,
}

impl Unit for LengthUnit {
    const QUANTITY: &'static str = "length";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum WavelengthUnit {
    #[strum(to_string = "nm")]
    Nanometer,
    #[strum(to_string = "μm", serialize = "µm", serialize = "um")]
    Micrometer,
    #[default]
    #[strum(to_string = "m")]
    Meter,
}

impl Unit for WavelengthUnit {
    const QUANTITY: &'static str = "wavelength";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum EfficiencyUnit {
    #[strum(to_string = "%", serialize = "percent")]
    Percent,
    #[default]
    #[strum(to_string = "decimal")]
    Decimal,
}

impl Unit for EfficiencyUnit {
    const QUANTITY: &'static str = "efficiency";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum LossUnit {
    #[default]
    #[strum(to_string = "dB")]
    Db,
    #[strum(to_string = "linear")]
    Linear,
}

impl Unit for LossUnit {
    const QUANTITY: &'static str = "loss";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum AngleUnit {
    #[default]
    #[strum(to_string = "rad")]
    Radian,
    #[strum(to_string = "µrad", serialize = "μrad", serialize = "urad")]
    Microradian,
    #[strum(to_string = "nrad")]
    Nanoradian,
}

impl Unit for AngleUnit {
    const QUANTITY: &'static str = "angle";
}

// ---- dB / linear primitives ----

pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

pub fn linear_to_db(linear: f64) -> f64 {
    10.0 * linear.log10()
}

pub fn mw_to_dbm(mw: f64) -> f64 {
    linear_to_db(mw)
}

pub fn dbm_to_mw(dbm: f64) -> f64 {
    db_to_linear(dbm)
}

pub fn w_to_dbm(watts: f64) -> f64 {
    mw_to_dbm(watts * 1000.0)
}

pub fn dbm_to_w(dbm: f64) -> f64 {
    dbm_to_mw(dbm) / 1000.0
}

// ---- Forward conversions (into canonical units) ----

pub fn power_to_dbm(value: f64, unit: PowerUnit) -> f64 {
    match unit {
        PowerUnit::Dbm => value,
        PowerUnit::Milliwatt => mw_to_dbm(value),
        PowerUnit::Watt => w_to_dbm(value),
    }
}

pub fn length_to_m(value: f64, unit: LengthUnit) -> f64 {
    match unit {
        LengthUnit::Meter => value,
        LengthUnit::Centimeter => value / 100.0,
        LengthUnit::Millimeter => value / 1000.0,
        LengthUnit::Kilometer => value * 1000.0,
    }
}

/// Wavelength on the nanometre scale.
///
/// NOTE: the `m` tag is scaled by 1e9 onto the nanometre table like every other tag,
/// and [`wavelength_to_m`] scales back by 1e-9. Other tools consuming saved records
/// rely on this ratio table, so it is kept as is.
pub fn wavelength_to_nm(value: f64, unit: WavelengthUnit) -> f64 {
    match unit {
        WavelengthUnit::Nanometer => value,
        WavelengthUnit::Micrometer => value * 1000.0,
        WavelengthUnit::Meter => value * 1e9,
    }
}

pub fn wavelength_to_m(value: f64, unit: WavelengthUnit) -> f64 {
    wavelength_to_nm(value, unit) * 1e-9
}

pub fn efficiency_to_percent(value: f64, unit: EfficiencyUnit) -> f64 {
    match unit {
        EfficiencyUnit::Percent => value,
        EfficiencyUnit::Decimal => value * 100.0,
    }
}

/// Efficiency as a 0-1 fraction
pub fn efficiency_to_fraction(value: f64, unit: EfficiencyUnit) -> f64 {
    efficiency_to_percent(value, unit) / 100.0
}

pub fn loss_to_db(value: f64, unit: LossUnit) -> f64 {
    match unit {
        LossUnit::Db => value,
        LossUnit::Linear => linear_to_db(value),
    }
}

pub fn angle_to_rad(value: f64, unit: AngleUnit) -> f64 {
    match unit {
        AngleUnit::Radian => value,
        AngleUnit::Microradian => value * 1e-6,
        AngleUnit::Nanoradian => value * 1e-9,
    }
}

// ---- Inverse conversions (out of canonical units) ----

pub fn power_from_dbm(dbm: f64, unit: PowerUnit) -> f64 {
    match unit {
        PowerUnit::Dbm => dbm,
        PowerUnit::Milliwatt => dbm_to_mw(dbm),
        PowerUnit::Watt => dbm_to_w(dbm),
    }
}

pub fn length_from_m(meters: f64, unit: LengthUnit) -> f64 {
    match unit {
        LengthUnit::Meter => meters,
        LengthUnit::Centimeter => meters * 100.0,
        LengthUnit::Millimeter => meters * 1000.0,
        LengthUnit::Kilometer => meters / 1000.0,
    }
}

pub fn wavelength_from_m(meters: f64, unit: WavelengthUnit) -> f64 {
    let nm = meters * 1e9;
    match unit {
        WavelengthUnit::Nanometer => nm,
        WavelengthUnit::Micrometer => nm / 1000.0,
        WavelengthUnit::Meter => nm * 1e-9,
    }
}

pub fn loss_from_db(db: f64, unit: LossUnit) -> f64 {
    match unit {
        LossUnit::Db => db,
        LossUnit::Linear => db_to_linear(db),
    }
}

pub fn angle_from_rad(rad: f64, unit: AngleUnit) -> f64 {
    match unit {
        AngleUnit::Radian => rad,
        AngleUnit::Microradian => rad * 1e6,
        AngleUnit::Nanoradian => rad * 1e9,
    }
}

/// Convert a power value between any two power units, pivoting through dBm.
pub fn convert_power(value: f64, from: PowerUnit, to: PowerUnit) -> f64 {
    power_from_dbm(power_to_dbm(value, from), to)
}
