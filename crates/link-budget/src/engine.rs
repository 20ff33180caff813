//! FSO Link Budget Engine
//!
//! Single deterministic pass over a normalized [`LinkBudgetInput`]:
//! - Diffraction-limited beam divergence per side
//! - Transmit gain from beam shape, receive gain from collecting aperture
//! - Free space path loss
//! - Pointing loss (manual or derived from angular error)
//! - Efficiency, implementation and coupling losses
//! - Received power before and after the optical LNA
//! - Link margin against receiver sensitivity (after LNA)

use std::f64::consts::{LOG10_E, PI};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::units::linear_to_db;

/// Airy-disk divergence factor: theta = 2.44 * lambda / D
pub const DIVERGENCE_FACTOR: f64 = 2.44;

/// Gaussian-beam transmit gain numerator: G_tx = 32 / theta^2
pub const TX_GAIN_NUMERATOR: f64 = 32.0;

/// Margin thresholds (dB)
pub const MARGIN_EXCELLENT_DB: f64 = 6.0;
pub const MARGIN_GOOD_DB: f64 = 3.0;

/// Pointing loss source for one side of the link
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PointingSpec {
    /// Loss supplied directly (dB)
    Manual { loss_db: f64 },
    /// Loss derived from residual angular error (rad) and that side's gain
    Derived { error_rad: f64 },
}

impl PointingSpec {
    pub fn mode(&self) -> PointingMode {
        match self {
            PointingSpec::Manual { .. } => PointingMode::Manual,
            PointingSpec::Derived { .. } => PointingMode::Derived,
        }
    }

    pub fn error_rad(&self) -> Option<f64> {
        match *self {
            PointingSpec::Manual { .. } => None,
            PointingSpec::Derived { error_rad } => Some(error_rad),
        }
    }
}

impl Default for PointingSpec {
    fn default() -> Self {
        PointingSpec::Manual { loss_db: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointingMode {
    Manual,
    Derived,
}

/// Canonical engine input (all values already normalized)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkBudgetInput {
    pub tx_power_dbm: f64,
    /// Fraction in (0, 1]
    pub tx_efficiency: f64,
    /// Fraction in (0, 1]
    pub rx_efficiency: f64,
    pub rx_sensitivity_dbm: Option<f64>,
    /// 0 = no LNA fitted
    pub rx_lna_gain_db: f64,
    pub wavelength_m: f64,
    pub tx_diameter_m: f64,
    pub rx_diameter_m: f64,
    pub distance_m: f64,
    pub implementation_loss_db: f64,
    pub coupling_loss_db: f64,
    pub tx_pointing: PointingSpec,
    pub rx_pointing: PointingSpec,
}

impl LinkBudgetInput {
    /// Reference scenario: 1550 nm, 15 cm apertures, 40 km
    pub fn reference() -> Self {
        Self {
            tx_power_dbm: 34.0,
            tx_efficiency: 0.5,
            rx_efficiency: 0.5,
            rx_sensitivity_dbm: Some(-60.0),
            rx_lna_gain_db: 0.0,
            wavelength_m: 1550e-9,
            tx_diameter_m: 0.15,
            rx_diameter_m: 0.15,
            distance_m: 40_000.0,
            implementation_loss_db: 1.5,
            coupling_loss_db: 4.0,
            tx_pointing: PointingSpec::Manual { loss_db: 1.5 },
            rx_pointing: PointingSpec::Manual { loss_db: 1.5 },
        }
    }

    /// Check every constraint before any computation happens
    pub fn validate(&self) -> Result<()> {
        ensure_finite("tx_power_dbm", self.tx_power_dbm)?;
        ensure_finite("tx_efficiency", self.tx_efficiency)?;
        ensure_finite("rx_efficiency", self.rx_efficiency)?;
        if let Some(s) = self.rx_sensitivity_dbm {
            ensure_finite("rx_sensitivity_dbm", s)?;
        }
        ensure_finite("rx_lna_gain_db", self.rx_lna_gain_db)?;
        ensure_finite("wavelength_m", self.wavelength_m)?;
        ensure_finite("tx_diameter_m", self.tx_diameter_m)?;
        ensure_finite("rx_diameter_m", self.rx_diameter_m)?;
        ensure_finite("distance_m", self.distance_m)?;
        ensure_finite("implementation_loss_db", self.implementation_loss_db)?;
        ensure_finite("coupling_loss_db", self.coupling_loss_db)?;
        validate_pointing("tx", &self.tx_pointing)?;
        validate_pointing("rx", &self.rx_pointing)?;

        ensure_positive("wavelength_m", self.wavelength_m)?;
        ensure_positive("tx_diameter_m", self.tx_diameter_m)?;
        ensure_positive("rx_diameter_m", self.rx_diameter_m)?;
        ensure_positive("distance_m", self.distance_m)?;

        ensure_efficiency("tx_efficiency", self.tx_efficiency)?;
        ensure_efficiency("rx_efficiency", self.rx_efficiency)?;

        if self.rx_lna_gain_db < 0.0 {
            return Err(EngineError::InvalidConfiguration(format!(
                "rx_lna_gain_db must be 0 or positive, use 0 when no LNA is fitted (got {})",
                self.rx_lna_gain_db
            )));
        }
        ensure_non_negative("implementation_loss_db", self.implementation_loss_db)?;
        ensure_non_negative("coupling_loss_db", self.coupling_loss_db)?;

        Ok(())
    }
}

fn ensure_finite(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::NotFinite { field, value })
    }
}

fn ensure_positive(field: &'static str, value: f64) -> Result<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidGeometry { field, value })
    }
}

fn ensure_efficiency(field: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidEfficiency { field, value })
    }
}

fn ensure_non_negative(field: &'static str, value: f64) -> Result<()> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidConfiguration(format!(
            "{} must be 0 or positive (got {})",
            field, value
        )))
    }
}

fn validate_pointing(side: &'static str, spec: &PointingSpec) -> Result<()> {
    match *spec {
        PointingSpec::Manual { loss_db } => {
            if !loss_db.is_finite() {
                return Err(EngineError::NotFinite {
                    field: pointing_field(side, PointingMode::Manual),
                    value: loss_db,
                });
            }
            if loss_db < 0.0 {
                return Err(EngineError::InvalidConfiguration(format!(
                    "{} pointing loss must be 0 or positive (got {})",
                    side, loss_db
                )));
            }
        }
        PointingSpec::Derived { error_rad } => {
            if !error_rad.is_finite() {
                return Err(EngineError::NotFinite {
                    field: pointing_field(side, PointingMode::Derived),
                    value: error_rad,
                });
            }
        }
    }
    Ok(())
}

fn pointing_field(side: &'static str, mode: PointingMode) -> &'static str {
    match (side, mode) {
        ("tx", PointingMode::Manual) => "tx_pointing_loss_db",
        ("tx", PointingMode::Derived) => "tx_pointing_error_rad",
        (_, PointingMode::Manual) => "rx_pointing_loss_db",
        (_, PointingMode::Derived) => "rx_pointing_error_rad",
    }
}

/// Link margin classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginStatus {
    /// margin >= 6 dB
    Excellent,
    /// 3 <= margin < 6 dB
    Good,
    /// 0 < margin < 3 dB
    Marginal,
    /// margin <= 0 dB
    NotViable,
}

impl MarginStatus {
    pub fn classify(margin_db: f64) -> Self {
        if margin_db >= MARGIN_EXCELLENT_DB {
            MarginStatus::Excellent
        } else if margin_db >= MARGIN_GOOD_DB {
            MarginStatus::Good
        } else if margin_db > 0.0 {
            MarginStatus::Marginal
        } else {
            MarginStatus::NotViable
        }
    }

    pub fn is_viable(&self) -> bool {
        !matches!(self, MarginStatus::NotViable)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarginStatus::Excellent => "excellent",
            MarginStatus::Good => "good",
            MarginStatus::Marginal => "viable (marginal)",
            MarginStatus::NotViable => "not viable",
        }
    }
}

impl std::fmt::Display for MarginStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical engine result, before secondary units are attached
#[derive(Debug, Clone, PartialEq)]
pub struct LinkBudget {
    pub tx_divergence_rad: f64,
    pub rx_divergence_rad: f64,
    pub tx_gain_abs: f64,
    pub tx_gain_db: f64,
    pub rx_gain_abs: f64,
    pub rx_gain_db: f64,
    pub path_loss_db: f64,
    pub tx_pointing_loss_db: f64,
    pub rx_pointing_loss_db: f64,
    pub tx_efficiency_loss_db: f64,
    pub rx_efficiency_loss_db: f64,
    pub total_loss_db: f64,
    pub received_power_dbm: f64,
    pub received_power_lna_dbm: f64,
    pub link_margin_db: Option<f64>,
    pub margin_status: Option<MarginStatus>,
}

/// Diffraction-limited beam divergence in radians
pub fn beam_divergence(wavelength_m: f64, diameter_m: f64) -> Result<f64> {
    ensure_positive("wavelength_m", wavelength_m)?;
    ensure_positive("diameter_m", diameter_m)?;
    Ok(DIVERGENCE_FACTOR * wavelength_m / diameter_m)
}

/// Transmit gain (absolute) from beam divergence
pub fn transmit_gain(divergence_rad: f64) -> Result<f64> {
    ensure_positive("divergence_rad", divergence_rad)?;
    Ok(TX_GAIN_NUMERATOR / divergence_rad.powi(2))
}

/// Receive gain (absolute) from collecting aperture
pub fn receive_gain(wavelength_m: f64, diameter_m: f64) -> Result<f64> {
    ensure_positive("wavelength_m", wavelength_m)?;
    ensure_positive("diameter_m", diameter_m)?;
    Ok((PI * diameter_m / wavelength_m).powi(2))
}

/// Free space path loss in dB
pub fn free_space_path_loss(distance_m: f64, wavelength_m: f64) -> Result<f64> {
    ensure_positive("distance_m", distance_m)?;
    ensure_positive("wavelength_m", wavelength_m)?;
    Ok(20.0 * (4.0 * PI * distance_m / wavelength_m).log10())
}

/// Pointing loss in dB (positive magnitude) for one side
pub fn pointing_loss(spec: &PointingSpec, gain_abs: f64) -> f64 {
    match *spec {
        PointingSpec::Manual { loss_db } => loss_db,
        // |10 log10(exp(-G theta^2))| in closed form; exp() underflows for large errors
        PointingSpec::Derived { error_rad } => 10.0 * gain_abs * error_rad.powi(2) * LOG10_E,
    }
}

/// Efficiency expressed as a (non-positive) dB term
pub fn efficiency_loss_db(efficiency: f64) -> f64 {
    linear_to_db(efficiency)
}

/// Run the full budget on a normalized input
pub fn evaluate(input: &LinkBudgetInput) -> Result<LinkBudget> {
    input.validate()?;

    let tx_theta = beam_divergence(input.wavelength_m, input.tx_diameter_m)?;
    let rx_theta = beam_divergence(input.wavelength_m, input.rx_diameter_m)?;

    let tx_gain_abs = transmit_gain(tx_theta)?;
    let rx_gain_abs = receive_gain(input.wavelength_m, input.rx_diameter_m)?;
    let tx_gain_db = linear_to_db(tx_gain_abs);
    let rx_gain_db = linear_to_db(rx_gain_abs);

    let path_loss_db = free_space_path_loss(input.distance_m, input.wavelength_m)?;

    let tx_pointing_loss_db = pointing_loss(&input.tx_pointing, tx_gain_abs);
    let rx_pointing_loss_db = pointing_loss(&input.rx_pointing, rx_gain_abs);

    let tx_efficiency_loss_db = efficiency_loss_db(input.tx_efficiency);
    let rx_efficiency_loss_db = efficiency_loss_db(input.rx_efficiency);

    let total_loss_db = path_loss_db
        + tx_pointing_loss_db
        + rx_pointing_loss_db
        + input.implementation_loss_db
        + input.coupling_loss_db;

    let received_power_dbm = input.tx_power_dbm
        + tx_efficiency_loss_db
        + rx_efficiency_loss_db
        + tx_gain_db
        + rx_gain_db
        - total_loss_db;

    // LNA is a pure post-stage
    let received_power_lna_dbm = received_power_dbm + input.rx_lna_gain_db;

    let link_margin_db = input
        .rx_sensitivity_dbm
        .map(|sensitivity| received_power_lna_dbm - sensitivity);

    // Finite inputs can still overflow (e.g. a subnormal wavelength)
    ensure_finite("tx_gain", tx_gain_abs)?;
    ensure_finite("rx_gain", rx_gain_abs)?;
    ensure_finite("path_loss_db", path_loss_db)?;
    ensure_finite("tx_pointing_loss_db", tx_pointing_loss_db)?;
    ensure_finite("rx_pointing_loss_db", rx_pointing_loss_db)?;
    ensure_finite("received_power_dbm", received_power_dbm)?;
    ensure_finite("received_power_lna_dbm", received_power_lna_dbm)?;
    if let Some(margin) = link_margin_db {
        ensure_finite("link_margin_db", margin)?;
    }

    let margin_status = link_margin_db.map(MarginStatus::classify);

    debug!(
        "Link budget: fspl={:.2} dB, total_loss={:.2} dB, rx={:.2} dBm, rx_lna={:.2} dBm, margin={:?}",
        path_loss_db, total_loss_db, received_power_dbm, received_power_lna_dbm, link_margin_db
    );

    Ok(LinkBudget {
        tx_divergence_rad: tx_theta,
        rx_divergence_rad: rx_theta,
        tx_gain_abs,
        tx_gain_db,
        rx_gain_abs,
        rx_gain_db,
        path_loss_db,
        tx_pointing_loss_db,
        rx_pointing_loss_db,
        tx_efficiency_loss_db,
        rx_efficiency_loss_db,
        total_loss_db,
        received_power_dbm,
        received_power_lna_dbm,
        link_margin_db,
        margin_status,
    })
}
