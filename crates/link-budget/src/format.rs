//! Result formatting
//!
//! Attaches the natural secondary unit to every canonical value and flattens the
//! whole budget into one record for callers (HTTP, CLI, saved calculations).

use serde::{Deserialize, Serialize};

use crate::engine::{LinkBudget, LinkBudgetInput, MarginStatus, PointingMode};
use crate::units::{dbm_to_mw, dbm_to_w};

/// Flat, immutable link budget result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkBudgetOutput {
    // Input echo
    pub tx_power_dbm: f64,
    pub tx_power_mw: f64,
    pub tx_power_w: f64,
    pub rx_sensitivity_dbm: Option<f64>,
    pub rx_sensitivity_mw: Option<f64>,
    pub rx_lna_gain_db: f64,
    pub distance_m: f64,
    pub distance_km: f64,
    pub wavelength_m: f64,
    pub wavelength_nm: f64,
    pub tx_diameter_m: f64,
    pub rx_diameter_m: f64,
    pub tx_efficiency_percent: f64,
    pub rx_efficiency_percent: f64,

    // Gains
    pub tx_gain_db: f64,
    pub tx_gain_absolute: f64,
    pub rx_gain_db: f64,
    pub rx_gain_absolute: f64,

    // Beam divergence
    pub tx_beam_divergence_rad: f64,
    pub tx_beam_divergence_deg: f64,
    pub tx_beam_divergence_mrad: f64,
    pub rx_beam_divergence_rad: f64,
    pub rx_beam_divergence_deg: f64,
    pub rx_beam_divergence_mrad: f64,

    // Pointing
    pub tx_pointing_mode: PointingMode,
    pub rx_pointing_mode: PointingMode,
    pub tx_pointing_error_rad: Option<f64>,
    pub rx_pointing_error_rad: Option<f64>,

    // Losses
    pub path_loss_db: f64,
    pub impl_loss_db: f64,
    pub coupling_loss_db: f64,
    pub tx_pointing_loss_db: f64,
    pub rx_pointing_loss_db: f64,
    pub tx_efficiency_loss_db: f64,
    pub rx_efficiency_loss_db: f64,
    pub total_loss_db: f64,

    // Rx power without LNA
    pub received_power_dbm: f64,
    pub received_power_mw: f64,
    pub received_power_w: f64,

    // Rx power with LNA
    pub received_power_lna_dbm: f64,
    pub received_power_lna_mw: f64,
    pub received_power_lna_w: f64,

    // Link margin (after LNA)
    pub link_margin_db: Option<f64>,
    pub link_viable: Option<bool>,
    pub margin_status: Option<MarginStatus>,
}

impl LinkBudgetOutput {
    pub fn new(input: &LinkBudgetInput, budget: &LinkBudget) -> Self {
        Self {
            tx_power_dbm: input.tx_power_dbm,
            tx_power_mw: dbm_to_mw(input.tx_power_dbm),
            tx_power_w: dbm_to_w(input.tx_power_dbm),
            rx_sensitivity_dbm: input.rx_sensitivity_dbm,
            rx_sensitivity_mw: input.rx_sensitivity_dbm.map(dbm_to_mw),
            rx_lna_gain_db: input.rx_lna_gain_db,
            distance_m: input.distance_m,
            distance_km: input.distance_m / 1000.0,
            wavelength_m: input.wavelength_m,
            wavelength_nm: input.wavelength_m * 1e9,
            tx_diameter_m: input.tx_diameter_m,
            rx_diameter_m: input.rx_diameter_m,
            tx_efficiency_percent: input.tx_efficiency * 100.0,
            rx_efficiency_percent: input.rx_efficiency * 100.0,

            tx_gain_db: budget.tx_gain_db,
            tx_gain_absolute: budget.tx_gain_abs,
            rx_gain_db: budget.rx_gain_db,
            rx_gain_absolute: budget.rx_gain_abs,

            tx_beam_divergence_rad: budget.tx_divergence_rad,
            tx_beam_divergence_deg: budget.tx_divergence_rad.to_degrees(),
            tx_beam_divergence_mrad: budget.tx_divergence_rad * 1000.0,
            rx_beam_divergence_rad: budget.rx_divergence_rad,
            rx_beam_divergence_deg: budget.rx_divergence_rad.to_degrees(),
            rx_beam_divergence_mrad: budget.rx_divergence_rad * 1000.0,

            tx_pointing_mode: input.tx_pointing.mode(),
            rx_pointing_mode: input.rx_pointing.mode(),
            tx_pointing_error_rad: input.tx_pointing.error_rad(),
            rx_pointing_error_rad: input.rx_pointing.error_rad(),

            path_loss_db: budget.path_loss_db,
            impl_loss_db: input.implementation_loss_db,
            coupling_loss_db: input.coupling_loss_db,
            tx_pointing_loss_db: budget.tx_pointing_loss_db,
            rx_pointing_loss_db: budget.rx_pointing_loss_db,
            tx_efficiency_loss_db: budget.tx_efficiency_loss_db,
            rx_efficiency_loss_db: budget.rx_efficiency_loss_db,
            total_loss_db: budget.total_loss_db,

            received_power_dbm: budget.received_power_dbm,
            received_power_mw: dbm_to_mw(budget.received_power_dbm),
            received_power_w: dbm_to_w(budget.received_power_dbm),

            received_power_lna_dbm: budget.received_power_lna_dbm,
            received_power_lna_mw: dbm_to_mw(budget.received_power_lna_dbm),
            received_power_lna_w: dbm_to_w(budget.received_power_lna_dbm),

            link_margin_db: budget.link_margin_db,
            link_viable: budget.link_margin_db.map(|m| m > 0.0),
            margin_status: budget.margin_status,
        }
    }
}
