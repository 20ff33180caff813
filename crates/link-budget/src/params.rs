//! Raw link parameters as they arrive over the wire
//!
//! Every quantity is optional and may carry its own unit tag (`<name>_unit`).
//! Canonical field names (`tx_power_dbm`, `distance_m`, ...) are accepted as aliases
//! so payloads already expressed in engine units need no tags at all.

use serde::{Deserialize, Serialize};

use crate::engine::{LinkBudgetInput, PointingSpec};
use crate::error::{EngineError, Result};
use crate::units::{
    angle_to_rad, efficiency_to_fraction, length_to_m, loss_to_db, parse_unit, power_to_dbm,
    wavelength_to_m, AngleUnit, EfficiencyUnit, LengthUnit, LossUnit, PowerUnit, WavelengthUnit,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkBudgetParams {
    // Transmitter
    #[serde(alias = "tx_power_dbm")]
    pub tx_power: Option<f64>,
    pub tx_power_unit: Option<String>,
    pub tx_efficiency: Option<f64>,
    pub tx_efficiency_unit: Option<String>,
    #[serde(alias = "tx_diameter_m")]
    pub tx_diameter: Option<f64>,
    pub tx_diameter_unit: Option<String>,

    // Receiver
    pub rx_efficiency: Option<f64>,
    pub rx_efficiency_unit: Option<String>,
    #[serde(alias = "rx_diameter_m")]
    pub rx_diameter: Option<f64>,
    pub rx_diameter_unit: Option<String>,
    #[serde(alias = "rx_sensitivity_dbm")]
    pub rx_sensitivity: Option<f64>,
    pub rx_sensitivity_unit: Option<String>,
    #[serde(alias = "rx_lna_gain_db")]
    pub rx_lna_gain: Option<f64>,
    pub rx_lna_gain_unit: Option<String>,

    // Link
    #[serde(alias = "wavelength_m")]
    pub wavelength: Option<f64>,
    pub wavelength_unit: Option<String>,
    #[serde(alias = "distance_m")]
    pub distance: Option<f64>,
    pub distance_unit: Option<String>,

    // Fixed losses
    #[serde(alias = "implementation_loss_db")]
    pub implementation_loss: Option<f64>,
    pub implementation_loss_unit: Option<String>,
    #[serde(alias = "coupling_loss_db")]
    pub coupling_loss: Option<f64>,
    pub coupling_loss_unit: Option<String>,

    // Pointing: loss xor error per side
    #[serde(alias = "tx_pointing_loss_db")]
    pub tx_pointing_loss: Option<f64>,
    pub tx_pointing_loss_unit: Option<String>,
    #[serde(alias = "tx_pointing_error_rad")]
    pub tx_pointing_error: Option<f64>,
    pub tx_pointing_error_unit: Option<String>,
    #[serde(alias = "rx_pointing_loss_db")]
    pub rx_pointing_loss: Option<f64>,
    pub rx_pointing_loss_unit: Option<String>,
    #[serde(alias = "rx_pointing_error_rad")]
    pub rx_pointing_error: Option<f64>,
    pub rx_pointing_error_unit: Option<String>,
}

fn required(field: &'static str, value: Option<f64>) -> Result<f64> {
    value.ok_or(EngineError::MissingRequiredField(field))
}

fn resolve_pointing(
    side: &str,
    loss: Option<f64>,
    loss_unit: Option<&str>,
    error: Option<f64>,
    error_unit: Option<&str>,
) -> Result<PointingSpec> {
    let loss_db = match loss {
        Some(v) => Some(loss_to_db(v, parse_unit::<LossUnit>(loss_unit)?)),
        None => None,
    };
    let error_rad = match error {
        Some(v) => Some(angle_to_rad(v, parse_unit::<AngleUnit>(error_unit)?)),
        None => None,
    };

    match (loss_db, error_rad) {
        // Derived mode expects a zero-filled loss field; an absent one is accepted too
        (None, Some(error_rad)) => Ok(PointingSpec::Derived { error_rad }),
        (Some(l), Some(error_rad)) if l == 0.0 => Ok(PointingSpec::Derived { error_rad }),
        (Some(loss_db), None) => Ok(PointingSpec::Manual { loss_db }),
        (Some(_), Some(_)) => Err(EngineError::InvalidConfiguration(format!(
            "{} pointing: give either a pointing loss or a pointing error, not both",
            side
        ))),
        (None, None) => Err(EngineError::InvalidConfiguration(format!(
            "{} pointing: a pointing loss or a pointing error is required",
            side
        ))),
    }
}

impl LinkBudgetParams {
    /// Reference scenario expressed in canonical units
    pub fn reference() -> Self {
        Self {
            tx_power: Some(34.0),
            tx_efficiency: Some(0.5),
            tx_diameter: Some(0.15),
            rx_efficiency: Some(0.5),
            rx_diameter: Some(0.15),
            rx_sensitivity: Some(-60.0),
            rx_lna_gain: Some(0.0),
            wavelength: Some(1550e-9),
            distance: Some(40_000.0),
            implementation_loss: Some(1.5),
            coupling_loss: Some(4.0),
            tx_pointing_loss: Some(1.5),
            rx_pointing_loss: Some(1.5),
            ..Default::default()
        }
    }

    /// Convert every quantity to canonical units
    pub fn normalize(&self) -> Result<LinkBudgetInput> {
        let tx_power = required("tx_power_dbm", self.tx_power)?;
        let tx_efficiency = required("tx_efficiency", self.tx_efficiency)?;
        let rx_efficiency = required("rx_efficiency", self.rx_efficiency)?;
        let wavelength = required("wavelength_m", self.wavelength)?;
        let tx_diameter = required("tx_diameter_m", self.tx_diameter)?;
        let rx_diameter = required("rx_diameter_m", self.rx_diameter)?;
        let distance = required("distance_m", self.distance)?;

        let power_unit = parse_unit::<PowerUnit>(self.tx_power_unit.as_deref())?;
        let tx_eff_unit = parse_unit::<EfficiencyUnit>(self.tx_efficiency_unit.as_deref())?;
        let rx_eff_unit = parse_unit::<EfficiencyUnit>(self.rx_efficiency_unit.as_deref())?;
        let wavelength_unit = parse_unit::<WavelengthUnit>(self.wavelength_unit.as_deref())?;
        let tx_d_unit = parse_unit::<LengthUnit>(self.tx_diameter_unit.as_deref())?;
        let rx_d_unit = parse_unit::<LengthUnit>(self.rx_diameter_unit.as_deref())?;
        let distance_unit = parse_unit::<LengthUnit>(self.distance_unit.as_deref())?;

        let rx_sensitivity_dbm = match self.rx_sensitivity {
            Some(v) => Some(power_to_dbm(
                v,
                parse_unit::<PowerUnit>(self.rx_sensitivity_unit.as_deref())?,
            )),
            None => None,
        };

        let rx_lna_gain_db = loss_to_db(
            self.rx_lna_gain.unwrap_or(0.0),
            parse_unit::<LossUnit>(self.rx_lna_gain_unit.as_deref())?,
        );
        let implementation_loss_db = loss_to_db(
            self.implementation_loss.unwrap_or(0.0),
            parse_unit::<LossUnit>(self.implementation_loss_unit.as_deref())?,
        );
        let coupling_loss_db = loss_to_db(
            self.coupling_loss.unwrap_or(0.0),
            parse_unit::<LossUnit>(self.coupling_loss_unit.as_deref())?,
        );

        let tx_pointing = resolve_pointing(
            "tx",
            self.tx_pointing_loss,
            self.tx_pointing_loss_unit.as_deref(),
            self.tx_pointing_error,
            self.tx_pointing_error_unit.as_deref(),
        )?;
        let rx_pointing = resolve_pointing(
            "rx",
            self.rx_pointing_loss,
            self.rx_pointing_loss_unit.as_deref(),
            self.rx_pointing_error,
            self.rx_pointing_error_unit.as_deref(),
        )?;

        Ok(LinkBudgetInput {
            tx_power_dbm: power_to_dbm(tx_power, power_unit),
            tx_efficiency: efficiency_to_fraction(tx_efficiency, tx_eff_unit),
            rx_efficiency: efficiency_to_fraction(rx_efficiency, rx_eff_unit),
            rx_sensitivity_dbm,
            rx_lna_gain_db,
            wavelength_m: wavelength_to_m(wavelength, wavelength_unit),
            tx_diameter_m: length_to_m(tx_diameter, tx_d_unit),
            rx_diameter_m: length_to_m(rx_diameter, rx_d_unit),
            distance_m: length_to_m(distance, distance_unit),
            implementation_loss_db,
            coupling_loss_db,
            tx_pointing,
            rx_pointing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_normalizes_to_reference_input() {
        let input = LinkBudgetParams::reference().normalize().unwrap();
        let expected = LinkBudgetInput::reference();

        // Wavelength goes through the nanometre table, so compare it loosely
        assert!((input.wavelength_m - expected.wavelength_m).abs() < 1e-20);
        assert_eq!(
            LinkBudgetInput {
                wavelength_m: expected.wavelength_m,
                ..input
            },
            expected
        );
    }

    #[test]
    fn test_canonical_field_aliases() {
        let json = r#"{
            "tx_power_dbm": 34, "tx_efficiency": 0.5, "rx_efficiency": 0.5,
            "rx_sensitivity_dbm": -60, "wavelength_m": 1.55e-6,
            "tx_diameter_m": 0.15, "rx_diameter_m": 0.15, "distance_m": 40000,
            "implementation_loss_db": 1.5, "coupling_loss_db": 4,
            "tx_pointing_loss_db": 1.5, "rx_pointing_loss_db": 1.5, "rx_lna_gain_db": 0
        }"#;
        let params: LinkBudgetParams = serde_json::from_str(json).unwrap();
        let input = params.normalize().unwrap();
        assert_eq!(input.tx_power_dbm, 34.0);
        assert_eq!(input.distance_m, 40_000.0);
        assert_eq!(input.tx_pointing, PointingSpec::Manual { loss_db: 1.5 });
    }

    #[test]
    fn test_unit_tagged_payload() {
        let json = r#"{
            "tx_power": 2.5, "tx_power_unit": "W",
            "tx_efficiency": 80, "tx_efficiency_unit": "%",
            "rx_efficiency": 0.7,
            "rx_sensitivity": 1e-6, "rx_sensitivity_unit": "mW",
            "wavelength": 1550, "wavelength_unit": "nm",
            "tx_diameter": 10, "tx_diameter_unit": "cm",
            "rx_diameter": 300, "rx_diameter_unit": "mm",
            "distance": 1200, "distance_unit": "km",
            "tx_pointing_loss": 0, "tx_pointing_error": 1.5, "tx_pointing_error_unit": "µrad",
            "rx_pointing_loss": 2, "rx_pointing_loss_unit": "linear"
        }"#;
        let params: LinkBudgetParams = serde_json::from_str(json).unwrap();
        let input = params.normalize().unwrap();

        assert!((input.tx_power_dbm - 10.0 * 2500f64.log10()).abs() < 1e-12);
        assert!((input.tx_efficiency - 0.8).abs() < 1e-12);
        assert!((input.rx_sensitivity_dbm.unwrap() + 60.0).abs() < 1e-9);
        assert!((input.wavelength_m - 1550e-9).abs() < 1e-18);
        assert!((input.tx_diameter_m - 0.1).abs() < 1e-12);
        assert!((input.rx_diameter_m - 0.3).abs() < 1e-12);
        assert_eq!(input.distance_m, 1_200_000.0);
        assert_eq!(input.rx_lna_gain_db, 0.0);
        assert_eq!(input.implementation_loss_db, 0.0);

        match input.tx_pointing {
            PointingSpec::Derived { error_rad } => assert!((error_rad - 1.5e-6).abs() < 1e-18),
            other => panic!("expected derived pointing, got {:?}", other),
        }
        match input.rx_pointing {
            PointingSpec::Manual { loss_db } => {
                assert!((loss_db - 10.0 * 2f64.log10()).abs() < 1e-12)
            }
            other => panic!("expected manual pointing, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_field() {
        let mut params = LinkBudgetParams::reference();
        params.distance = None;
        assert_eq!(
            params.normalize().unwrap_err(),
            EngineError::MissingRequiredField("distance_m")
        );

        let mut params = LinkBudgetParams::reference();
        params.rx_sensitivity = None;
        assert_eq!(params.normalize().unwrap().rx_sensitivity_dbm, None);
    }

    #[test]
    fn test_unknown_unit_tag() {
        let mut params = LinkBudgetParams::reference();
        params.wavelength_unit = Some("angstrom".to_string());
        assert!(matches!(
            params.normalize(),
            Err(EngineError::InvalidUnit { quantity: "wavelength", .. })
        ));
    }

    #[test]
    fn test_pointing_both_sources_rejected() {
        let mut params = LinkBudgetParams::reference();
        params.tx_pointing_error = Some(1e-6);
        assert!(matches!(
            params.normalize(),
            Err(EngineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_pointing_neither_source_rejected() {
        let mut params = LinkBudgetParams::reference();
        params.rx_pointing_loss = None;
        let err = params.normalize().unwrap_err();
        assert!(err.to_string().contains("rx pointing"), "{}", err);
    }

    #[test]
    fn test_pointing_derived_with_absent_loss() {
        let mut params = LinkBudgetParams::reference();
        params.rx_pointing_loss = None;
        params.rx_pointing_error = Some(3.0);
        params.rx_pointing_error_unit = Some("nrad".to_string());
        let input = params.normalize().unwrap();
        assert_eq!(input.rx_pointing.error_rad(), Some(3.0 * 1e-9));
    }
}
