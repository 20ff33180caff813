//! Reading parameter files and writing results

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::format::LinkBudgetOutput;
use crate::params::LinkBudgetParams;

/// Load raw link parameters from a JSON file
pub fn load_params(path: impl AsRef<Path>) -> anyhow::Result<LinkBudgetParams> {
    let path = path.as_ref();
    info!("Loading link parameters from {:?}", path);

    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);
    let params = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", path.display()))?;

    Ok(params)
}

/// Write a computed budget as pretty JSON
pub fn write_output(path: impl AsRef<Path>, output: &LinkBudgetOutput) -> anyhow::Result<()> {
    let path = path.as_ref();
    info!("Writing output to {:?}", path);

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, output)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_params() {
        let json = r#"{
            "tx_power": 500, "tx_power_unit": "mW",
            "tx_efficiency": 0.8, "rx_efficiency": 0.8,
            "wavelength": 1.064, "wavelength_unit": "um",
            "tx_diameter_m": 0.1, "rx_diameter_m": 0.2,
            "distance": 2, "distance_unit": "km",
            "tx_pointing_loss_db": 1, "rx_pointing_loss_db": 1
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let params = load_params(file.path()).unwrap();
        assert_eq!(params.tx_power, Some(500.0));
        assert_eq!(params.tx_power_unit.as_deref(), Some("mW"));
        assert!(params.normalize().is_ok());
    }

    #[test]
    fn test_load_params_bad_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(load_params(file.path()).is_err());
    }

    #[test]
    fn test_write_output_round_trip() {
        let output = crate::compute_from_params(&LinkBudgetParams::reference()).unwrap();
        let file = NamedTempFile::new().unwrap();

        write_output(file.path(), &output).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        let back: LinkBudgetOutput = serde_json::from_str(&text).unwrap();
        assert_eq!(back.margin_status, output.margin_status);
        assert!((back.received_power_dbm - output.received_power_dbm).abs() < 1e-9);
    }
}
