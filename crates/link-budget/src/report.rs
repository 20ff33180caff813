//! Plain-text link budget report

use std::fmt::Write;

use crate::engine::PointingMode;
use crate::format::LinkBudgetOutput;

const RULE_WIDTH: usize = 60;

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
}

fn row(out: &mut String, label: &str, value: String) {
    let _ = writeln!(out, "  {:<30}{:>28}", label, value);
}

fn pointing_row(out: &mut String, label: &str, loss_db: f64, mode: PointingMode, error: Option<f64>) {
    let value = match (mode, error) {
        (PointingMode::Derived, Some(e)) => {
            format!("{:.3} dB ({:.3} µrad)", loss_db, e * 1e6)
        }
        _ => format!("{:.3} dB", loss_db),
    };
    row(out, label, value);
}

/// Render a fixed-layout report for one computed budget
pub fn render(output: &LinkBudgetOutput) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "OPTICAL LINK BUDGET");
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));

    section(&mut out, "Inputs");
    row(
        &mut out,
        "Tx power",
        format!("{:.2} dBm ({:.3} mW)", output.tx_power_dbm, output.tx_power_mw),
    );
    row(&mut out, "Tx efficiency", format!("{:.1} %", output.tx_efficiency_percent));
    row(&mut out, "Rx efficiency", format!("{:.1} %", output.rx_efficiency_percent));
    row(&mut out, "Wavelength", format!("{:.1} nm", output.wavelength_nm));
    row(&mut out, "Tx aperture", format!("{:.4} m", output.tx_diameter_m));
    row(&mut out, "Rx aperture", format!("{:.4} m", output.rx_diameter_m));
    row(&mut out, "Distance", format!("{:.3} km", output.distance_km));
    row(&mut out, "Rx LNA gain", format!("{:.2} dB", output.rx_lna_gain_db));
    let sensitivity = match output.rx_sensitivity_dbm {
        Some(s) => format!("{:.2} dBm", s),
        None => "n/a".to_string(),
    };
    row(&mut out, "Rx sensitivity", sensitivity);

    section(&mut out, "Antenna");
    row(
        &mut out,
        "Tx gain",
        format!("{:.2} dB ({:.3e})", output.tx_gain_db, output.tx_gain_absolute),
    );
    row(
        &mut out,
        "Rx gain",
        format!("{:.2} dB ({:.3e})", output.rx_gain_db, output.rx_gain_absolute),
    );
    row(
        &mut out,
        "Tx divergence",
        format!("{:.4} mrad", output.tx_beam_divergence_mrad),
    );
    row(
        &mut out,
        "Rx divergence",
        format!("{:.4} mrad", output.rx_beam_divergence_mrad),
    );

    section(&mut out, "Losses");
    row(&mut out, "Free space path loss", format!("{:.2} dB", output.path_loss_db));
    pointing_row(
        &mut out,
        "Tx pointing loss",
        output.tx_pointing_loss_db,
        output.tx_pointing_mode,
        output.tx_pointing_error_rad,
    );
    pointing_row(
        &mut out,
        "Rx pointing loss",
        output.rx_pointing_loss_db,
        output.rx_pointing_mode,
        output.rx_pointing_error_rad,
    );
    row(&mut out, "Implementation loss", format!("{:.2} dB", output.impl_loss_db));
    row(&mut out, "Coupling loss", format!("{:.2} dB", output.coupling_loss_db));
    row(&mut out, "Total loss", format!("{:.2} dB", output.total_loss_db));
    row(
        &mut out,
        "Efficiency (Tx + Rx)",
        format!(
            "{:.2} dB",
            output.tx_efficiency_loss_db + output.rx_efficiency_loss_db
        ),
    );

    section(&mut out, "Received Power");
    row(
        &mut out,
        "Without LNA",
        format!(
            "{:.2} dBm ({:.3e} mW)",
            output.received_power_dbm, output.received_power_mw
        ),
    );
    row(
        &mut out,
        "With LNA",
        format!(
            "{:.2} dBm ({:.3e} mW)",
            output.received_power_lna_dbm, output.received_power_lna_mw
        ),
    );

    section(&mut out, "Link Margin");
    match (output.link_margin_db, output.margin_status) {
        (Some(margin), Some(status)) => {
            row(&mut out, "Margin (after LNA)", format!("{:.2} dB", margin));
            row(&mut out, "Status", status.to_string());
        }
        _ => row(&mut out, "Margin", "n/a (no sensitivity given)".to_string()),
    }

    out
}
