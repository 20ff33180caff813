//! Optical Link Budget
//!
//! Free-space optical link budget engine. Given transmitter and receiver
//! parameters, wavelength and distance it derives:
//! - Beam divergence and antenna gains
//! - Free space path loss and pointing loss
//! - Received power with and without an optical LNA stage
//! - Link margin against receiver sensitivity
//!
//! # Link equation
//!
//! ```text
//! L_total = FSPL + L_pt_tx + L_pt_rx + L_impl + L_coupling
//! P_rx    = P_tx + E_tx + E_rx + G_tx + G_rx - L_total
//! P_lna   = P_rx + G_lna
//! Margin  = P_lna - S_rx
//! ```
//!
//! The engine is a pure function: no state, no I/O, safe to call from any thread.
//!
//! ```rust
//! use link_budget::{compute_link_budget, LinkBudgetInput, MarginStatus};
//!
//! let output = compute_link_budget(LinkBudgetInput::reference()).unwrap();
//! assert_eq!(output.margin_status, Some(MarginStatus::Excellent));
//! ```

pub mod engine;
pub mod error;
pub mod format;
pub mod loader;
pub mod params;
pub mod report;
pub mod units;

pub use engine::{LinkBudget, LinkBudgetInput, MarginStatus, PointingMode, PointingSpec};
pub use error::{EngineError, Result};
pub use format::LinkBudgetOutput;
pub use params::LinkBudgetParams;

/// Compute the full link budget for a normalized input
pub fn compute_link_budget(input: LinkBudgetInput) -> Result<LinkBudgetOutput> {
    let budget = engine::evaluate(&input)?;
    Ok(LinkBudgetOutput::new(&input, &budget))
}

/// Normalize raw parameters, then compute
pub fn compute_from_params(params: &LinkBudgetParams) -> Result<LinkBudgetOutput> {
    let input = params.normalize()?;
    compute_link_budget(input)
}
