//! Optical Link Budget CLI
//!
//! Computes a link budget from a JSON parameter file.
//!
//! Usage:
//!   link-budget --input params/leo_to_ogs.json
//!   link-budget --example --json --output budget.json

use anyhow::{bail, Result};
use clap::Parser;
use link_budget::{compute_from_params, loader, report, LinkBudgetParams};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "link-budget",
    about = "Compute a free-space optical link budget"
)]
struct Args {
    /// Path to link parameters JSON file
    #[arg(short, long, conflicts_with = "example")]
    input: Option<PathBuf>,

    /// Use the built-in reference scenario (1550 nm, 15 cm apertures, 40 km)
    #[arg(long)]
    example: bool,

    /// Print the result as JSON instead of the text report
    #[arg(long)]
    json: bool,

    /// Also write the result as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for the report / JSON
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let params = match (&args.input, args.example) {
        (Some(path), _) => loader::load_params(path)?,
        (None, true) => {
            info!("Using reference scenario");
            LinkBudgetParams::reference()
        }
        (None, false) => bail!("either --input <file> or --example is required"),
    };

    let output = compute_from_params(&params)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", report::render(&output));
    }

    if let Some(path) = &args.output {
        loader::write_output(path, &output)?;
    }

    match output.margin_status {
        Some(status) => info!(
            "Link margin {:.2} dB: {}",
            output.link_margin_db.unwrap_or_default(),
            status
        ),
        None => info!("No receiver sensitivity given, margin not evaluated"),
    }

    Ok(())
}
