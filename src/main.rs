//! `dta-export` entrypoint.
//!
//! Parses arguments and hands off to the `cli` module. For programmatic use,
//! prefer `polars_dta_export::StataExporter`.

use clap::Parser;

mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::CliArgs::parse();
    cli::run(args)
}
