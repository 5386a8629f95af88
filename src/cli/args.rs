use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dta-export", version, about = "Export a CSV or Parquet file to Stata .dta via Stata batch mode")]
pub struct CliArgs {
    /// Path to the Stata executable (e.g. /usr/local/stata18/stata-mp)
    #[arg(long)]
    pub stata: PathBuf,

    /// Input data file (.csv or .parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory for the .dta and the staging file
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Output file name, without extension
    #[arg(short, long)]
    pub name: String,

    /// Do-file run by Stata (defaults to the bundled csv_to_dta.do)
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Batch-mode flag passed to Stata (defaults to /e on Windows, -b elsewhere)
    #[arg(long)]
    pub batch_flag: Option<String>,

    /// JSON file with force_numeric, variable_labels and value_labels
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    /// Extra columns to convert to numeric (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub force_numeric: Vec<String>,

    /// Directory Stata runs in; its batch log is written there
    #[arg(long)]
    pub working_dir: Option<PathBuf>,

    /// Write the staging file as Latin-1 (Stata 13 and older)
    #[arg(long, default_value_t = false)]
    pub latin1: bool,

    /// Keep the staging file after a successful export
    #[arg(long, default_value_t = false)]
    pub keep_staging: bool,

    /// Print the Stata command lines without running them
    #[arg(long, default_value_t = false)]
    pub plan: bool,

    /// Enable info-level logging (RUST_LOG overrides)
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
