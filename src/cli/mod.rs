//! Command line layer: argument parsing (`args`) and the export flow.

pub mod args;

pub use args::CliArgs;

use polars::prelude::*;
use polars_dta_export::{Error, ExportMetadata, StagingEncoding, StataExporter};
use std::fs::File;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let default_level = if args.log { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let df = read_input(&args.input)?;
    info!("read {} rows x {} columns from {:?}", df.height(), df.width(), args.input);

    let mut metadata = match &args.metadata {
        Some(path) => ExportMetadata::from_json_path(path)?,
        None => ExportMetadata::default(),
    };
    metadata.force_numeric.extend(args.force_numeric.iter().cloned());

    let mut exporter = StataExporter::new(&args.stata)
        .with_output(&args.output_dir, &args.name)
        .with_metadata(metadata)
        .keep_staging(args.keep_staging);
    if let Some(script) = &args.script {
        exporter = exporter.with_script(script);
    }
    if let Some(flag) = &args.batch_flag {
        exporter = exporter.with_batch_flag(flag.clone());
    }
    if let Some(dir) = &args.working_dir {
        exporter = exporter.with_working_dir(dir);
    }
    if args.latin1 {
        exporter = exporter.with_staging_encoding(StagingEncoding::Latin1);
    }

    if args.plan {
        for invocation in exporter.plan(&df)?.invocations {
            println!("{}", invocation.command_line());
        }
        return Ok(());
    }

    let report = exporter.export(&df)?;
    println!(
        "Wrote {} ({} rows, {} Stata run{})",
        report.destination.display(),
        report.rows,
        report.invocations,
        if report.invocations == 1 { "" } else { "s" }
    );
    Ok(())
}

fn read_input(path: &Path) -> Result<DataFrame, Error> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let file = File::open(path)?;
    let df = match ext.as_str() {
        "parquet" => ParquetReader::new(file).finish()?,
        "csv" => CsvReader::new(file).finish()?,
        _ => {
            return Err(Error::InvalidOptions(format!(
                "unsupported input {}: expected .csv or .parquet",
                path.display()
            )))
        }
    };
    Ok(df)
}
