//! Export Polars DataFrames to Stata `.dta` files through Stata's batch mode
//!
//! The DataFrame is staged as a pipe-delimited text file and a do-file is run
//! in Stata's batch mode to import it and save the `.dta`. Metadata (columns to
//! make numeric, variable labels, value labels) is passed as positional
//! arguments. Stata limits how many arguments one batch run accepts, so large
//! payloads are split over several runs that merge into the same file.

pub mod args;
pub mod batch;
pub mod error;
pub mod export;
pub mod metadata;
pub mod names;
pub mod runner;
pub mod staging;

pub use args::{core_arguments, encode_label, feature_tokens, Feature, FeatureTokens};
pub use batch::{plan_invocations, split_items, split_tokens, Chunk, ExportPaths, ExportPlan, ARGUMENT_CEILING};
pub use error::{Error, Result};
pub use export::{ExportReport, StataExporter};
pub use metadata::{ExportMetadata, ResolvedMetadata, ValueLabelSet, ValueLabels, VariableLabels};
pub use names::{stata_column_names, stata_name, NameMap};
pub use runner::{BatchRunner, Invocation, RunStatus, RunnerConfig, StataRunner, Step, BUNDLED_SCRIPT};
pub use staging::{write_staging_file, StagedFile, StagingEncoding, StagingOptions};
