use crate::args::feature_tokens;
use crate::batch::{plan_invocations, ExportPaths, ExportPlan};
use crate::error::{Error, Result};
use crate::metadata::{ExportMetadata, ResolvedMetadata, ValueLabels, VariableLabels};
use crate::names::NameMap;
use crate::runner::{BatchRunner, RunnerConfig, StataRunner, BUNDLED_SCRIPT};
use crate::staging::{write_staging_file, StagingEncoding, StagingOptions};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Exports a DataFrame to `.dta` by staging it as text and running Stata.
///
/// ```no_run
/// use polars::df;
/// use polars_dta_export::StataExporter;
///
/// let df = df!("id" => [1i32, 2], "sex" => ["1", "2"]).unwrap();
/// StataExporter::new("/usr/local/stata18/stata-mp")
///     .with_output("/tmp/out", "people")
///     .with_force_numeric(["sex"])
///     .export(&df)
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct StataExporter {
    runner: RunnerConfig,
    output_dir: Option<PathBuf>,
    file_name: Option<String>,
    metadata: ExportMetadata,
    staging: StagingOptions,
    keep_staging: bool,
}

/// What an export produced.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub staging: PathBuf,
    pub destination: PathBuf,
    pub rows: usize,
    pub invocations: usize,
    pub batched: bool,
}

impl StataExporter {
    pub fn new(stata_path: impl AsRef<Path>) -> Self {
        Self {
            runner: RunnerConfig::new(stata_path),
            output_dir: None,
            file_name: None,
            metadata: ExportMetadata::default(),
            staging: StagingOptions::default(),
            keep_staging: false,
        }
    }

    /// Destination directory and file name; `.dta` is appended when missing.
    pub fn with_output(mut self, dir: impl AsRef<Path>, name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        let name = name.strip_suffix(".dta").unwrap_or(name);
        self.output_dir = Some(dir.as_ref().to_path_buf());
        self.file_name = Some(name.to_string());
        self
    }

    /// Do-file run by Stata instead of the bundled one.
    pub fn with_script(mut self, script: impl AsRef<Path>) -> Self {
        self.runner.script_path = Some(script.as_ref().to_path_buf());
        self
    }

    pub fn with_batch_flag(mut self, flag: impl Into<String>) -> Self {
        self.runner.batch_flag = flag.into();
        self
    }

    /// Directory Stata runs in, where it leaves its batch log.
    pub fn with_working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.runner.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_force_numeric<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.force_numeric = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_variable_labels(mut self, labels: VariableLabels) -> Self {
        self.metadata.variable_labels = labels;
        self
    }

    pub fn with_value_labels(mut self, labels: ValueLabels) -> Self {
        self.metadata.value_labels = labels;
        self
    }

    /// Replace all metadata at once, e.g. from [`ExportMetadata::from_json_path`].
    pub fn with_metadata(mut self, metadata: ExportMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_staging_chunk_rows(mut self, rows: usize) -> Self {
        self.staging.chunk_rows = rows;
        self
    }

    pub fn with_staging_encoding(mut self, encoding: StagingEncoding) -> Self {
        self.staging.encoding = encoding;
        self
    }

    /// Leave the staging file on disk after a successful export.
    pub fn keep_staging(mut self, keep: bool) -> Self {
        self.keep_staging = keep;
        self
    }

    pub fn runner_config(&self) -> &RunnerConfig {
        &self.runner
    }

    /// Absolute staging, destination and script paths for this export.
    ///
    /// Without a configured script, the bundled do-file is written next to
    /// the staging file as `<name>_csv_to_dta.do`.
    pub fn paths(&self) -> Result<ExportPaths> {
        let dir = self
            .output_dir
            .as_ref()
            .ok_or_else(|| Error::InvalidOptions("output directory is not set".to_string()))?;
        let name = self
            .file_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::InvalidOptions("output file name is not set".to_string()))?;
        let dir = std::path::absolute(dir)?;
        let script = match &self.runner.script_path {
            Some(script) => std::path::absolute(script)?,
            None => dir.join(format!("{name}_csv_to_dta.do")),
        };
        Ok(ExportPaths::new(dir.join(format!("{name}.csv")), dir.join(format!("{name}.dta")), script)
            .with_encoding(self.staging.encoding))
    }

    /// Metadata as it will be sent for this dataset.
    pub fn resolve(&self, df: &DataFrame) -> ResolvedMetadata {
        self.metadata.resolve(&name_map(df))
    }

    /// The Stata runs an export of `df` would perform, without running them.
    pub fn plan(&self, df: &DataFrame) -> Result<ExportPlan> {
        let paths = self.paths()?;
        let features = feature_tokens(&self.resolve(df));
        Ok(plan_invocations(&paths, &features, &self.runner))
    }

    pub fn export(&self, df: &DataFrame) -> Result<ExportReport> {
        self.export_with(df, &mut StataRunner)
    }

    /// Export with a caller-supplied runner.
    ///
    /// Runs stop at the first failure, which is returned as
    /// [`Error::ExternalProcess`]; the staging file and a written bundled
    /// script are then left in place.
    pub fn export_with<R: BatchRunner + ?Sized>(&self, df: &DataFrame, runner: &mut R) -> Result<ExportReport> {
        let paths = self.paths()?;
        let names = name_map(df);
        let resolved = self.metadata.resolve(&names);
        let staged = write_staging_file(df, &names, &paths.staging, &self.staging)?;
        info!(
            "staged {} rows x {} columns to {}",
            staged.rows,
            df.width(),
            staged.path.display()
        );

        let bundled = self.runner.script_path.is_none();
        if bundled {
            std::fs::write(&paths.script, BUNDLED_SCRIPT)?;
            debug!("wrote bundled do-file to {}", paths.script.display());
        }

        let plan = plan_invocations(&paths, &feature_tokens(&resolved), &self.runner);
        let total = plan.len();
        for (i, invocation) in plan.invocations.iter().enumerate() {
            info!("running Stata {}/{}: {}", i + 1, total, invocation.step);
            let status = runner.run(invocation)?;
            if !status.success() {
                error!(
                    "Stata failed during {} (exit code {:?}); staging file kept at {}",
                    invocation.step,
                    status.code,
                    paths.staging.display()
                );
                return Err(Error::ExternalProcess {
                    step: invocation.step.to_string(),
                    code: status.code,
                });
            }
        }

        if !self.keep_staging {
            std::fs::remove_file(&paths.staging)?;
            if bundled {
                std::fs::remove_file(&paths.script)?;
            }
        }
        info!("wrote {}", paths.destination.display());
        Ok(ExportReport {
            staging: paths.staging,
            destination: paths.destination,
            rows: staged.rows,
            invocations: total,
            batched: plan.batched,
        })
    }
}

fn name_map(df: &DataFrame) -> NameMap {
    let names = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();
    NameMap::new(&names)
}
