use crate::error::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Do-file written next to the staging file when no script is configured.
pub const BUNDLED_SCRIPT: &str = include_str!("../scripts/csv_to_dta.do");

#[cfg(windows)]
pub const DEFAULT_BATCH_FLAG: &str = "/e";
#[cfg(not(windows))]
pub const DEFAULT_BATCH_FLAG: &str = "-b";

/// Which pass of the export a run belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Import and apply every feature in one run.
    Full,
    /// Import only; chunks are merged afterwards.
    Base,
    /// Apply one named chunk to the saved `.dta`.
    Chunk(String),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Full => f.write_str("full export"),
            Step::Base => f.write_str("base export"),
            Step::Chunk(name) => write!(f, "chunk {name}"),
        }
    }
}

/// One Stata run: `program <args>` where `args` already carries the batch
/// flag, `do`, the script path and `script_args`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub step: Step,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub script_args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl Invocation {
    /// Shell-like rendering for logs and dry runs.
    pub fn command_line(&self) -> String {
        let mut out = quote(&self.program.to_string_lossy());
        for arg in &self.args {
            out.push(' ');
            out.push_str(&quote(arg));
        }
        out
    }
}

fn quote(s: &str) -> String {
    if !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c == '"') {
        return s.to_string();
    }
    format!("\"{}\"", s.replace('"', "\\\""))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub stata_path: PathBuf,
    /// Do-file to run; `None` uses [`BUNDLED_SCRIPT`].
    pub script_path: Option<PathBuf>,
    pub batch_flag: String,
    /// Stata writes its batch log here; defaults to the current directory.
    pub working_dir: Option<PathBuf>,
}

impl RunnerConfig {
    pub fn new(stata_path: impl AsRef<Path>) -> Self {
        Self {
            stata_path: stata_path.as_ref().to_path_buf(),
            script_path: None,
            batch_flag: DEFAULT_BATCH_FLAG.to_string(),
            working_dir: None,
        }
    }

    pub fn invocation(&self, step: Step, script: &Path, script_args: Vec<String>) -> Invocation {
        let mut args = Vec::with_capacity(script_args.len() + 3);
        args.push(self.batch_flag.clone());
        args.push("do".to_string());
        args.push(script.to_string_lossy().into_owned());
        args.extend(script_args.iter().cloned());
        Invocation {
            step,
            program: self.stata_path.clone(),
            args,
            script_args,
            working_dir: self.working_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub code: Option<i32>,
}

impl RunStatus {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes Stata runs. Swap in a fake to test without a Stata install.
pub trait BatchRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<RunStatus>;
}

/// Spawns the Stata executable and blocks until it exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct StataRunner;

impl BatchRunner for StataRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<RunStatus> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if let Some(dir) = &invocation.working_dir {
            cmd.current_dir(dir);
        }
        debug!("spawning {}", invocation.command_line());
        let status = cmd.status()?;
        Ok(RunStatus { code: status.code() })
    }
}
