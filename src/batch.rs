//! Splitting metadata across several Stata runs.
//!
//! Stata's batch mode caps the number of arguments a do-file can receive.
//! Payloads over [`ARGUMENT_CEILING`] tokens are cut into chunks; a base run
//! builds the `.dta` and each chunk is merged into it by a further run.

use crate::args::{chunk_arguments, core_arguments, full_arguments, total_tokens, Feature, FeatureTokens};
use crate::runner::{Invocation, RunnerConfig, Step};
use crate::staging::StagingEncoding;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ARGUMENT_CEILING: usize = 38;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub name: String,
    pub feature: Feature,
    pub tokens: Vec<String>,
}

/// Files one export hands to Stata, absolute so a working directory set
/// for the batch log does not change what they point at.
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub staging: PathBuf,
    pub destination: PathBuf,
    pub script: PathBuf,
    pub encoding: StagingEncoding,
}

impl ExportPaths {
    pub fn new(staging: impl AsRef<Path>, destination: impl AsRef<Path>, script: impl AsRef<Path>) -> Self {
        Self {
            staging: staging.as_ref().to_path_buf(),
            destination: destination.as_ref().to_path_buf(),
            script: script.as_ref().to_path_buf(),
            encoding: StagingEncoding::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: StagingEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    fn core_arguments(&self) -> Vec<String> {
        core_arguments(&self.staging, &self.destination, self.encoding)
    }
}

/// Ordered Stata runs for one export.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    pub invocations: Vec<Invocation>,
    pub batched: bool,
}

impl ExportPlan {
    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }
}

pub fn split_tokens(tokens: &[String]) -> Vec<Vec<String>> {
    split_items(tokens, 1)
}

/// Deal `tokens` into evenly sized chunks of fewer than [`ARGUMENT_CEILING`]
/// tokens, doubling the chunk count until they fit. An item of `width`
/// tokens is never split across chunks.
pub fn split_items(tokens: &[String], width: usize) -> Vec<Vec<String>> {
    let width = width.max(1);
    let items = tokens.len().div_ceil(width);
    if items == 0 {
        return Vec::new();
    }

    let mut n_chunks = 1usize;
    while items.div_ceil(n_chunks) * width >= ARGUMENT_CEILING && n_chunks < items {
        n_chunks *= 2;
    }

    let base = items / n_chunks;
    let extra = items % n_chunks;
    let mut chunks = Vec::with_capacity(n_chunks);
    let mut start_item = 0usize;
    for i in 0..n_chunks {
        let count = base + usize::from(i < extra);
        if count == 0 {
            continue;
        }
        let start = start_item * width;
        let end = ((start_item + count) * width).min(tokens.len());
        chunks.push(tokens[start..end].to_vec());
        start_item += count;
    }
    chunks
}

/// Named chunks for every feature, in do-file order.
pub fn chunk_features(features: &[FeatureTokens]) -> Vec<Chunk> {
    let mut out = Vec::new();
    for feature in Feature::ALL {
        let Some(ft) = features.iter().find(|f| f.feature == feature) else {
            continue;
        };
        for (i, tokens) in split_items(&ft.tokens, ft.width()).into_iter().enumerate() {
            out.push(Chunk {
                name: format!("{}_{}", feature.chunk_prefix(), i + 1),
                feature,
                tokens,
            });
        }
    }
    out
}

/// Lay out the Stata runs for an export without touching the filesystem.
pub fn plan_invocations(paths: &ExportPaths, features: &[FeatureTokens], config: &RunnerConfig) -> ExportPlan {
    let total = total_tokens(features);
    let core = paths.core_arguments();
    if total <= ARGUMENT_CEILING {
        let args = full_arguments(&core, features);
        debug!("{total} metadata tokens fit in a single run");
        return ExportPlan {
            invocations: vec![config.invocation(Step::Full, &paths.script, args)],
            batched: false,
        };
    }

    let chunks = chunk_features(features);
    debug!(
        "{total} metadata tokens exceed the ceiling of {ARGUMENT_CEILING}, splitting into {} chunks",
        chunks.len()
    );
    let mut invocations = Vec::with_capacity(chunks.len() + 1);
    invocations.push(config.invocation(Step::Base, &paths.script, core.clone()));
    for chunk in chunks {
        let args = chunk_arguments(&core, &chunk.name, &chunk.tokens);
        invocations.push(config.invocation(Step::Chunk(chunk.name), &paths.script, args));
    }
    ExportPlan {
        invocations,
        batched: true,
    }
}
