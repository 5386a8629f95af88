//! Positional argument encoding for the do-file.
//!
//! Every metadata feature travels as a count followed by that many tokens, so
//! the do-file can walk variable-length segments without a fixed arity.

use crate::metadata::ResolvedMetadata;
use crate::staging::StagingEncoding;
use std::path::Path;

/// Metadata segments, in the order the do-file applies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    ForceNumeric,
    ValueLabelDefinitions,
    ValueLabelAssignments,
    VariableLabels,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::ForceNumeric,
        Feature::ValueLabelDefinitions,
        Feature::ValueLabelAssignments,
        Feature::VariableLabels,
    ];

    /// Prefix of the synthetic chunk names the do-file dispatches on.
    pub fn chunk_prefix(self) -> &'static str {
        match self {
            Feature::ForceNumeric => "numeric",
            Feature::ValueLabelDefinitions => "vldefine",
            Feature::ValueLabelAssignments => "vlassign",
            Feature::VariableLabels => "varlabel",
        }
    }

    /// Tokens that make up one item of this feature.
    pub fn width(self) -> usize {
        match self {
            Feature::ForceNumeric => 1,
            _ => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureTokens {
    pub feature: Feature,
    pub tokens: Vec<String>,
}

impl FeatureTokens {
    pub fn width(&self) -> usize {
        self.feature.width()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Make label text safe to pass as a single quoted do-file argument.
pub fn encode_label(text: &str) -> String {
    text.replace('"', "^")
}

/// Flatten resolved metadata into one token list per feature, all four
/// features present and in do-file order.
pub fn feature_tokens(meta: &ResolvedMetadata) -> Vec<FeatureTokens> {
    Feature::ALL
        .iter()
        .map(|&feature| {
            let tokens = match feature {
                Feature::ForceNumeric => meta.force_numeric.clone(),
                Feature::ValueLabelDefinitions => flatten_pairs(&meta.value_label_definitions),
                Feature::ValueLabelAssignments => flatten_pairs(&meta.value_label_assignments),
                Feature::VariableLabels => flatten_pairs(&meta.variable_labels),
            };
            FeatureTokens { feature, tokens }
        })
        .collect()
}

fn flatten_pairs(pairs: &[(String, String)]) -> Vec<String> {
    pairs
        .iter()
        .flat_map(|(a, b)| [a.clone(), b.clone()])
        .collect()
}

pub fn total_tokens(features: &[FeatureTokens]) -> usize {
    features.iter().map(FeatureTokens::len).sum()
}

/// Append a count-prefixed segment.
pub fn push_segment(args: &mut Vec<String>, tokens: &[String]) {
    args.push(tokens.len().to_string());
    args.extend(tokens.iter().cloned());
}

/// Arguments every run starts with: staging file, destination and the
/// staging file's encoding as Stata's `import delimited` names it.
pub fn core_arguments(staging: &Path, destination: &Path, encoding: StagingEncoding) -> Vec<String> {
    vec![
        path_arg(staging),
        path_arg(destination),
        encoding.stata_name().to_string(),
    ]
}

/// Single-pass layout: core arguments, then one segment per feature.
pub fn full_arguments(core: &[String], features: &[FeatureTokens]) -> Vec<String> {
    let mut args = core.to_vec();
    for feature in Feature::ALL {
        let tokens = features
            .iter()
            .find(|f| f.feature == feature)
            .map(|f| f.tokens.as_slice())
            .unwrap_or(&[]);
        push_segment(&mut args, tokens);
    }
    args
}

/// Merge-pass layout: core arguments, the chunk name, then the chunk's segment.
pub fn chunk_arguments(core: &[String], name: &str, tokens: &[String]) -> Vec<String> {
    let mut args = core.to_vec();
    args.push(name.to_string());
    push_segment(&mut args, tokens);
    args
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
