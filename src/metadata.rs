use crate::args::encode_label;
use crate::error::Result;
use crate::names::{stata_name, NameMap};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

pub type VariableLabels = BTreeMap<String, String>;

/// Metadata attached to an export, keyed by dataset column names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportMetadata {
    /// Columns Stata converts to numeric with `real()`.
    pub force_numeric: Vec<String>,
    pub variable_labels: VariableLabels,
    pub value_labels: ValueLabels,
}

/// Value label sets and the columns that use them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValueLabels {
    /// column -> value label set name
    pub columns: BTreeMap<String, String>,
    /// value label set name -> definition, e.g. `1 "Yes" 2 "No"`
    pub definitions: BTreeMap<String, String>,
}

impl ValueLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a set from its code -> text mapping.
    pub fn define(mut self, name: impl Into<String>, set: &ValueLabelSet) -> Self {
        self.definitions.insert(name.into(), set.encode());
        self
    }

    /// Define a set from an already encoded definition string.
    pub fn define_encoded(mut self, name: impl Into<String>, definition: impl Into<String>) -> Self {
        self.definitions.insert(name.into(), definition.into());
        self
    }

    pub fn assign(mut self, column: impl Into<String>, name: impl Into<String>) -> Self {
        self.columns.insert(column.into(), name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.definitions.is_empty()
    }
}

/// Code -> text mapping for one value label set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueLabelSet {
    pub mapping: BTreeMap<i64, String>,
}

impl ValueLabelSet {
    /// `label define` body: `code "text"` pairs in code order.
    pub fn encode(&self) -> String {
        self.mapping
            .iter()
            .map(|(code, text)| format!("{code} \"{text}\""))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<S: Into<String>> FromIterator<(i64, S)> for ValueLabelSet {
    fn from_iter<I: IntoIterator<Item = (i64, S)>>(iter: I) -> Self {
        Self {
            mapping: iter.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }
}

impl ExportMetadata {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn is_empty(&self) -> bool {
        self.force_numeric.is_empty() && self.variable_labels.is_empty() && self.value_labels.is_empty()
    }

    /// Match every reference against the dataset columns.
    ///
    /// Unknown columns are dropped, as are value label assignments whose set
    /// has no definition. Label texts come out re-encoded for the command line.
    pub fn resolve(&self, names: &NameMap) -> ResolvedMetadata {
        let mut assignments: Vec<(String, String)> = Vec::new();
        // staged set name -> set name as given
        let mut set_names: HashMap<String, &str> = HashMap::new();
        for (column, set) in &self.value_labels.columns {
            let Some(staged) = lookup(names, column, "value label") else {
                continue;
            };
            if !self.value_labels.definitions.contains_key(set) {
                warn!("value label set {set:?} for column {column:?} has no definition, skipping");
                continue;
            }
            let set_name = stata_name(set);
            if let Some(existing) = set_names.get(set_name.as_str()).copied() {
                if existing != set.as_str() {
                    warn!("value label sets {existing:?} and {set:?} both map to {set_name:?}, skipping {column:?}");
                    continue;
                }
            } else {
                set_names.insert(set_name.clone(), set.as_str());
            }
            if assignments.iter().any(|(c, _)| c == staged) {
                debug!("column {column:?} already has a value label, keeping the first");
                continue;
            }
            assignments.push((staged.to_string(), set_name));
        }
        sort_by_position(&mut assignments, names);

        let mut definitions: Vec<(String, String)> = Vec::new();
        for (_, set_name) in &assignments {
            if definitions.iter().any(|(name, _)| name == set_name) {
                continue;
            }
            let raw = set_names[set_name.as_str()];
            let encoded = encode_label(&self.value_labels.definitions[raw]);
            definitions.push((set_name.clone(), encoded));
        }

        let mut seen = HashSet::new();
        let mut force_numeric = Vec::new();
        let requested = self
            .force_numeric
            .iter()
            .filter_map(|c| lookup(names, c, "numeric"))
            .chain(assignments.iter().map(|(c, _)| c.as_str()));
        for column in requested {
            if seen.insert(column.to_string()) {
                force_numeric.push(column.to_string());
            }
        }

        let mut variable_labels: Vec<(String, String)> = Vec::new();
        for (column, label) in &self.variable_labels {
            let Some(staged) = lookup(names, column, "variable label") else {
                continue;
            };
            if variable_labels.iter().any(|(c, _)| c == staged) {
                continue;
            }
            variable_labels.push((staged.to_string(), encode_label(label)));
        }
        sort_by_position(&mut variable_labels, names);

        ResolvedMetadata {
            force_numeric,
            value_label_definitions: definitions,
            value_label_assignments: assignments,
            variable_labels,
        }
    }
}

fn lookup<'a>(names: &'a NameMap, column: &str, what: &str) -> Option<&'a str> {
    let found = names.lookup(column);
    if found.is_none() {
        debug!("{what} column {column:?} is not in the dataset, dropping it");
    }
    found
}

fn sort_by_position(pairs: &mut [(String, String)], names: &NameMap) {
    pairs.sort_by_key(|(column, _)| names.position(column).unwrap_or(usize::MAX));
}

/// Metadata restricted to columns present in the staged dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMetadata {
    pub force_numeric: Vec<String>,
    /// (set name, encoded definition), in order of first use
    pub value_label_definitions: Vec<(String, String)>,
    /// (column, set name), in dataset column order
    pub value_label_assignments: Vec<(String, String)>,
    /// (column, encoded label), in dataset column order
    pub variable_labels: Vec<(String, String)>,
}
