//! Column naming for the staging file.
//!
//! Stata's delimited import lowercases headers and rejects anything that is
//! not a valid variable name, so the staging file is written with names that
//! Stata will keep as-is. Metadata refers to columns by their dataset names
//! and is translated through [`NameMap`].

use std::collections::HashMap;

const STATA_NAME_LEN: usize = 32;
const INDEX_COLUMN: &str = "index";

/// Original dataset name -> staged Stata name.
#[derive(Debug, Clone, Default)]
pub struct NameMap {
    exact: HashMap<String, String>,
    folded: HashMap<String, String>,
    positions: HashMap<String, usize>,
    staged: Vec<String>,
}

impl NameMap {
    pub fn new(original: &[String]) -> Self {
        let staged = stata_column_names(original);
        let mut exact = HashMap::with_capacity(original.len());
        let mut folded = HashMap::with_capacity(original.len());
        for (o, s) in original.iter().zip(staged.iter()) {
            exact.insert(o.clone(), s.clone());
            folded.entry(o.to_lowercase()).or_insert_with(|| s.clone());
        }
        let positions = staged.iter().enumerate().map(|(i, s)| (s.clone(), i)).collect();
        Self {
            exact,
            folded,
            positions,
            staged,
        }
    }

    /// Staged name for a requested column, matching case-insensitively when
    /// no column carries the exact name.
    pub fn lookup(&self, requested: &str) -> Option<&str> {
        self.exact
            .get(requested)
            .or_else(|| self.folded.get(&requested.to_lowercase()))
            .map(String::as_str)
    }

    /// Staged names in dataset column order.
    pub fn staged(&self) -> &[String] {
        &self.staged
    }

    /// Position of a staged name in dataset column order.
    pub fn position(&self, staged: &str) -> Option<usize> {
        self.positions.get(staged).copied()
    }
}

pub fn stata_column_names(names: &[String]) -> Vec<String> {
    let mut converted: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let mut col = stata_name(&name.to_lowercase());
        if converted.contains(&col) {
            col = make_unique(&col, &converted);
        }
        converted.push(col);
    }
    converted
}

/// Name for the row index column, unique against the staged names.
pub fn index_column_name(staged: &[String]) -> String {
    make_unique(INDEX_COLUMN, staged)
}

/// A valid Stata name for `name`, at most 32 bytes. Case is kept.
///
/// Used for column headers and for value label set names, which Stata
/// parses as bare words on the command line.
pub fn stata_name(name: &str) -> String {
    let mut out = if valid_name(name) {
        name.to_string()
    } else {
        let mut col = replace_invalid_chars(name);
        if col.is_empty() {
            col = "_".to_string();
        }
        if is_reserved_word(&col) || starts_with_number(&col) {
            col = format!("_{}", col);
        }
        col
    };
    out.truncate(STATA_NAME_LEN);
    out
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if is_reserved_word(name) {
        return false;
    }
    (first == '_' || first.is_ascii_alphabetic())
        && chars.all(|ch| ch == '_' || ch.is_ascii_alphanumeric())
}

fn starts_with_number(name: &str) -> bool {
    name.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false)
}

fn replace_invalid_chars(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn is_reserved_word(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if lower == "strl" {
        return true;
    }
    if lower.starts_with("str") && lower[3..].parse::<usize>().is_ok() {
        return true;
    }
    const RESERVED_WORDS: &[&str] = &[
        "aggregate", "array", "boolean", "break", "byte", "case", "catch", "class",
        "colvector", "complex", "const", "continue", "default", "delegate", "delete", "do",
        "double", "else", "eltypedef", "end", "enum", "explicit", "export", "external",
        "float", "for", "friend", "function", "global", "goto", "if", "inline", "int",
        "local", "long", "null", "pragma", "protected", "quad", "rowvector", "short",
        "typedef", "typename", "virtual", "_all", "_n", "_skip", "_b", "_pi", "in",
        "_pred", "_coef", "_rc", "using", "_cons", "_se", "with",
    ];
    RESERVED_WORDS.contains(&lower.as_str())
}

fn make_unique(name: &str, existing: &[String]) -> String {
    let mut dup_id = 0usize;
    let mut candidate = name.to_string();
    while existing.contains(&candidate) {
        candidate = format!("_{}{}", dup_id, name);
        if candidate.len() > STATA_NAME_LEN {
            candidate.truncate(STATA_NAME_LEN);
        }
        dup_id += 1;
    }
    candidate
}
