use crate::error::{Error, Result};
use crate::names::{index_column_name, NameMap};
use encoding_rs::WINDOWS_1252;
use polars::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const STAGING_SEPARATOR: u8 = b'|';
pub const DEFAULT_CHUNK_ROWS: usize = 10_000_000;

/// Text encoding of the staging file. Stata 13 and older read Latin-1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StagingEncoding {
    #[default]
    Utf8,
    Latin1,
}

impl StagingEncoding {
    /// Name passed to `import delimited, encoding()`.
    pub fn stata_name(self) -> &'static str {
        match self {
            StagingEncoding::Utf8 => "utf-8",
            StagingEncoding::Latin1 => "latin1",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StagingOptions {
    pub chunk_rows: usize,
    pub encoding: StagingEncoding,
}

impl Default for StagingOptions {
    fn default() -> Self {
        Self {
            chunk_rows: DEFAULT_CHUNK_ROWS,
            encoding: StagingEncoding::Utf8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StagedFile {
    pub path: PathBuf,
    pub rows: usize,
    pub index_column: String,
}

/// Write `df` as pipe-delimited text with a leading row index column.
///
/// Columns are renamed to their staged Stata names and every value is written
/// as text; nulls become empty fields.
pub fn write_staging_file(
    df: &DataFrame,
    names: &NameMap,
    path: impl AsRef<Path>,
    opts: &StagingOptions,
) -> Result<StagedFile> {
    let path = path.as_ref();
    let index_column = index_column_name(names.staged());
    let text = prepare_df_for_staging(df, names, &index_column)?;

    let mut out = BufWriter::new(File::create(path)?);
    let height = text.height();
    let chunk_rows = opts.chunk_rows.max(1);
    let mut offset = 0usize;
    loop {
        let len = chunk_rows.min(height - offset);
        let mut chunk = text.slice(offset as i64, len);
        write_chunk(&mut out, &mut chunk, offset == 0, opts.encoding)?;
        offset += len;
        if offset >= height {
            break;
        }
    }
    out.flush()?;

    debug!("staged {height} rows to {}", path.display());
    Ok(StagedFile {
        path: path.to_path_buf(),
        rows: height,
        index_column,
    })
}

fn prepare_df_for_staging(df: &DataFrame, names: &NameMap, index_column: &str) -> Result<DataFrame> {
    let mut renamed = df.clone();
    renamed.set_column_names(names.staged())?;
    let indexed = renamed.with_row_index(index_column.into(), None)?;
    let mut cols = Vec::with_capacity(indexed.width());
    for col in indexed.columns() {
        let series = col.as_materialized_series();
        let out = if matches!(series.dtype(), DataType::String) {
            series.clone()
        } else {
            series.cast(&DataType::String)?
        };
        cols.push(out.into_column());
    }
    Ok(DataFrame::new_infer_height(cols)?)
}

fn write_chunk<W: Write>(
    out: &mut W,
    chunk: &mut DataFrame,
    header: bool,
    encoding: StagingEncoding,
) -> Result<()> {
    match encoding {
        StagingEncoding::Utf8 => {
            CsvWriter::new(out)
                .include_header(header)
                .with_separator(STAGING_SEPARATOR)
                .finish(chunk)?;
        }
        StagingEncoding::Latin1 => {
            let mut buf = Vec::new();
            CsvWriter::new(&mut buf)
                .include_header(header)
                .with_separator(STAGING_SEPARATOR)
                .finish(chunk)?;
            let text = String::from_utf8(buf).map_err(|e| Error::Encoding(e.to_string()))?;
            let (bytes, _, had_errors) = WINDOWS_1252.encode(&text);
            if had_errors {
                return Err(Error::Encoding(
                    "staging data has characters outside Latin-1".to_string(),
                ));
            }
            out.write_all(&bytes)?;
        }
    }
    Ok(())
}
