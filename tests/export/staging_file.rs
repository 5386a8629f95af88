use crate::common::temp_dir;
use polars::df;
use polars::prelude::*;
use polars_dta_export::{
    write_staging_file, Error, NameMap, StagingEncoding, StagingOptions,
};
use std::fs;

fn names_of(df: &DataFrame) -> NameMap {
    let names = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();
    NameMap::new(&names)
}

#[test]
fn test_staging_writes_index_and_text_values() {
    let df = DataFrame::new_infer_height(vec![
        Series::new("ID".into(), &[1i32, 2, 3]).into_column(),
        Series::new("First Name".into(), &[Some("alice"), None, Some("carol")]).into_column(),
        Series::new("score".into(), &[1.5f64, 2.0, -3.25]).into_column(),
    ])
    .unwrap();

    let dir = temp_dir("staging_text");
    let path = dir.join("people.csv");
    let staged = write_staging_file(&df, &names_of(&df), &path, &StagingOptions::default()).unwrap();
    assert_eq!(staged.rows, 3);
    assert_eq!(staged.index_column, "index");

    let text = fs::read_to_string(&path).unwrap();
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines[0], "index|id|first_name|score");
    assert_eq!(lines[1], "0|1|alice|1.5");
    assert!(lines[2].starts_with("1|2||"), "null should be empty: {}", lines[2]);
    assert!(lines[3].starts_with("2|3|carol|"));
    assert_eq!(lines.len(), 4);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_staging_writes_rows_in_chunks_with_one_header() {
    let df = df!("x" => [1i32, 2, 3, 4, 5]).unwrap();
    let dir = temp_dir("staging_chunks");
    let path = dir.join("chunked.csv");
    let opts = StagingOptions {
        chunk_rows: 2,
        ..Default::default()
    };
    write_staging_file(&df, &names_of(&df), &path, &opts).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines, vec!["index|x", "0|1", "1|2", "2|3", "3|4", "4|5"]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_staging_empty_frame_writes_header_only() {
    let df = DataFrame::new_infer_height(vec![
        Series::new("a".into(), Vec::<i32>::new()).into_column(),
    ])
    .unwrap();
    let dir = temp_dir("staging_empty");
    let path = dir.join("empty.csv");
    let staged = write_staging_file(&df, &names_of(&df), &path, &StagingOptions::default()).unwrap();
    assert_eq!(staged.rows, 0);
    assert_eq!(fs::read_to_string(&path).unwrap().trim_end(), "index|a");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_staging_index_name_avoids_existing_column() {
    let df = df!("Index" => ["a", "b"]).unwrap();
    let dir = temp_dir("staging_index");
    let path = dir.join("idx.csv");
    let staged = write_staging_file(&df, &names_of(&df), &path, &StagingOptions::default()).unwrap();
    assert_eq!(staged.index_column, "_0index");
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("_0index|index\n"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_staging_latin1_transcodes() {
    let df = df!("city" => ["café"]).unwrap();
    let dir = temp_dir("staging_latin1");
    let path = dir.join("latin1.csv");
    let opts = StagingOptions {
        encoding: StagingEncoding::Latin1,
        ..Default::default()
    };
    write_staging_file(&df, &names_of(&df), &path, &opts).unwrap();
    let bytes = fs::read(&path).unwrap();
    assert!(bytes.windows(4).any(|w| w == b"caf\xe9"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_staging_latin1_rejects_unmappable_text() {
    let df = df!("city" => ["東京"]).unwrap();
    let dir = temp_dir("staging_latin1_err");
    let path = dir.join("latin1.csv");
    let opts = StagingOptions {
        encoding: StagingEncoding::Latin1,
        ..Default::default()
    };
    let err = write_staging_file(&df, &names_of(&df), &path, &opts).unwrap_err();
    assert!(matches!(err, Error::Encoding(_)));

    let _ = fs::remove_dir_all(&dir);
}
