use crate::common::wide_df;
use polars_dta_export::batch::chunk_features;
use polars_dta_export::{
    feature_tokens, StagingEncoding, StataExporter, Step, VariableLabels, ARGUMENT_CEILING,
};
use std::path::{Path, PathBuf};

fn columns(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("c{i}")).collect()
}

fn exporter() -> StataExporter {
    StataExporter::new("/opt/stata/stata-mp")
        .with_output("/data/out", "wide")
        .with_script("/opt/scripts/csv_to_dta.do")
        .with_batch_flag("/e")
}

#[test]
fn test_small_payload_is_one_full_run() {
    let df = wide_df(5);
    let plan = exporter()
        .with_force_numeric(["c0", "c1"])
        .with_variable_labels(VariableLabels::from([("c2".to_string(), "Two".to_string())]))
        .plan(&df)
        .unwrap();

    assert!(!plan.batched);
    assert_eq!(plan.len(), 1);
    let inv = &plan.invocations[0];
    assert_eq!(inv.step, Step::Full);
    assert_eq!(inv.program, PathBuf::from("/opt/stata/stata-mp"));
    let dir = std::path::absolute("/data/out").unwrap();
    let script = std::path::absolute("/opt/scripts/csv_to_dta.do").unwrap();
    assert_eq!(
        inv.args,
        vec![
            "/e".to_string(),
            "do".to_string(),
            script.to_string_lossy().into_owned(),
            dir.join("wide.csv").to_string_lossy().into_owned(),
            dir.join("wide.dta").to_string_lossy().into_owned(),
            "utf-8".to_string(),
            "2".to_string(),
            "c0".to_string(),
            "c1".to_string(),
            "0".to_string(),
            "0".to_string(),
            "2".to_string(),
            "c2".to_string(),
            "Two".to_string(),
        ]
    );
}

#[test]
fn test_payload_at_ceiling_stays_single() {
    let df = wide_df(ARGUMENT_CEILING);
    let plan = exporter().with_force_numeric(columns(ARGUMENT_CEILING)).plan(&df).unwrap();
    assert!(!plan.batched);
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.invocations[0].script_args.len(), 3 + 4 + ARGUMENT_CEILING);
}

#[test]
fn test_payload_over_ceiling_is_batched() {
    let df = wide_df(60);
    let labels = columns(20)
        .into_iter()
        .map(|c| (c.clone(), format!("Label {c}")))
        .collect::<VariableLabels>();
    let exporter = exporter().with_force_numeric(columns(40)).with_variable_labels(labels);
    let plan = exporter.plan(&df).unwrap();

    let chunks = chunk_features(&feature_tokens(&exporter.resolve(&df)));
    assert!(plan.batched);
    assert_eq!(plan.len(), 1 + chunks.len());
    assert_eq!(
        plan.invocations.iter().map(|i| i.step.clone()).collect::<Vec<_>>(),
        vec![
            Step::Base,
            Step::Chunk("numeric_1".to_string()),
            Step::Chunk("numeric_2".to_string()),
            Step::Chunk("varlabel_1".to_string()),
            Step::Chunk("varlabel_2".to_string()),
        ]
    );

    // base run carries only the two paths and the encoding
    assert_eq!(plan.invocations[0].script_args.len(), 3);

    let mut numeric = Vec::new();
    for inv in &plan.invocations[1..] {
        let args = &inv.script_args;
        let count: usize = args[4].parse().unwrap();
        assert_eq!(args.len(), 5 + count);
        assert!(count < ARGUMENT_CEILING);
        if args[3].starts_with("numeric_") {
            numeric.extend(args[5..].iter().cloned());
        }
    }
    assert_eq!(numeric, columns(40));
}

#[test]
fn test_batched_labels_never_split_a_pair() {
    let df = wide_df(50);
    let labels = columns(50)
        .into_iter()
        .map(|c| (c.clone(), format!("{c} label")))
        .collect::<VariableLabels>();
    let plan = exporter().with_variable_labels(labels).plan(&df).unwrap();
    assert!(plan.batched);
    for inv in &plan.invocations[1..] {
        let tokens = &inv.script_args[5..];
        assert_eq!(tokens.len() % 2, 0);
        for pair in tokens.chunks(2) {
            assert_eq!(pair[1], format!("{} label", pair[0]));
        }
    }
}

#[test]
fn test_definitions_are_merged_before_assignments() {
    use polars_dta_export::{ValueLabelSet, ValueLabels};

    let df = wide_df(30);
    let mut vl = ValueLabels::new();
    for c in columns(30) {
        let set = format!("{c}_lbl");
        vl = vl
            .define(set.clone(), &ValueLabelSet::from_iter([(1, "Yes"), (0, "No")]))
            .assign(c, set);
    }
    let plan = exporter().with_value_labels(vl).plan(&df).unwrap();
    let order = plan.invocations[1..]
        .iter()
        .map(|i| i.script_args[3].split('_').next().unwrap().to_string())
        .collect::<Vec<_>>();
    let first_define = order.iter().position(|k| k == "vldefine").unwrap();
    let first_assign = order.iter().position(|k| k == "vlassign").unwrap();
    let last_numeric = order.iter().rposition(|k| k == "numeric").unwrap();
    assert!(last_numeric < first_define);
    assert!(first_define < first_assign);
}

#[test]
fn test_latin1_staging_is_announced_to_every_run() {
    let df = wide_df(60);
    let plan = exporter()
        .with_staging_encoding(StagingEncoding::Latin1)
        .with_force_numeric(columns(60))
        .plan(&df)
        .unwrap();
    assert!(plan.batched);
    for inv in &plan.invocations {
        assert_eq!(inv.script_args[2], "latin1");
    }

    let plan = exporter().plan(&df).unwrap();
    assert_eq!(plan.invocations[0].script_args[2], "utf-8");
}

#[test]
fn test_relative_paths_survive_a_working_dir() {
    let df = wide_df(3);
    let plan = StataExporter::new("stata-mp")
        .with_output("out", "x")
        .with_working_dir("/var/log/stata")
        .plan(&df)
        .unwrap();
    let inv = &plan.invocations[0];
    let cwd = std::env::current_dir().unwrap();

    assert_eq!(PathBuf::from(&inv.script_args[0]), cwd.join("out").join("x.csv"));
    assert_eq!(PathBuf::from(&inv.script_args[1]), cwd.join("out").join("x.dta"));
    let script = Path::new(&inv.args[2]);
    assert!(script.is_absolute());
    assert_eq!(script, cwd.join("out").join("x_csv_to_dta.do"));
}

#[test]
fn test_relative_script_is_made_absolute() {
    let df = wide_df(3);
    let plan = StataExporter::new("stata-mp")
        .with_output("out", "x")
        .with_script("scripts/custom.do")
        .plan(&df)
        .unwrap();
    let cwd = std::env::current_dir().unwrap();
    assert_eq!(
        PathBuf::from(&plan.invocations[0].args[2]),
        cwd.join("scripts").join("custom.do")
    );
}
