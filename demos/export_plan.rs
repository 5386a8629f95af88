use polars::prelude::*;
use polars_dta_export::{Result, StataExporter, ValueLabelSet, ValueLabels, VariableLabels};

/// Usage: export_plan [stata_path]
///
/// Prints the Stata runs for a 60-column dataset with labels on every column.
fn main() -> Result<()> {
    let stata = std::env::args().nth(1).unwrap_or_else(|| "stata-mp".to_string());

    let cols = (0..60)
        .map(|i| Series::new(format!("Q{i}").into(), &["1", "2", "1"]).into_column())
        .collect::<Vec<_>>();
    let df = DataFrame::new_infer_height(cols)?;

    let yes_no = ValueLabelSet::from_iter([(1, "Yes"), (2, "No")]);
    let mut value_labels = ValueLabels::new().define("yesno", &yes_no);
    let mut variable_labels = VariableLabels::new();
    for i in 0..60 {
        value_labels = value_labels.assign(format!("q{i}"), "yesno");
        variable_labels.insert(format!("q{i}"), format!("Question \"{i}\""));
    }

    let plan = StataExporter::new(stata)
        .with_output(std::env::temp_dir(), "survey")
        .with_value_labels(value_labels)
        .with_variable_labels(variable_labels)
        .plan(&df)?;

    println!("{} run(s), batched: {}", plan.len(), plan.batched);
    for invocation in &plan.invocations {
        println!("[{}] {}", invocation.step, invocation.command_line());
    }
    Ok(())
}
