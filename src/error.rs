use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Stata exited with {} during {step}", describe_code(.code))]
    ExternalProcess { step: String, code: Option<i32> },

    #[error("Invalid export options: {0}")]
    InvalidOptions(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Metadata JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
