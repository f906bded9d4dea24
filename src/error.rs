//! Error types shared by the pipeline stages.

use std::path::PathBuf;

use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input table lacks a column the stage depends on.
    #[error("missing required column `{column}` in {}", path.display())]
    MissingColumn { column: String, path: PathBuf },

    #[error("could not parse `{value}` as a calendar date")]
    InvalidDate { value: String },

    #[error("could not parse `{value}` as a boolean flag")]
    InvalidFlag { value: String },

    #[error("trend rows must be strictly ascending by date ({previous} followed by {next})")]
    UnorderedTrend { previous: NaiveDate, next: NaiveDate },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
