use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a source file into a [`CustomerTable`](crate::data::model::CustomerTable).
///
/// Load errors are fatal for the dashboard: nothing downstream is rendered
/// until a readable file is supplied.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("data file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("unsupported file extension: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedColumnType { column: String, data_type: String },

    #[error("row {row}, column '{column}': invalid value '{value}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
}

pub type LoadResult<T> = Result<T, LoadError>;
