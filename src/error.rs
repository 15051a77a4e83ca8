use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the loading, filtering, aggregation and export pipeline.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("spreadsheet error: {0}")]
    Workbook(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("column '{column}' not found")]
    MissingColumn { column: String },

    #[error("{dataset}: {reason}")]
    Schema { dataset: String, reason: String },

    #[error("export failed: {0}")]
    Export(String),
}

impl From<calamine::Error> for DashboardError {
    fn from(e: calamine::Error) -> Self {
        DashboardError::Workbook(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for DashboardError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        DashboardError::Export(format!("xlsx: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
