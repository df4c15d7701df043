use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while writing report files.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The output directory could not be created.
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report file could not be created or written.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV encoder failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The chart backend failed to draw or encode an image.
    #[error("Failed to render chart {path}: {message}")]
    Chart { path: PathBuf, message: String },
}

/// Convenience alias used throughout the report crate.
pub type Result<T> = std::result::Result<T, ReportError>;
