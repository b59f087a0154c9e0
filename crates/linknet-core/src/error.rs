use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the linknet pipeline.
#[derive(Error, Debug)]
pub enum InsightError {
    /// The uploaded file is not a valid archive, or the expected tabular
    /// file is missing inside it.
    #[error("Invalid archive: {0}")]
    ArchiveFormat(String),

    /// A column the pipeline cannot run without is absent from the input.
    #[error("Missing required column: {0}")]
    MissingRequiredColumn(String),

    /// A connection date did not match the expected input format.
    #[error("Malformed date value: {0}")]
    MalformedDate(String),

    /// Aggregation was requested on a column that does not exist.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Every row was filtered out, leaving nothing to aggregate.
    #[error("Dataset is empty after filtering; nothing to analyze")]
    EmptyDataset,

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV record could not be parsed.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The zip container could not be read.
    #[error("Failed to read zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the linknet crates.
pub type Result<T> = std::result::Result<T, InsightError>;
