//! Error types for the Q5 engine
//!
//! Every variant is fatal to the query that raised it. Join misses are not
//! errors and never show up here.

use std::path::PathBuf;

use arrow::error::ArrowError;
use thiserror::Error;

use crate::schema::Table;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// No region record carries the requested name
    #[error("region '{name}' not found")]
    RegionNotFound { name: String },

    /// A table could not be opened or decoded by its record source
    #[error("table '{table}' unavailable at {}: {source}", path.display())]
    SourceUnavailable {
        table: Table,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A source does not provide a column the join needs
    #[error("table '{table}' has no column '{column}'")]
    MissingColumn { table: Table, column: &'static str },

    /// A monetary field could not be read as a decimal
    #[error("malformed numeric value in {table}.{column}: {reason}")]
    MalformedNumeric {
        table: Table,
        column: &'static str,
        reason: String,
    },

    /// A key resolved in one index is missing from the index it chains into
    #[error("{index} index has no entry for key '{key}'")]
    CorruptIndex { index: &'static str, key: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to write results to {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Arrow(#[from] ArrowError),
}
