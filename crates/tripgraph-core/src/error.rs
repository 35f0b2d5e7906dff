// crates/tripgraph-core/src/error.rs

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("graph store unreachable at {uri}: {message}")]
    Connectivity { uri: String, message: String },

    #[error("failed to load {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("source table is missing required columns: {missing:?}")]
    Schema { missing: Vec<String> },

    #[error("column {column} has type {found}, expected {expected}")]
    ColumnType {
        column: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("column {column} row {row}: {message}")]
    Parse {
        column: &'static str,
        row: usize,
        message: String,
    },

    #[error("trip {pickup} -> {dropoff} references a Location node that does not exist")]
    Write { pickup: i64, dropoff: i64 },

    #[error("graph statement failed: {0}")]
    Store(String),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl From<neo4rs::Error> for LoaderError {
    fn from(err: neo4rs::Error) -> Self {
        LoaderError::Store(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LoaderError>;
