use polars::prelude::{DataType, PolarsError};
use thiserror::Error;
pub type Result<T> = std::result::Result<T, DataError>;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid record at position {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
    #[error("Duplicate entity id {0}")]
    DuplicateId(u64),
    #[error("No ids left to assign after the largest explicit id")]
    IdSpaceExhausted,
    #[error("Unknown state code '{0}'")]
    UnknownState(String),
    #[error("Column '{column}' has type {found}, expected {expected}")]
    ColumnType {
        column: &'static str,
        expected: DataType,
        found: DataType,
    },
    #[error("Column '{0}' contains null values")]
    NullValues(&'static str),
}
