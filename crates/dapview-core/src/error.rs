//! Error types for dapview

use thiserror::Error;

/// The main error type for dapview operations
#[derive(Debug, Error)]
pub enum DapviewError {
    /// An internal invariant of a view does not hold (slice/rank mismatch,
    /// a field segment missing during formatting).
    #[error("Schema inconsistency: {0}")]
    SchemaInconsistency(String),

    #[error("Filter type error: {0}")]
    FilterType(String),

    /// Programmer error: mutating a finished view, or pulling a record
    /// without a successful `has_next()`.
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid dataset description: {0}")]
    Schema(String),

    #[error("Invalid slice: {0}")]
    InvalidSlice(String),

    #[error("Record source error: {0}")]
    RecordSource(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),
}

/// Result type alias for dapview operations
pub type Result<T> = std::result::Result<T, DapviewError>;

impl From<toml::de::Error> for DapviewError {
    fn from(err: toml::de::Error) -> Self {
        DapviewError::TomlParseError(err.to_string())
    }
}
