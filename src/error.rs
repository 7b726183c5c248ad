//! Error types for the city index.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CityIndexError>;

#[derive(Debug, Error)]
pub enum CityIndexError {
    /// The reference city of a composite query is not in the spatial index.
    #[error("City not found: {0}")]
    CityNotFound(String),

    /// A store key holds a structure of a different kind than the operation expects.
    #[error("Wrong type for key '{key}': expected {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("Store is closed")]
    StoreClosed,

    /// Another indexing run holds the rebuild lock on this store.
    #[error("An index rebuild is already in progress")]
    RebuildInProgress,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl CityIndexError {
    pub(crate) fn wrong_type(key: &str, expected: &'static str) -> Self {
        Self::WrongType {
            key: key.to_string(),
            expected,
        }
    }
}
