use thiserror::Error;

/// Error type that captures common ledger failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Import failed: {0}")]
    Import(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Ledger not found: {0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(String),
}
