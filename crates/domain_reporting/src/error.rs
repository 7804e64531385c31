//! Reporting error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Unknown report format: {0}")]
    UnknownFormat(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid redaction pattern: {0}")]
    Pattern(#[from] regex::Error),
}
