//! Claim domain errors

use core_kernel::{Currency, IdentifierError};
use rust_decimal::Decimal;
use thiserror::Error;

/// A claim record that cannot be audited because of its shape
///
/// Raised before any audit rule runs; no partial scorecard is produced.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputShapeError {
    #[error("Claim record rejected: {}", .errors.join("; "))]
    Rejected { errors: Vec<String> },

    #[error("Invalid identifier: {0}")]
    Identifier(#[from] IdentifierError),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("{field} must not be negative (got {value})")]
    NegativeAmount { field: String, value: Decimal },

    #[error("{field} exceeds the supported maximum of {max} (got {value})")]
    OutOfRange {
        field: String,
        value: Decimal,
        max: Decimal,
    },

    #[error("{field} overflows the supported amount range")]
    Overflow { field: String },

    #[error("Room '{room}' must have a positive area (got {sqft} sqft)")]
    NonPositiveArea { room: String, sqft: Decimal },

    #[error("Water category must be 1, 2 or 3 (got {0})")]
    InvalidWaterCategory(u8),

    #[error("Duplicate room name: {0}")]
    DuplicateRoom(String),

    #[error("Currency mismatch for {field}: expected {expected}, found {found}")]
    CurrencyMismatch {
        field: String,
        expected: Currency,
        found: Currency,
    },
}

impl InputShapeError {
    pub fn negative(field: impl Into<String>, value: Decimal) -> Self {
        InputShapeError::NegativeAmount {
            field: field.into(),
            value,
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        InputShapeError::MissingField(field.into())
    }

    pub fn out_of_range(field: impl Into<String>, value: Decimal, max: Decimal) -> Self {
        InputShapeError::OutOfRange {
            field: field.into(),
            value,
            max,
        }
    }
}
