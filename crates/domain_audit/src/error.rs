//! Audit domain errors

use thiserror::Error;

use core_kernel::{IdentifierError, MoneyError, RuleId};
use domain_claims::InputShapeError;
use crate::taxonomy::AuditDomain;

/// Errors that abort an audit call or engine construction
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Duplicate rule id {rule_id} in {domain} registry")]
    DuplicateRule { domain: AuditDomain, rule_id: RuleId },

    #[error("Invalid claim input: {0}")]
    InputShape(#[from] InputShapeError),

    #[error("Invalid rule id: {0}")]
    RuleId(#[from] IdentifierError),

    #[error("Unknown audit domain: {0}")]
    UnknownDomain(String),

    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AuditError {
    pub fn configuration(message: impl Into<String>) -> Self {
        AuditError::Configuration(message.into())
    }
}

/// Failure inside a single rule predicate
///
/// Contained by the engine: converted into a synthetic finding for the
/// failing rule while the rest of the audit proceeds.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("{0}")]
    Evaluation(String),
}

impl RuleError {
    pub fn evaluation(message: impl Into<String>) -> Self {
        RuleError::Evaluation(message.into())
    }
}
