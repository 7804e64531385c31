//! Strongly-typed identifiers for audit entities
//!
//! Claim numbers and rule ids come from upstream systems and are carried
//! as validated strings; audit runs are minted locally as UUIDs. Newtype
//! wrappers keep the different identifier kinds from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised when parsing a textual identifier
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },

    #[error("{kind} contains invalid characters: {value}")]
    InvalidCharacters { kind: &'static str, value: String },

    #[error("Invalid UUID: {0}")]
    Uuid(String),
}

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new_v7()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Uuid::parse_str(uuid_str)
                    .map(Self)
                    .map_err(|e| IdentifierError::Uuid(e.to_string()))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

/// Defines a string identifier that rejects blank values and whitespace
/// inside the code. Surrounding whitespace is trimmed and the rest is
/// passed through `$normalize`.
macro_rules! define_code {
    ($name:ident, $kind:literal, $normalize:path) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parses and validates an identifier
            pub fn parse(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
                let trimmed = value.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(IdentifierError::Empty { kind: $kind });
                }
                if trimmed.chars().any(char::is_whitespace) {
                    return Err(IdentifierError::InvalidCharacters {
                        kind: $kind,
                        value: trimmed.to_string(),
                    });
                }
                Ok(Self($normalize(trimmed)))
            }

            /// Returns the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_code!(ClaimId, "claim id", String::from);
// Rule ids compare case-insensitively, so they are stored upper case
define_code!(RuleId, "rule id", str::to_uppercase);

define_id!(AuditRunId, "AUD");

impl RuleId {
    /// Returns the domain namespace of the id (`"WTR"` for `"WTR-006"`)
    pub fn namespace(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_id_trims_whitespace() {
        let id = ClaimId::parse("  CLM-2024-001 ").unwrap();
        assert_eq!(id.as_str(), "CLM-2024-001");
    }

    #[test]
    fn test_rule_id_namespace() {
        let id = RuleId::parse("WTR-006").unwrap();
        assert_eq!(id.namespace(), "WTR");
    }

    #[test]
    fn test_audit_run_id_parsing() {
        let original = AuditRunId::new_v7();
        let parsed: AuditRunId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }
}
