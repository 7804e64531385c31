//! Core Kernel - Foundational types for the claim integrity engine
//!
//! This crate provides the building blocks shared by every audit crate:
//! - Money types with precise decimal arithmetic for claim amounts
//! - Strongly-typed identifiers for claims, rules, and audit runs

pub mod money;
pub mod identifiers;

pub use money::{Money, Currency, MoneyError};
pub use identifiers::{ClaimId, RuleId, AuditRunId, IdentifierError};
