//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! claim audit test suite.
//!
//! # Modules
//!
//! - `fixtures`: Ready-made claims exercising each audit domain
//! - `builders`: Builder patterns for test claim construction
//! - `assertions`: Custom assertion helpers for money and findings
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
