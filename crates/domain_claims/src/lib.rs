//! Claim Estimate Domain
//!
//! This crate models the itemized property-claim estimate that the audit
//! engine reads: policy limits, priced line items, and the affected rooms
//! of the property.
//!
//! # Ingestion
//!
//! ```text
//! JSON / upstream record -> ClaimRecord -> ClaimValidator -> ClaimData
//! ```
//!
//! Every domain type is validated at construction and immutable afterwards.
//! Raw records that carry out-of-range values are rejected, never coerced.

pub mod claim;
pub mod line_item;
pub mod property;
pub mod record;
pub mod validation;
pub mod error;

pub use claim::{ClaimData, PolicyLimits, ReportedTotals};
pub use line_item::LineItem;
pub use property::{PropertyDetails, Room, WaterCategory};
pub use record::{ClaimRecord, LineItemRecord, PolicyRecord, PropertyRecord, RoomRecord};
pub use validation::{ClaimValidator, ValidationResult};
pub use error::InputShapeError;
