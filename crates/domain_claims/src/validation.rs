//! Claim record validation rules
//!
//! Records are validated as a whole before conversion so that callers get
//! every problem at once instead of the first one.
//!
//! # Validation Rules
//!
//! ## Errors (record rejected)
//! - Claim id present; codes and descriptions within length limits
//! - Deductible, coverages, sub-limits, quantities and unit prices not negative
//! - Amounts at most `MAX_AMOUNT`, quantities and room areas at most
//!   `MAX_QUANTITY`, and no more than `MAX_LINE_ITEMS` line items
//! - Each line item has a code or a description
//! - Room areas strictly positive, room names unique ignoring case
//! - Water category 1, 2 or 3 when present
//!
//! ## Warnings (record accepted)
//! - Line item room reference that names no known room
//! - Zero-quantity line items
//! - Water line items without a documented water category

use rust_decimal::Decimal;
use validator::Validate;

use crate::claim::MAX_LINE_ITEMS;
use crate::line_item::{MAX_AMOUNT, MAX_QUANTITY};
use crate::record::{ClaimRecord, LineItemRecord, PolicyRecord, PropertyRecord};

/// Result of claim record validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the record may be converted
    pub is_valid: bool,
    /// List of validation errors
    pub errors: Vec<String>,
    /// List of validation warnings (non-fatal issues)
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Creates a successful validation result
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Adds an error to the result
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.is_valid = false;
    }

    /// Adds a warning to the result
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// Validator for submitted claim records
pub struct ClaimValidator;

impl ClaimValidator {
    /// Validates a claim record
    ///
    /// # Arguments
    ///
    /// * `record` - The raw claim record
    ///
    /// # Returns
    ///
    /// A `ValidationResult` containing any errors or warnings
    pub fn validate(record: &ClaimRecord) -> ValidationResult {
        let mut result = ValidationResult::ok();

        if let Err(errors) = record.validate() {
            for line in errors.to_string().lines().filter(|l| !l.trim().is_empty()) {
                result.add_error(line.trim());
            }
        }

        Self::validate_policy(&record.policy, &mut result);
        Self::validate_property(&record.property, &mut result);
        if record.line_items.len() > MAX_LINE_ITEMS {
            result.add_error(format!(
                "line_items: at most {MAX_LINE_ITEMS} items are supported (got {})",
                record.line_items.len()
            ));
        }
        for (index, item) in record.line_items.iter().enumerate() {
            Self::validate_line_item(index, item, &record.property, &mut result);
        }
        Self::validate_reported(record, &mut result);

        result
    }

    fn validate_policy(policy: &PolicyRecord, result: &mut ValidationResult) {
        for (field, amount) in [
            ("deductible", policy.deductible),
            ("coverage_a", policy.coverage_a),
            ("coverage_b", policy.coverage_b),
            ("coverage_c", policy.coverage_c),
        ] {
            require_amount(&format!("policy.{field}"), amount, result);
        }
        for (key, cap) in &policy.sub_limits {
            if key.trim().is_empty() {
                result.add_error("policy.sub_limits: key must not be blank");
            }
            require_amount(&format!("policy.sub_limits.{key}"), *cap, result);
        }
    }

    fn validate_property(property: &PropertyRecord, result: &mut ValidationResult) {
        if let Some(level) = property.water_category {
            if !(1..=3).contains(&level) {
                result.add_error(format!("property.water_category: must be 1, 2 or 3 (got {level})"));
            }
        }
        for (i, room) in property.rooms.iter().enumerate() {
            if room.sqft <= Decimal::ZERO {
                result.add_error(format!(
                    "property.rooms[{i}]: '{}' must have a positive area (got {})",
                    room.name, room.sqft
                ));
            }
            require_at_most(&format!("property.rooms[{i}].sqft"), room.sqft, MAX_QUANTITY, result);
            let duplicate = property.rooms[..i]
                .iter()
                .any(|earlier| earlier.name.trim().eq_ignore_ascii_case(room.name.trim()));
            if duplicate {
                result.add_error(format!("property.rooms[{i}]: duplicate room name '{}'", room.name));
            }
        }
    }

    fn validate_line_item(
        index: usize,
        item: &LineItemRecord,
        property: &PropertyRecord,
        result: &mut ValidationResult,
    ) {
        let label = format!("line_items[{index}]");

        if item.code.trim().is_empty() && item.description.trim().is_empty() {
            result.add_error(format!("{label}: code or description is required"));
        }
        require_non_negative(&format!("{label}.quantity"), item.quantity, result);
        require_at_most(&format!("{label}.quantity"), item.quantity, MAX_QUANTITY, result);
        require_amount(&format!("{label}.unit_price"), item.unit_price, result);

        if item.quantity.is_zero() {
            result.add_warning(format!("{label}: zero quantity"));
        }
        if let Some(room) = item.room.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            let known = property
                .rooms
                .iter()
                .any(|r| r.name.trim().eq_ignore_ascii_case(room));
            if !known {
                result.add_warning(format!("{label}: room '{room}' is not listed in property details"));
            }
        }
        if property.water_category.is_none() && item.code.trim().to_uppercase().starts_with("WTR") {
            result.add_warning(format!("{label}: water item without a documented water category"));
        }
    }

    fn validate_reported(record: &ClaimRecord, result: &mut ValidationResult) {
        if let Some(gross) = record.reported_gross {
            require_amount("reported_gross", gross, result);
        }
        if let Some(net) = record.reported_net {
            require_amount("reported_net", net, result);
        }
    }
}

fn require_amount(field: &str, value: Decimal, result: &mut ValidationResult) {
    require_non_negative(field, value, result);
    require_at_most(field, value, MAX_AMOUNT, result);
}

fn require_at_most(field: &str, value: Decimal, max: Decimal, result: &mut ValidationResult) {
    if value > max {
        result.add_error(format!("{field}: exceeds the supported maximum of {max} (got {value})"));
    }
}

fn require_non_negative(field: &str, value: Decimal, result: &mut ValidationResult) {
    if value.is_sign_negative() && !value.is_zero() {
        result.add_error(format!("{field}: must not be negative (got {value})"));
    }
}
