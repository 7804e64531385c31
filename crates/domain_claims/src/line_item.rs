//! Priced estimate line items

use rust_decimal::Decimal;
use serde::Serialize;

use core_kernel::Money;
use crate::error::InputShapeError;

/// Default billing unit when the estimate does not name one
pub const DEFAULT_UNIT: &str = "EA";

/// Largest quantity (and room area) an estimate line may carry
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(10_000_000, 0, 0, false, 0);

/// Largest single amount (unit price, limit, reported total) accepted
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// A single priced line of a repair estimate
///
/// Line items are immutable once constructed. The `with_*` methods are
/// construction-time helpers that consume and return the item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    /// Estimating-system code (e.g. `WTR_AIRF`); may be blank
    code: String,
    /// Free-form description
    description: String,
    /// Billed quantity
    quantity: Decimal,
    /// Billing unit (EA, SF, LF, HR, DAY)
    unit: String,
    /// Price per unit
    unit_price: Money,
    /// Explicit room reference
    room: Option<String>,
    /// Equipment days billed, when the item is rented equipment
    days: Option<u32>,
    /// Quantity x unit price, fixed at construction
    total: Money,
}

impl LineItem {
    /// Creates a validated line item
    ///
    /// # Errors
    ///
    /// Fails when both code and description are blank, when quantity or
    /// unit price is negative, or when either exceeds [`MAX_QUANTITY`] /
    /// [`MAX_AMOUNT`].
    pub fn new(
        code: impl Into<String>,
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Money,
    ) -> Result<Self, InputShapeError> {
        let code = code.into().trim().to_string();
        let description = description.into().trim().to_string();

        if code.is_empty() && description.is_empty() {
            return Err(InputShapeError::missing("line item code or description"));
        }
        if quantity.is_sign_negative() && !quantity.is_zero() {
            return Err(InputShapeError::negative(format!("quantity of '{code}'"), quantity));
        }
        if unit_price.is_negative() {
            return Err(InputShapeError::negative(
                format!("unit price of '{code}'"),
                unit_price.amount(),
            ));
        }
        if quantity > MAX_QUANTITY {
            return Err(InputShapeError::out_of_range(
                format!("quantity of '{code}'"),
                quantity,
                MAX_QUANTITY,
            ));
        }
        if unit_price.amount() > MAX_AMOUNT {
            return Err(InputShapeError::out_of_range(
                format!("unit price of '{code}'"),
                unit_price.amount(),
                MAX_AMOUNT,
            ));
        }
        let total = unit_price
            .checked_mul(quantity)
            .map_err(|_| InputShapeError::Overflow {
                field: format!("total of '{code}'"),
            })?;

        Ok(Self {
            code,
            description,
            quantity,
            unit: DEFAULT_UNIT.to_string(),
            unit_price,
            room: None,
            days: None,
            total,
        })
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        let unit = unit.into().trim().to_uppercase();
        if !unit.is_empty() {
            self.unit = unit;
        }
        self
    }

    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        let room = room.into().trim().to_string();
        self.room = (!room.is_empty()).then_some(room);
        self
    }

    pub fn with_days(mut self, days: u32) -> Self {
        self.days = Some(days);
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    pub fn days(&self) -> Option<u32> {
        self.days
    }

    /// Derived total: quantity x unit price
    pub fn total(&self) -> Money {
        self.total
    }
}
