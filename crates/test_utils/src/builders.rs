//! Test Data Builders
//!
//! Provides builder patterns for constructing test claims with sensible
//! defaults. Tests specify only the line items and rooms they care about
//! and take the standard policy for everything else.

use core_kernel::{ClaimId, Currency, Money};
use domain_claims::{
    ClaimData, LineItem, PolicyLimits, PropertyDetails, ReportedTotals, Room, WaterCategory,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Creates a USD line item, panicking on invalid input
pub fn item(code: &str, description: &str, quantity: Decimal, unit_price: Decimal) -> LineItem {
    LineItem::new(code, description, quantity, Money::new(unit_price, Currency::USD))
        .expect("test line item should be valid")
}

/// Creates an affected room, panicking on invalid input
pub fn room(name: &str, sqft: Decimal) -> Room {
    Room::new(name, sqft).expect("test room should be valid")
}

/// Builder for constructing test claim data
pub struct ClaimDataBuilder {
    claim_id: String,
    deductible: Decimal,
    coverage_a: Decimal,
    coverage_b: Decimal,
    coverage_c: Decimal,
    sub_limits: Vec<(String, Decimal)>,
    items: Vec<LineItem>,
    rooms: Vec<Room>,
    water_category: Option<WaterCategory>,
    reported: ReportedTotals,
}

impl Default for ClaimDataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimDataBuilder {
    /// Creates a new builder with the standard homeowner policy and no items
    pub fn new() -> Self {
        Self {
            claim_id: "CLM-TEST-001".to_string(),
            deductible: dec!(1000),
            coverage_a: dec!(250000),
            coverage_b: dec!(25000),
            coverage_c: dec!(125000),
            sub_limits: Vec::new(),
            items: Vec::new(),
            rooms: Vec::new(),
            water_category: None,
            reported: ReportedTotals::default(),
        }
    }

    /// Sets the claim ID
    pub fn with_claim_id(mut self, id: impl Into<String>) -> Self {
        self.claim_id = id.into();
        self
    }

    /// Sets the deductible
    pub fn with_deductible(mut self, deductible: Decimal) -> Self {
        self.deductible = deductible;
        self
    }

    /// Sets the three coverage limits
    pub fn with_coverages(mut self, a: Decimal, b: Decimal, c: Decimal) -> Self {
        self.coverage_a = a;
        self.coverage_b = b;
        self.coverage_c = c;
        self
    }

    pub fn with_sub_limit(mut self, key: &str, cap: Decimal) -> Self {
        self.sub_limits.push((key.to_string(), cap));
        self
    }

    pub fn with_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = LineItem>) -> Self {
        self.items.extend(items);
        self
    }

    pub fn with_room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }

    pub fn with_water_category(mut self, category: WaterCategory) -> Self {
        self.water_category = Some(category);
        self
    }

    /// Sets the gross and net totals stated on the estimate
    pub fn with_reported(mut self, gross: Option<Decimal>, net: Option<Decimal>) -> Self {
        self.reported = ReportedTotals {
            gross: gross.map(|g| Money::new(g, Currency::USD)),
            net: net.map(|n| Money::new(n, Currency::USD)),
        };
        self
    }

    /// Builds the claim, panicking if the test data is invalid
    pub fn build(self) -> ClaimData {
        let usd = |amount| Money::new(amount, Currency::USD);
        let mut policy = PolicyLimits::new(
            usd(self.deductible),
            usd(self.coverage_a),
            usd(self.coverage_b),
            usd(self.coverage_c),
        )
        .expect("test policy should be valid");
        for (key, cap) in &self.sub_limits {
            policy = policy
                .with_sub_limit(key, usd(*cap))
                .expect("test sub-limit should be valid");
        }

        let property = PropertyDetails::new(self.rooms, self.water_category)
            .expect("test property should be valid");
        let claim_id = ClaimId::parse(&self.claim_id).expect("test claim id should be valid");

        ClaimData::new(claim_id, policy, self.items, property)
            .and_then(|claim| claim.with_reported_totals(self.reported))
            .expect("test claim should be valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let claim = ClaimDataBuilder::new().build();
        assert_eq!(claim.claim_id().as_str(), "CLM-TEST-001");
        assert_eq!(claim.policy().deductible().amount(), dec!(1000));
        assert!(claim.line_items().is_empty());
        assert_eq!(claim.property().water_category(), None);
    }

    #[test]
    fn test_builder_items_and_rooms() {
        let claim = ClaimDataBuilder::new()
            .with_item(item("GEN_PAINT", "Paint walls", dec!(100), dec!(1.50)))
            .with_room(room("Kitchen", dec!(150)))
            .with_water_category(WaterCategory::Gray)
            .build();
        assert_eq!(claim.gross_total().amount(), dec!(150));
        assert_eq!(claim.property().total_affected_sqft(), dec!(150));
        assert_eq!(claim.property().water_category(), Some(WaterCategory::Gray));
    }
}
