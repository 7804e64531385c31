//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random audit inputs and
//! findings that maintain domain invariants.

use core_kernel::{Currency, Money, RuleId};
use domain_audit::{AuditCategory, AuditDomain, AuditFinding, AuditSeverity};
use domain_claims::{ClaimData, LineItem, WaterCategory};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::builders::{room, ClaimDataBuilder};

/// Codes and descriptions drawn from every trade in the catalog
const VOCABULARY: [(&str, &str); 16] = [
    ("WTR_AIRF", "Air Mover - per unit/day"),
    ("WTR_DEHUM", "Dehumidifier - Large"),
    ("WTR_SCRUB", "Air Scrubber - HEPA"),
    ("WTR_MONITOR", "Daily Monitoring - Technician"),
    ("WTR_PPE", "PPE - Tyvek Suits"),
    ("FCC_CPTREM", "Tear out Carpet"),
    ("FCC_PADREM", "Tear out Pad"),
    ("FCC_CPTINST", "Install Carpet"),
    ("FCC_WASTE", "Carpet Waste"),
    ("FNC_HWDINST", "Install Hardwood Flooring"),
    ("GEN_DOOR", "Pre-hung Interior Door"),
    ("GEN_HINGE", "Door Hinges"),
    ("DEM_DRYWALL", "Demo Drywall"),
    ("GEN_SVC", "Plumbing Service Call"),
    ("CNT_MOVE", "Contents Move Out"),
    ("ZZZ_MISC", "Miscellaneous"),
];

const ROOMS: [&str; 3] = ["Living Room", "Kitchen", "Bedroom"];

pub fn severity_strategy() -> impl Strategy<Value = AuditSeverity> {
    prop::sample::select(AuditSeverity::ALL.to_vec())
}

pub fn category_strategy() -> impl Strategy<Value = AuditCategory> {
    prop::sample::select(AuditCategory::ALL.to_vec())
}

pub fn domain_strategy() -> impl Strategy<Value = AuditDomain> {
    prop::sample::select(AuditDomain::ALL.to_vec())
}

/// Strategy for cent-precision amounts up to 10,000
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for findings with arbitrary severity, category and exposure
pub fn finding_strategy() -> impl Strategy<Value = AuditFinding> {
    (
        domain_strategy(),
        category_strategy(),
        severity_strategy(),
        prop::option::of(amount_strategy()),
        1u32..999,
    )
        .prop_map(|(domain, category, severity, delta, n)| {
            let rule_id = RuleId::parse(format!("{}-{n:03}", domain.rule_prefix()))
                .expect("generated rule id should be valid");
            AuditFinding::new(rule_id, "Generated", domain, category, severity, "Generated finding", "generated", delta)
        })
}

/// Strategy for line items drawn from the catalog vocabulary
pub fn line_item_strategy() -> impl Strategy<Value = LineItem> {
    (
        prop::sample::select(VOCABULARY.to_vec()),
        1u32..400,
        amount_strategy(),
        prop::option::of(prop::sample::select(ROOMS.to_vec())),
        prop::option::of(1u32..15),
    )
        .prop_map(|((code, description), quantity, price, room, days)| {
            let mut item = LineItem::new(code, description, Decimal::from(quantity), Money::new(price, Currency::USD))
                .expect("generated line item should be valid");
            if let Some(room) = room {
                item = item.with_room(room);
            }
            if let Some(days) = days {
                item = item.with_days(days);
            }
            item
        })
}

/// Strategy for whole claims with rooms, a water category and mixed trades
pub fn claim_strategy() -> impl Strategy<Value = ClaimData> {
    (
        prop::collection::vec(line_item_strategy(), 0..24),
        prop::collection::vec(50u32..800, 0..=3),
        prop::option::of(1u8..=3),
        amount_strategy(),
    )
        .prop_map(|(items, sizes, category, deductible)| {
            let mut builder = ClaimDataBuilder::new()
                .with_claim_id("CLM-GEN-001")
                .with_deductible(deductible)
                .with_items(items);
            for (name, sqft) in ROOMS.iter().zip(sizes) {
                builder = builder.with_room(room(name, Decimal::from(sqft)));
            }
            if let Some(level) = category.and_then(|l| WaterCategory::try_from(l).ok()) {
                builder = builder.with_water_category(level);
            }
            builder.build()
        })
}
