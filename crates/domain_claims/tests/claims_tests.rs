//! Tests for domain_claims

use rust_decimal_macros::dec;

use core_kernel::{ClaimId, Currency, Money};

use domain_claims::claim::{ClaimData, PolicyLimits, ReportedTotals};
use domain_claims::line_item::{LineItem, MAX_AMOUNT, MAX_QUANTITY};
use domain_claims::property::{PropertyDetails, Room, WaterCategory};
use domain_claims::record::ClaimRecord;
use domain_claims::validation::ClaimValidator;
use domain_claims::InputShapeError;

fn usd(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::USD)
}

fn sample_record_json() -> serde_json::Value {
    serde_json::json!({
        "claim_id": "TEST-CLM-001",
        "policy": {
            "currency": "USD",
            "deductible": 1000,
            "coverage_a": 250000,
            "coverage_b": 25000,
            "coverage_c": 125000,
            "sub_limits": { "water": 10000 }
        },
        "line_items": [
            { "code": "WTR_AIRF", "description": "Air Mover", "quantity": 5, "unit_price": 35, "days": 3 },
            { "code": "WTR_DEHUM", "description": "Dehumidifier", "quantity": 2, "unit_price": 75 }
        ],
        "property": {
            "rooms": [ { "name": "Living Room", "sqft": 250 } ],
            "water_category": 1
        }
    })
}

// ============================================================================
// Claim Data Tests
// ============================================================================

mod claim_data_tests {
    use super::*;

    fn create_test_claim() -> ClaimData {
        let policy = PolicyLimits::new(usd(dec!(1000)), usd(dec!(250000)), usd(dec!(25000)), usd(dec!(125000)))
            .unwrap();
        let items = vec![
            LineItem::new("WTR_AIRF", "Air Mover", dec!(5), usd(dec!(35))).unwrap(),
            LineItem::new("WTR_DEHUM", "Dehumidifier", dec!(2), usd(dec!(75))).unwrap(),
        ];
        let property = PropertyDetails::new(
            vec![Room::new("Living Room", dec!(250)).unwrap()],
            Some(WaterCategory::Clean),
        )
        .unwrap();

        ClaimData::new(ClaimId::parse("TEST-CLM-001").unwrap(), policy, items, property).unwrap()
    }

    #[test]
    fn test_gross_total_sums_line_items() {
        let claim = create_test_claim();
        assert_eq!(claim.gross_total().amount(), dec!(325));
    }

    #[test]
    fn test_expected_net_floors_at_zero() {
        let claim = create_test_claim();
        assert!(claim.expected_net().is_zero());
    }

    #[test]
    fn test_line_item_currency_must_match_policy() {
        let policy = PolicyLimits::new(usd(dec!(0)), usd(dec!(1)), usd(dec!(1)), usd(dec!(1))).unwrap();
        let items = vec![LineItem::new("CLN_GEN", "Cleaning", dec!(1), Money::new(dec!(10), Currency::CAD)).unwrap()];

        let result = ClaimData::new(
            ClaimId::parse("CLM-1").unwrap(),
            policy,
            items,
            PropertyDetails::default(),
        );
        assert!(matches!(result, Err(InputShapeError::CurrencyMismatch { .. })));
    }

    #[test]
    fn test_reported_totals_attached() {
        let claim = create_test_claim()
            .with_reported_totals(ReportedTotals {
                gross: Some(usd(dec!(325))),
                net: None,
            })
            .unwrap();
        assert_eq!(claim.reported().gross, Some(usd(dec!(325))));
    }
}

// ============================================================================
// Line Item Tests
// ============================================================================

mod line_item_tests {
    use super::*;

    #[test]
    fn test_negative_quantity_rejected() {
        let result = LineItem::new("FCC_CPTREM", "Tear out carpet", dec!(-1), usd(dec!(1)));
        assert!(matches!(result, Err(InputShapeError::NegativeAmount { .. })));
    }

    #[test]
    fn test_negative_price_rejected() {
        let result = LineItem::new("FCC_CPTREM", "Tear out carpet", dec!(1), usd(dec!(-0.50)));
        assert!(matches!(result, Err(InputShapeError::NegativeAmount { .. })));
    }

    #[test]
    fn test_code_only_item_is_valid() {
        let item = LineItem::new("ZZZ_UNKNOWN", "", dec!(1), usd(dec!(10))).unwrap();
        assert_eq!(item.description(), "");
    }

    #[test]
    fn test_blank_item_rejected() {
        let result = LineItem::new(" ", " ", dec!(1), usd(dec!(10)));
        assert!(matches!(result, Err(InputShapeError::MissingField(_))));
    }

    #[test]
    fn test_quantity_times_price_beyond_range_rejected() {
        let huge = rust_decimal::Decimal::from(1_000_000_000_000_000i64);
        let result = LineItem::new("GEN_MISC", "Misc", huge, usd(huge));
        assert!(matches!(result, Err(InputShapeError::OutOfRange { .. })));
    }

    #[test]
    fn test_largest_supported_line_total() {
        let item = LineItem::new("GEN_MISC", "Misc", MAX_QUANTITY, usd(MAX_AMOUNT)).unwrap();
        assert_eq!(item.total().amount(), MAX_QUANTITY * MAX_AMOUNT);
    }

    #[test]
    fn test_unit_is_uppercased() {
        let item = LineItem::new("FCC_CPTINST", "Install carpet", dec!(300), usd(dec!(3.5)))
            .unwrap()
            .with_unit("sf");
        assert_eq!(item.unit(), "SF");
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    #[test]
    fn test_room_requires_positive_area() {
        assert!(matches!(
            Room::new("Kitchen", dec!(0)),
            Err(InputShapeError::NonPositiveArea { .. })
        ));
    }

    #[test]
    fn test_room_lookup_ignores_case() {
        let property = PropertyDetails::new(vec![Room::new("Living Room", dec!(300)).unwrap()], None).unwrap();
        assert!(property.room("living room").is_some());
        assert!(property.room("Kitchen").is_none());
    }

    #[test]
    fn test_water_category_serializes_as_level() {
        let json = serde_json::to_string(&WaterCategory::Gray).unwrap();
        assert_eq!(json, "2");
    }
}

// ============================================================================
// Record Conversion Tests
// ============================================================================

mod record_tests {
    use super::*;

    #[test]
    fn test_valid_record_converts() {
        let record: ClaimRecord = serde_json::from_value(sample_record_json()).unwrap();
        let claim = record.into_claim_data().unwrap();

        assert_eq!(claim.claim_id().as_str(), "TEST-CLM-001");
        assert_eq!(claim.line_items().len(), 2);
        assert_eq!(claim.line_items()[0].days(), Some(3));
        assert_eq!(claim.line_items()[0].unit(), "EA");
        assert_eq!(claim.property().water_category(), Some(WaterCategory::Clean));
        assert_eq!(claim.policy().sub_limit("water"), Some(usd(dec!(10000))));
    }

    #[test]
    fn test_negative_quantity_fails_closed() {
        let mut json = sample_record_json();
        json["line_items"][0]["quantity"] = serde_json::json!(-5);
        let record: ClaimRecord = serde_json::from_value(json).unwrap();

        let err = record.into_claim_data().unwrap_err();
        match err {
            InputShapeError::Rejected { errors } => {
                assert!(errors.iter().any(|e| e.contains("line_items[0].quantity")));
            }
            other => panic!("Expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn test_huge_quantity_and_price_fail_closed() {
        let mut json = sample_record_json();
        json["line_items"][0]["quantity"] = serde_json::json!(1_000_000_000_000_000u64);
        json["line_items"][0]["unit_price"] = serde_json::json!(1_000_000_000_000_000u64);
        let record: ClaimRecord = serde_json::from_value(json).unwrap();

        let err = record.into_claim_data().unwrap_err();
        match err {
            InputShapeError::Rejected { errors } => {
                assert!(errors.iter().any(|e| e.contains("line_items[0].quantity")));
                assert!(errors.iter().any(|e| e.contains("line_items[0].unit_price")));
            }
            other => panic!("Expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_limit_fails_closed() {
        let mut json = sample_record_json();
        json["policy"]["coverage_b"] = serde_json::json!(-1);
        let record: ClaimRecord = serde_json::from_value(json).unwrap();

        assert!(matches!(record.into_claim_data(), Err(InputShapeError::Rejected { .. })));
    }

    #[test]
    fn test_out_of_range_water_category_fails_closed() {
        let mut json = sample_record_json();
        json["property"]["water_category"] = serde_json::json!(4);
        let record: ClaimRecord = serde_json::from_value(json).unwrap();

        assert!(matches!(record.into_claim_data(), Err(InputShapeError::Rejected { .. })));
    }

    #[test]
    fn test_all_errors_reported_together() {
        let mut json = sample_record_json();
        json["claim_id"] = serde_json::json!("");
        json["property"]["rooms"][0]["sqft"] = serde_json::json!(0);
        json["line_items"][1]["unit_price"] = serde_json::json!(-75);
        let record: ClaimRecord = serde_json::from_value(json).unwrap();

        let report = ClaimValidator::validate(&record);
        assert!(!report.is_valid);
        assert!(report.errors.len() >= 3);
    }

    #[test]
    fn test_unknown_room_reference_is_warning() {
        let mut json = sample_record_json();
        json["line_items"][0]["room"] = serde_json::json!("Attic");
        let record: ClaimRecord = serde_json::from_value(json).unwrap();

        let report = ClaimValidator::validate(&record);
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.contains("Attic")));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn line_items() -> impl Strategy<Value = Vec<(u32, i64)>> {
        prop::collection::vec((0u32..500, 0i64..100_000), 0..12)
    }

    proptest! {
        #[test]
        fn test_gross_and_net_totals(items in line_items(), deductible_cents in 0i64..500_000) {
            let deductible = Decimal::new(deductible_cents, 2);
            let policy = PolicyLimits::new(
                usd(deductible),
                usd(dec!(250000)),
                usd(dec!(25000)),
                usd(dec!(125000)),
            )
            .unwrap();
            let line_items: Vec<LineItem> = items
                .iter()
                .map(|(qty, cents)| {
                    LineItem::new("GEN_ITEM", "Item", Decimal::from(*qty), usd(Decimal::new(*cents, 2))).unwrap()
                })
                .collect();
            let expected_gross: Decimal = items
                .iter()
                .map(|(qty, cents)| Decimal::from(*qty) * Decimal::new(*cents, 2))
                .sum();

            let claim = ClaimData::new(
                ClaimId::parse("CLM-PROP").unwrap(),
                policy,
                line_items,
                PropertyDetails::default(),
            )
            .unwrap();

            prop_assert_eq!(claim.gross_total().amount(), expected_gross);
            let expected_net = (expected_gross - deductible).max(Decimal::ZERO);
            prop_assert_eq!(claim.expected_net().amount(), expected_net);
            prop_assert!(!claim.expected_net().is_negative());
        }
    }
}
