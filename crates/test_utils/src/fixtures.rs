//! Pre-built Test Fixtures
//!
//! Provides ready-to-use claims for the audit test suite. Each fixture is
//! small and predictable so tests can state the exact findings expected.

use domain_claims::{ClaimData, ClaimRecord, WaterCategory};
use rust_decimal_macros::dec;

use crate::builders::{item, room, ClaimDataBuilder};

/// Fixture claims keyed by the audit behavior they exercise
pub struct ClaimFixtures;

impl ClaimFixtures {
    /// A claim that no built-in rule flags
    pub fn clean_claim() -> ClaimData {
        ClaimDataBuilder::new()
            .with_claim_id("CLM-CLEAN-001")
            .with_item(item("GEN_PAINT", "Paint walls - two coats", dec!(400), dec!(1.10)))
            .build()
    }

    /// Five air movers in a 300 sqft Category 1 room where two are required
    pub fn overbilled_air_movers() -> ClaimData {
        ClaimDataBuilder::new()
            .with_claim_id("CLM-WTR-AIR-001")
            .with_room(room("Living Room", dec!(300)))
            .with_water_category(WaterCategory::Clean)
            .with_item(
                item("WTR_AIRF", "Air Mover - per unit/day", dec!(5), dec!(35))
                    .with_room("Living Room")
                    .with_days(3),
            )
            .build()
    }

    /// Carpet and pad tear-out billed in the same room
    pub fn carpet_pad_same_room() -> ClaimData {
        ClaimDataBuilder::new()
            .with_claim_id("CLM-FLR-OVL-001")
            .with_room(room("Living Room", dec!(300)))
            .with_room(room("Kitchen", dec!(150)))
            .with_item(item("FCC_CPTREM", "Tear out Carpet", dec!(300), dec!(0.85)).with_room("Living Room"))
            .with_item(item("FCC_PADREM", "Tear out Pad", dec!(300), dec!(0.35)).with_room("Living Room"))
            .build()
    }

    /// Carpet and pad tear-out billed in different rooms
    pub fn carpet_pad_different_rooms() -> ClaimData {
        ClaimDataBuilder::new()
            .with_claim_id("CLM-FLR-OVL-002")
            .with_room(room("Living Room", dec!(300)))
            .with_room(room("Kitchen", dec!(150)))
            .with_item(item("FCC_CPTREM", "Tear out Carpet", dec!(300), dec!(0.85)).with_room("Living Room"))
            .with_item(item("FCC_PADREM", "Tear out Pad", dec!(150), dec!(0.35)).with_room("Kitchen"))
            .build()
    }

    /// A claim whose only line item matches nothing in the catalog
    pub fn unknown_code_claim() -> ClaimData {
        ClaimDataBuilder::new()
            .with_claim_id("CLM-UNK-001")
            .with_item(item("ZZZ_UNKNOWN", "Miscellaneous charge", dec!(1), dec!(250)))
            .build()
    }

    /// The water, flooring and general repair claim used in walkthroughs
    ///
    /// Expected findings with the default policy:
    ///
    /// - WTR-006 CRITICAL (12 air movers where 3 are required)
    /// - WTR-006 WARNING (3 dehumidifiers where 2 are required)
    /// - WTR-004 ERROR (PPE on a Category 1 loss)
    /// - FLR-001 WARNING (carpet waste at 20%)
    /// - FLR-002 WARNING (carpet and pad tear-out in the Living Room)
    /// - FLR-003 INFO (hardwood without floor prep)
    /// - FLR-004 INFO (installs in two rooms with no transitions)
    /// - GEN-001 WARNING twice (door hinges, wallpaper removal)
    /// - GEN-002 INFO (flooring work without content handling)
    pub fn sample_claim() -> ClaimData {
        ClaimDataBuilder::new()
            .with_claim_id("CLM-2024-WTR-001")
            .with_sub_limit("water", dec!(15000))
            .with_room(room("Living Room", dec!(300)))
            .with_room(room("Kitchen", dec!(150)))
            .with_water_category(WaterCategory::Clean)
            .with_items([
                item("WTR_AIRF", "Air Mover - per unit/day", dec!(12), dec!(35)).with_days(5),
                item("WTR_DEHUM", "Dehumidifier - Large", dec!(3), dec!(75)).with_days(5),
                item("WTR_MONITOR", "Daily Monitoring - Technician", dec!(7), dec!(85)).with_unit("DAY"),
                item("WTR_PPE", "PPE - Tyvek Suits, Respirators", dec!(10), dec!(45)),
                item("FCC_CPTREM", "Tear out Carpet - Living Room", dec!(300), dec!(0.85))
                    .with_unit("SF")
                    .with_room("Living Room"),
                item("FCC_PADREM", "Tear out Pad - Living Room", dec!(300), dec!(0.35))
                    .with_unit("SF")
                    .with_room("Living Room"),
                item("FCC_CPTINST", "Install Carpet - Living Room", dec!(300), dec!(4.50))
                    .with_unit("SF")
                    .with_room("Living Room"),
                item("FCC_WASTE", "Carpet Waste/Cutoff", dec!(60), dec!(4.50))
                    .with_unit("SF")
                    .with_room("Living Room"),
                item("FNC_HWDINST", "Install Hardwood Flooring - Kitchen", dec!(150), dec!(8.50))
                    .with_unit("SF")
                    .with_room("Kitchen"),
                item("GEN_DOOR", "Pre-hung Interior Door", dec!(2), dec!(285)),
                item("GEN_HINGE", "Door Hinges - 3.5 inch", dec!(6), dec!(8.50)),
                item("DEM_DRYWALL", "Demo Drywall - water damaged", dec!(200), dec!(1.25)).with_unit("SF"),
                item("DEM_WALLPAPER", "Remove Wallpaper", dec!(100), dec!(0.75)).with_unit("SF"),
            ])
            .build()
    }

    /// A raw record as it arrives over the API
    pub fn sample_record_json() -> serde_json::Value {
        serde_json::json!({
            "claim_id": "CLM-2024-REC-001",
            "policy": {
                "deductible": "1000",
                "coverage_a": "250000",
                "coverage_b": "25000",
                "coverage_c": "125000",
                "sub_limits": { "water": "15000" }
            },
            "line_items": [
                { "code": "WTR_AIRF", "description": "Air Mover - per unit/day", "quantity": "5", "unit_price": "35", "room": "Living Room", "days": 3 },
                { "code": "FCC_CPTREM", "description": "Tear out Carpet", "quantity": "300", "unit": "SF", "unit_price": "0.85", "room": "Living Room" },
                { "code": "FCC_PADREM", "description": "Tear out Pad", "quantity": "300", "unit": "SF", "unit_price": "0.35", "room": "Living Room" }
            ],
            "property": {
                "rooms": [ { "name": "Living Room", "sqft": "300" } ],
                "water_category": 1
            }
        })
    }

    /// The sample record decoded into its serde shape
    pub fn sample_record() -> ClaimRecord {
        serde_json::from_value(Self::sample_record_json()).expect("sample record should deserialize")
    }

    /// A record the validator must reject as a whole
    pub fn invalid_record() -> ClaimRecord {
        let mut record = Self::sample_record();
        record.policy.deductible = dec!(-50);
        record.line_items[0].quantity = dec!(-1);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_claim_totals() {
        let claim = ClaimFixtures::sample_claim();
        assert_eq!(claim.line_items().len(), 13);
        assert_eq!(claim.gross_total().amount(), dec!(5891.00));
        assert_eq!(claim.property().total_affected_sqft(), dec!(450));
    }

    #[test]
    fn test_sample_record_converts() {
        let claim = ClaimData::try_from(ClaimFixtures::sample_record()).unwrap();
        assert_eq!(claim.claim_id().as_str(), "CLM-2024-REC-001");
        assert_eq!(claim.property().water_category(), Some(WaterCategory::Clean));
    }

    #[test]
    fn test_invalid_record_is_rejected() {
        assert!(ClaimData::try_from(ClaimFixtures::invalid_record()).is_err());
    }
}
