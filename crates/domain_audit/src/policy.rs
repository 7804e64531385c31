//! Audit policy
//!
//! Every threshold used by the built-in rules lives here rather than in
//! the rule bodies. The policy deserializes with defaults, so a policy file
//! only needs the values it overrides.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use domain_claims::WaterCategory;
use crate::classifier::{EquipmentKind, FlooringMaterial};
use crate::error::AuditError;

/// Thresholds for the built-in rule sets
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditPolicy {
    pub equipment: EquipmentPolicy,
    pub water: WaterPolicy,
    pub flooring: FlooringPolicy,
    pub general_repair: GeneralRepairPolicy,
    pub financial: FinancialPolicy,
    pub overlap: OverlapPolicy,
    pub scoring: ScoringPolicy,
    /// Rule ids skipped at validator construction
    pub disabled_rules: BTreeSet<String>,
    /// Run domain validators concurrently
    pub parallel: bool,
}

impl AuditPolicy {
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        !self
            .disabled_rules
            .iter()
            .any(|id| id.trim().eq_ignore_ascii_case(rule_id))
    }

    /// Checks that thresholds are usable
    pub fn validate(&self) -> Result<(), AuditError> {
        for (level, ratio) in [
            (1, &self.equipment.category_1),
            (2, &self.equipment.category_2),
            (3, &self.equipment.category_3),
        ] {
            for kind in EquipmentKind::ALL {
                if let Some(sqft) = ratio.sqft_per_unit(kind) {
                    if sqft <= Decimal::ZERO {
                        return Err(AuditError::configuration(format!(
                            "equipment.category_{level}: {} coverage must be positive",
                            kind.label()
                        )));
                    }
                }
            }
        }
        if self.equipment.critical_multiplier < Decimal::ONE {
            return Err(AuditError::configuration(
                "equipment.critical_multiplier must be at least 1",
            ));
        }
        if self.equipment.shortfall_ratio <= Decimal::ZERO
            || self.equipment.shortfall_ratio > Decimal::ONE
        {
            return Err(AuditError::configuration(
                "equipment.shortfall_ratio must be in (0, 1]",
            ));
        }
        if self.flooring.waste_allowance_pct.values().any(|p| p.is_sign_negative()) {
            return Err(AuditError::configuration(
                "flooring.waste_allowance_pct values must not be negative",
            ));
        }
        if self.financial.tolerance.is_sign_negative() {
            return Err(AuditError::configuration("financial.tolerance must not be negative"));
        }
        if self.general_repair.max_service_calls == 0 {
            return Err(AuditError::configuration(
                "general_repair.max_service_calls must be at least 1",
            ));
        }
        if self.scoring.max_score == Some(0) {
            return Err(AuditError::configuration("scoring.max_score must be positive"));
        }
        Ok(())
    }
}

/// Square feet served by one unit of each equipment kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRatio {
    pub air_mover_sqft: Decimal,
    pub dehumidifier_sqft: Decimal,
    /// `None` when scrubbers are not required for the category
    #[serde(default)]
    pub air_scrubber_sqft: Option<Decimal>,
}

impl EquipmentRatio {
    pub fn sqft_per_unit(&self, kind: EquipmentKind) -> Option<Decimal> {
        match kind {
            EquipmentKind::AirMover => Some(self.air_mover_sqft),
            EquipmentKind::Dehumidifier => Some(self.dehumidifier_sqft),
            EquipmentKind::AirScrubber => self.air_scrubber_sqft,
        }
    }
}

/// Equipment-to-area ratios and overage thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentPolicy {
    pub category_1: EquipmentRatio,
    pub category_2: EquipmentRatio,
    pub category_3: EquipmentRatio,
    /// Billed above `required x multiplier` is critical
    pub critical_multiplier: Decimal,
    /// Billed below `required x ratio` is a likely supplement
    pub shortfall_ratio: Decimal,
}

impl Default for EquipmentPolicy {
    fn default() -> Self {
        Self {
            category_1: EquipmentRatio {
                air_mover_sqft: dec!(150),
                dehumidifier_sqft: dec!(1000),
                air_scrubber_sqft: None,
            },
            category_2: EquipmentRatio {
                air_mover_sqft: dec!(125),
                dehumidifier_sqft: dec!(1000),
                air_scrubber_sqft: Some(dec!(1000)),
            },
            category_3: EquipmentRatio {
                air_mover_sqft: dec!(100),
                dehumidifier_sqft: dec!(750),
                air_scrubber_sqft: Some(dec!(500)),
            },
            critical_multiplier: dec!(1.5),
            shortfall_ratio: dec!(0.5),
        }
    }
}

impl EquipmentPolicy {
    /// Ratios for a water category; undocumented uses category 3
    pub fn ratios_for(&self, category: Option<WaterCategory>) -> &EquipmentRatio {
        match category {
            Some(WaterCategory::Clean) => &self.category_1,
            Some(WaterCategory::Gray) => &self.category_2,
            Some(WaterCategory::Black) | None => &self.category_3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterPolicy {
    /// Monitoring days allowed beyond the longest equipment rental
    pub monitoring_day_tolerance: u32,
    /// Spread in rental days tolerated between equipment in one room
    pub equipment_day_tolerance: u32,
}

impl Default for WaterPolicy {
    fn default() -> Self {
        Self {
            monitoring_day_tolerance: 2,
            equipment_day_tolerance: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlooringPolicy {
    /// Maximum waste as a percentage of installed quantity, by material
    pub waste_allowance_pct: BTreeMap<FlooringMaterial, Decimal>,
    /// Materials whose install normally needs floor preparation
    pub prep_materials: BTreeSet<FlooringMaterial>,
}

impl Default for FlooringPolicy {
    fn default() -> Self {
        Self {
            waste_allowance_pct: BTreeMap::from([
                (FlooringMaterial::Carpet, dec!(10)),
                (FlooringMaterial::Hardwood, dec!(15)),
                (FlooringMaterial::Tile, dec!(15)),
                (FlooringMaterial::Vinyl, dec!(10)),
                (FlooringMaterial::Laminate, dec!(10)),
            ]),
            prep_materials: BTreeSet::from([FlooringMaterial::Hardwood, FlooringMaterial::Tile]),
        }
    }
}

impl FlooringPolicy {
    pub fn waste_allowance(&self, material: FlooringMaterial) -> Option<Decimal> {
        self.waste_allowance_pct.get(&material).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralRepairPolicy {
    /// Service or trip charges expected on a coordinated job
    pub max_service_calls: u32,
    /// Share of total service charges estimated as coordination savings
    pub coordination_savings_pct: Decimal,
}

impl Default for GeneralRepairPolicy {
    fn default() -> Self {
        Self {
            max_service_calls: 2,
            coordination_savings_pct: dec!(25),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialPolicy {
    /// Absolute difference ignored when reconciling reported totals
    pub tolerance: Decimal,
}

impl Default for FinancialPolicy {
    fn default() -> Self {
        Self { tolerance: dec!(0.01) }
    }
}

/// Room matching for double-dip pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapPolicy {
    /// An item with no resolvable room pairs with its counterpart in any room
    pub unscoped_matches_any_room: bool,
}

impl Default for OverlapPolicy {
    fn default() -> Self {
        Self {
            unscoped_matches_any_room: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Clamp for the aggregate score; raw score is kept alongside
    pub max_score: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        assert!(AuditPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_undocumented_category_uses_category_three() {
        let policy = EquipmentPolicy::default();
        assert_eq!(policy.ratios_for(None), &policy.category_3);
        assert_eq!(
            policy.ratios_for(Some(WaterCategory::Clean)).air_mover_sqft,
            dec!(150)
        );
    }

    #[test]
    fn test_partial_policy_deserializes_with_defaults() {
        let policy: AuditPolicy = serde_json::from_str(
            r#"{"equipment": {"critical_multiplier": "2.0"}, "disabled_rules": ["wtr-005"]}"#,
        )
        .unwrap();
        assert_eq!(policy.equipment.critical_multiplier, dec!(2.0));
        assert_eq!(policy.equipment.category_1.air_mover_sqft, dec!(150));
        assert!(!policy.is_rule_enabled("WTR-005"));
        assert!(policy.is_rule_enabled("WTR-006"));
    }

    #[test]
    fn test_rejects_multiplier_below_one() {
        let mut policy = AuditPolicy::default();
        policy.equipment.critical_multiplier = dec!(0.5);
        assert!(matches!(policy.validate(), Err(AuditError::Configuration(_))));
    }
}
