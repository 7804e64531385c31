//! Tests for classification, the rule registry and overlap detection

use std::collections::BTreeSet;
use std::sync::Arc;

use rust_decimal_macros::dec;

use domain_audit::{
    resolve_scopes, AuditCategory, AuditDomain, AuditError, AuditRule, AuditSeverity, ClaimAuditor,
    CodeClassifier, DoubleDipPair, EquipmentKind, FindingDraft, FlooringMaterial, FlooringOperation,
    ItemScope, AuditPolicy, OverlapPolicy, PairScope, PairSide, PairSideKind, RuleContext, RuleError, RuleRegistry,
    TradeCategory,
};
use test_utils::{item, room, ClaimDataBuilder, ClaimFixtures, assert_single_finding, assert_no_finding};

// ============================================================================
// Classifier Tests
// ============================================================================

mod classifier_tests {
    use super::*;

    fn classifier() -> Arc<CodeClassifier> {
        CodeClassifier::shared().unwrap()
    }

    #[test]
    fn test_shared_classifier_is_reused() {
        let a = classifier();
        let b = classifier();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_air_mover_classification() {
        let class = classifier().classify("WTR_AIRF", "Air Mover - per unit/day");
        assert!(class.has_category(TradeCategory::Water));
        assert_eq!(class.equipment, Some(EquipmentKind::AirMover));
    }

    #[test]
    fn test_dehumidifier_classification() {
        let class = classifier().classify("WTR_DEHUM", "Dehumidifier - Large");
        assert_eq!(class.equipment, Some(EquipmentKind::Dehumidifier));
    }

    #[test]
    fn test_description_fallback_without_known_prefix() {
        let class = classifier().classify("", "Install hardwood flooring");
        assert!(class.has_category(TradeCategory::FlooringNatural));
        assert!(class.has_operation(FlooringOperation::Install));
        assert!(class.has_material(FlooringMaterial::Hardwood));
    }

    #[test]
    fn test_flooring_operations_and_materials() {
        let tear_out = classifier().classify("FCC_PADREM", "Tear out Pad");
        assert!(tear_out.has_operation(FlooringOperation::TearOut));
        assert!(tear_out.has_material(FlooringMaterial::Pad));
        assert!(!tear_out.has_material(FlooringMaterial::Carpet));

        let waste = classifier().classify("FCC_WASTE", "Carpet Waste/Cutoff");
        assert!(waste.has_operation(FlooringOperation::Waste));
        assert!(waste.has_material(FlooringMaterial::Carpet));
    }

    #[test]
    fn test_unknown_code_is_unknown() {
        let class = classifier().classify("ZZZ_UNKNOWN", "Miscellaneous charge");
        assert!(class.is_unknown());
        assert_eq!(class.equipment, None);
        assert!(class.operations.is_empty());
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        let upper = classifier().classify("WTR_DEHUM", "DEHUMIDIFIER - LARGE");
        let lower = classifier().classify("wtr_dehum", "dehumidifier - large");
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_pairs_partitioned_by_domain() {
        let c = classifier();
        assert_eq!(c.pairs_for(AuditDomain::Flooring).count(), 1);
        assert_eq!(c.pairs_for(AuditDomain::GeneralRepair).count(), 5);
        assert_eq!(c.pairs_for(AuditDomain::Financial).count(), 0);
    }
}

// ============================================================================
// Registry Tests
// ============================================================================

mod registry_tests {
    use super::*;

    fn quiet_rule(id: &str) -> AuditRule {
        AuditRule::new(id, "Quiet", AuditCategory::Leakage, AuditSeverity::Warning, |_: &RuleContext<'_>| {
            Ok(Vec::new())
        })
        .unwrap()
    }

    fn flagging_rule(id: &str) -> AuditRule {
        AuditRule::new(id, "Always Flags", AuditCategory::Leakage, AuditSeverity::Warning, |_: &RuleContext<'_>| {
            Ok(vec![FindingDraft::new("Flagged", "always")])
        })
        .unwrap()
    }

    #[test]
    fn test_duplicate_rule_id_rejected() {
        let mut registry = RuleRegistry::new(AuditDomain::WaterRemediation);
        registry.register(quiet_rule("WTR-006")).unwrap();

        let result = registry.register(quiet_rule("WTR-006"));
        assert!(matches!(result, Err(AuditError::DuplicateRule { .. })));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_rule_id_ignores_case() {
        let mut registry = RuleRegistry::new(AuditDomain::WaterRemediation);
        registry.register(quiet_rule("WTR-006")).unwrap();

        let result = registry.register(quiet_rule("wtr-006"));
        assert!(matches!(result, Err(AuditError::DuplicateRule { .. })));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("wtr-006"));
    }

    #[test]
    fn test_same_id_allowed_in_separate_registries() {
        let mut water = RuleRegistry::new(AuditDomain::WaterRemediation);
        let mut flooring = RuleRegistry::new(AuditDomain::Flooring);
        assert!(water.register(quiet_rule("WTR-006")).is_ok());
        assert!(flooring.register(quiet_rule("WTR-006")).is_ok());
    }

    #[test]
    fn test_lookup_by_rule_id() {
        let mut registry = RuleRegistry::new(AuditDomain::Flooring);
        registry.register(quiet_rule("FLR-101")).unwrap();
        assert!(registry.contains("FLR-101"));
        assert!(!registry.contains("FLR-102"));
    }

    #[test]
    fn test_registration_order_is_evaluation_order() {
        let mut registry = RuleRegistry::new(AuditDomain::GeneralRepair);
        registry.register(flagging_rule("GEN-102")).unwrap();
        registry.register(flagging_rule("GEN-101")).unwrap();

        let claim = ClaimFixtures::clean_claim();
        let findings = registry.evaluate(&claim, &CodeClassifier::shared().unwrap());
        let ids: Vec<&str> = findings.iter().map(|f| f.rule_id().as_str()).collect();
        assert_eq!(ids, vec!["GEN-102", "GEN-101"]);
    }

    #[test]
    fn test_failing_rules_are_contained() {
        let mut registry = RuleRegistry::new(AuditDomain::GeneralRepair);
        registry
            .register(
                AuditRule::new("GEN-901", "Errors", AuditCategory::Leakage, AuditSeverity::Info, |_: &RuleContext<'_>| {
                    Err(RuleError::evaluation("lookup failed"))
                })
                .unwrap(),
            )
            .unwrap();
        registry
            .register(
                AuditRule::new(
                    "GEN-902",
                    "Panics",
                    AuditCategory::Leakage,
                    AuditSeverity::Info,
                    |_: &RuleContext<'_>| -> Result<Vec<FindingDraft>, RuleError> { panic!("kaboom") },
                )
                .unwrap(),
            )
            .unwrap();
        registry.register(flagging_rule("GEN-903")).unwrap();

        let claim = ClaimFixtures::clean_claim();
        let findings = registry.evaluate(&claim, &CodeClassifier::shared().unwrap());

        assert_eq!(findings.len(), 3);
        for failed in &findings[..2] {
            assert_eq!(failed.severity(), AuditSeverity::Error);
            assert_eq!(failed.category(), AuditCategory::Financial);
            assert!(failed.title().starts_with("Rule Execution Error"));
        }
        assert!(findings[0].message().contains("lookup failed"));
        assert!(findings[1].message().contains("kaboom"));
        assert_eq!(findings[2].title(), "Flagged");
    }

    #[test]
    fn test_undeclared_outcome_becomes_failure() {
        let mut registry = RuleRegistry::new(AuditDomain::Flooring);
        registry
            .register(
                AuditRule::new("FLR-901", "Escalates", AuditCategory::Leakage, AuditSeverity::Info, |_: &RuleContext<'_>| {
                    Ok(vec![FindingDraft::new("Escalated", "x").severity(AuditSeverity::Critical)])
                })
                .unwrap(),
            )
            .unwrap();

        let findings = registry.evaluate(&ClaimFixtures::clean_claim(), &CodeClassifier::shared().unwrap());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity(), AuditSeverity::Error);
        assert!(findings[0].message().contains("undeclared"));
    }

    #[test]
    fn test_secondary_outcome_is_accepted() {
        let rule = AuditRule::new("FLR-902", "Escalates", AuditCategory::Leakage, AuditSeverity::Info, |_: &RuleContext<'_>| {
            Ok(vec![FindingDraft::new("Escalated", "x").severity(AuditSeverity::Critical)])
        })
        .unwrap()
        .also_emits(AuditCategory::Leakage, AuditSeverity::Critical);
        let mut registry = RuleRegistry::new(AuditDomain::Flooring);
        registry.register(rule).unwrap();

        let findings = registry.evaluate(&ClaimFixtures::clean_claim(), &CodeClassifier::shared().unwrap());
        assert_eq!(findings[0].severity(), AuditSeverity::Critical);
        assert_eq!(findings[0].title(), "Escalated");
    }

    #[test]
    fn test_auditor_rejects_duplicate_custom_rule() {
        let mut auditor = ClaimAuditor::standard().unwrap();
        let result = auditor.register_rule(AuditDomain::WaterRemediation, quiet_rule("WTR-006"));
        assert!(matches!(result, Err(AuditError::DuplicateRule { .. })));

        auditor
            .register_rule(AuditDomain::Flooring, quiet_rule("WTR-006"))
            .unwrap();
    }
}

// ============================================================================
// Overlap Tests
// ============================================================================

mod overlap_tests {
    use super::*;

    #[test]
    fn test_explicit_and_inferred_scopes() {
        let claim = ClaimDataBuilder::new()
            .with_room(room("Living Room", dec!(300)))
            .with_room(room("Kitchen", dec!(150)))
            .with_item(item("FCC_CPTINST", "Install Carpet", dec!(300), dec!(4.5)).with_room("living room"))
            .with_item(item("FNC_HWDINST", "Install Hardwood - Kitchen", dec!(150), dec!(8.5)))
            .with_item(item("GEN_DOOR", "Pre-hung Interior Door", dec!(1), dec!(285)))
            .build();

        let scopes = resolve_scopes(&claim);
        assert_eq!(scopes[0], ItemScope::Room("Living Room".into()));
        assert_eq!(scopes[1], ItemScope::Room("Kitchen".into()));
        assert_eq!(scopes[2], ItemScope::Unscoped);
    }

    #[test]
    fn test_single_room_claim_scopes_everything() {
        let claim = ClaimDataBuilder::new()
            .with_room(room("Basement", dec!(600)))
            .with_item(item("WTR_AIRF", "Air Mover", dec!(4), dec!(35)))
            .build();
        assert_eq!(resolve_scopes(&claim), vec![ItemScope::Room("Basement".into())]);
    }

    #[test]
    fn test_carpet_pad_same_room_flags_once() {
        let claim = ClaimFixtures::carpet_pad_same_room();
        let scorecard = ClaimAuditor::standard().unwrap().audit_all(&claim);

        let finding = assert_single_finding(scorecard.findings(), "FLR-002");
        assert_eq!(finding.category(), AuditCategory::Leakage);
        assert_eq!(finding.severity(), AuditSeverity::Warning);
        assert_eq!(finding.delta(), Some(dec!(360)));
        assert_eq!(finding.items().len(), 2);
        assert_eq!(finding.evidence().get("pair").map(String::as_str), Some("carpet_pad_tear_out"));
        assert_eq!(finding.evidence().get("scope").map(String::as_str), Some("Living Room"));
    }

    #[test]
    fn test_carpet_pad_different_rooms_not_flagged() {
        let claim = ClaimFixtures::carpet_pad_different_rooms();
        let scorecard = ClaimAuditor::standard().unwrap().audit_all(&claim);
        assert_no_finding(scorecard.findings(), "FLR-002");
    }

    #[test]
    fn test_room_names_ending_in_punctuation_resolve() {
        let claim = ClaimDataBuilder::new()
            .with_room(room("Bath (Upstairs)", dec!(60)))
            .with_room(room("Hall", dec!(80)))
            .with_item(item("FNC_TILEINST", "Install tile - Bath (Upstairs)", dec!(60), dec!(9)))
            .with_item(item("FNC_TILEINST", "Install tile - Bath (Upstairs), shower wall", dec!(40), dec!(9)))
            .build();

        let scopes = resolve_scopes(&claim);
        assert_eq!(scopes[0], ItemScope::Room("Bath (Upstairs)".into()));
        assert_eq!(scopes[1], ItemScope::Room("Bath (Upstairs)".into()));
    }

    #[test]
    fn test_room_name_inside_a_word_does_not_match() {
        let claim = ClaimDataBuilder::new()
            .with_room(room("Den", dec!(100)))
            .with_room(room("Hall", dec!(80)))
            .with_item(item("GEN_MISC", "Hidden damage repair", dec!(1), dec!(50)))
            .build();
        assert_eq!(resolve_scopes(&claim), vec![ItemScope::Unscoped]);
    }

    fn unscoped_carpet_with_scoped_pad() -> domain_claims::ClaimData {
        ClaimDataBuilder::new()
            .with_room(room("Living Room", dec!(300)))
            .with_room(room("Kitchen", dec!(150)))
            .with_item(item("FCC_CPTREM", "Carpet removal", dec!(300), dec!(0.85)))
            .with_item(item("FCC_PADREM", "Pad removal", dec!(300), dec!(0.35)).with_room("Living Room"))
            .build()
    }

    #[test]
    fn test_unscoped_side_pairs_with_room_scoped_counterpart() {
        let claim = unscoped_carpet_with_scoped_pad();
        let scorecard = ClaimAuditor::standard().unwrap().audit_all(&claim);

        let finding = assert_single_finding(scorecard.findings(), "FLR-002");
        assert_eq!(finding.items().len(), 2);
        assert_eq!(finding.delta(), Some(dec!(360)));
        assert_eq!(finding.evidence().get("scope").map(String::as_str), Some("Living Room"));
    }

    #[test]
    fn test_strict_room_scoping_keeps_unscoped_apart() {
        let policy = AuditPolicy {
            overlap: OverlapPolicy {
                unscoped_matches_any_room: false,
            },
            ..AuditPolicy::default()
        };
        let scorecard = ClaimAuditor::new(&policy)
            .unwrap()
            .audit_all(&unscoped_carpet_with_scoped_pad());
        assert_no_finding(scorecard.findings(), "FLR-002");
    }

    #[test]
    fn test_unscoped_pair_without_room_counterpart_still_matches() {
        let claim = ClaimDataBuilder::new()
            .with_room(room("Living Room", dec!(300)))
            .with_room(room("Kitchen", dec!(150)))
            .with_item(item("FCC_CPTREM", "Carpet removal", dec!(300), dec!(0.85)))
            .with_item(item("FCC_PADREM", "Pad removal", dec!(300), dec!(0.35)))
            .build();
        let scorecard = ClaimAuditor::standard().unwrap().audit_all(&claim);

        let finding = assert_single_finding(scorecard.findings(), "FLR-002");
        assert_eq!(finding.evidence().get("scope").map(String::as_str), Some("unscoped"));
    }

    #[test]
    fn test_custom_pair_extends_catalog() {
        let pair = DoubleDipPair {
            id: "sealer_twice".into(),
            label: "Sealer billed twice".into(),
            domain: AuditDomain::GeneralRepair,
            scope: PairScope::Claim,
            first: PairSide::new(&[r"STAIN\s*&\s*SEAL"], &[]).unwrap(),
            second: PairSide::new(&[r"\bSEALER\b"], &[r"STAIN"]).unwrap(),
            redundant: PairSideKind::Second,
            recommendation: "Remove the separate sealer".into(),
        };
        let classifier = Arc::new(CodeClassifier::standard().unwrap().with_pair(pair));
        let auditor = ClaimAuditor::with_classifier(classifier, &AuditPolicy::default()).unwrap();

        let claim = ClaimDataBuilder::new()
            .with_item(item("PNT_DECK", "Deck stain & seal", dec!(200), dec!(2)))
            .with_item(item("PNT_SEAL", "Sealer coat", dec!(200), dec!(0.5)))
            .build();
        let domains = BTreeSet::from([AuditDomain::GeneralRepair]);
        let scorecard = auditor.audit(&claim, &domains);

        let finding = assert_single_finding(scorecard.findings(), "GEN-001");
        assert_eq!(finding.evidence().get("pair").map(String::as_str), Some("sealer_twice"));
    }
}
