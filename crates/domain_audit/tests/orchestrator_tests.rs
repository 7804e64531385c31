//! Tests for audit orchestration and scorecard aggregation

use std::collections::BTreeSet;

use proptest::prelude::*;
use rust_decimal_macros::dec;

use core_kernel::{ClaimId, RuleId};
use domain_audit::{
    AuditCategory, AuditDomain, AuditError, AuditFinding, AuditPolicy, AuditSeverity, ClaimAuditor,
    ScorecardAggregator,
};
use domain_claims::line_item::{MAX_AMOUNT, MAX_QUANTITY};
use domain_claims::WaterCategory;
use test_utils::{
    assert_score_consistent, claim_strategy, finding_strategy, findings_for, item, room,
    ClaimDataBuilder, ClaimFixtures,
};

fn critical() -> AuditFinding {
    AuditFinding::new(
        RuleId::parse("WTR-006").unwrap(),
        "Equipment-to-Area Ratio",
        AuditDomain::WaterRemediation,
        AuditCategory::Leakage,
        AuditSeverity::Critical,
        "Excessive Air Mover Count",
        "too many",
        Some(dec!(100)),
    )
}

// ============================================================================
// Orchestrator Tests
// ============================================================================

mod orchestrator_tests {
    use super::*;

    #[test]
    fn test_sample_claim_scorecard() {
        let scorecard = ClaimAuditor::standard().unwrap().audit_all(&ClaimFixtures::sample_claim());

        assert_eq!(scorecard.findings().len(), 10);
        assert_eq!(scorecard.risk_score(), 170);
        assert_eq!(scorecard.severity_count(AuditSeverity::Critical), 1);
        assert_eq!(scorecard.severity_count(AuditSeverity::Error), 1);
        assert_eq!(scorecard.severity_count(AuditSeverity::Warning), 5);
        assert_eq!(scorecard.severity_count(AuditSeverity::Info), 3);
        assert_eq!(scorecard.category_score(AuditCategory::Financial), 0);
        assert!(scorecard.has_critical());
        assert_eq!(scorecard.domains_executed(), &AuditDomain::ALL);
        assert_score_consistent(&scorecard);
    }

    #[test]
    fn test_findings_follow_phase_order() {
        let scorecard = ClaimAuditor::standard().unwrap().audit_all(&ClaimFixtures::sample_claim());
        let phases: Vec<usize> = scorecard
            .findings()
            .iter()
            .map(|f| AuditDomain::ALL.iter().position(|d| *d == f.domain()).unwrap())
            .collect();
        let mut sorted = phases.clone();
        sorted.sort_unstable();
        assert_eq!(phases, sorted);
    }

    #[test]
    fn test_audit_is_deterministic() {
        let auditor = ClaimAuditor::standard().unwrap();
        let claim = ClaimFixtures::sample_claim();
        let first = serde_json::to_value(auditor.audit_all(&claim)).unwrap();
        let second = serde_json::to_value(auditor.audit_all(&claim)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let claim = ClaimFixtures::sample_claim();
        let sequential = ClaimAuditor::standard().unwrap().with_parallel(false).audit_all(&claim);
        let parallel = ClaimAuditor::standard().unwrap().with_parallel(true).audit_all(&claim);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_disabled_domain_is_isolated() {
        let auditor = ClaimAuditor::standard().unwrap();
        let claim = ClaimFixtures::sample_claim();
        let all = auditor.audit_all(&claim);

        let without_flooring: BTreeSet<AuditDomain> = AuditDomain::ALL
            .into_iter()
            .filter(|d| *d != AuditDomain::Flooring)
            .collect();
        let partial = auditor.audit(&claim, &without_flooring);

        assert_eq!(partial.findings_for_domain(AuditDomain::Flooring).count(), 0);
        assert!(!partial.domains_executed().contains(&AuditDomain::Flooring));
        let others: Vec<&AuditFinding> = all
            .findings()
            .iter()
            .filter(|f| f.domain() != AuditDomain::Flooring)
            .collect();
        let kept: Vec<&AuditFinding> = partial.findings().iter().collect();
        assert_eq!(others, kept);
    }

    #[test]
    fn test_empty_domain_set_runs_nothing() {
        let scorecard = ClaimAuditor::standard()
            .unwrap()
            .audit(&ClaimFixtures::sample_claim(), &BTreeSet::new());
        assert!(scorecard.findings().is_empty());
        assert_eq!(scorecard.risk_score(), 0);
        assert!(scorecard.domains_executed().is_empty());
    }

    #[test]
    fn test_audit_record_accepts_valid_input() {
        let auditor = ClaimAuditor::standard().unwrap();
        let enabled: BTreeSet<AuditDomain> = AuditDomain::ALL.into_iter().collect();
        let scorecard = auditor.audit_record(ClaimFixtures::sample_record(), &enabled).unwrap();

        assert_eq!(scorecard.claim_id().as_str(), "CLM-2024-REC-001");
        assert_eq!(findings_for(scorecard.findings(), "WTR-006").len(), 1);
        assert_eq!(findings_for(scorecard.findings(), "FLR-002").len(), 1);
    }

    #[test]
    fn test_audit_record_rejects_invalid_input() {
        let auditor = ClaimAuditor::standard().unwrap();
        let enabled: BTreeSet<AuditDomain> = AuditDomain::ALL.into_iter().collect();
        let result = auditor.audit_record(ClaimFixtures::invalid_record(), &enabled);
        assert!(matches!(result, Err(AuditError::InputShape(_))));
    }

    #[test]
    fn test_largest_supported_amounts_audit_without_overflow() {
        let (q, p) = (MAX_QUANTITY, MAX_AMOUNT);
        let claim = ClaimDataBuilder::new()
            .with_room(room("Living Room", dec!(100)))
            .with_water_category(WaterCategory::Clean)
            .with_items([
                item("WTR_AIRF", "Air Mover - per unit/day", q, p).with_days(3),
                item("WTR_DEHUM", "Dehumidifier - Large", q, p).with_days(3),
                item("WTR_MONITOR", "Daily Monitoring - Technician", q, p).with_unit("DAY"),
                item("FCC_CPTINST", "Install carpet", q, p).with_unit("SF"),
                item("FCC_CPTWST", "Carpet waste", q, p).with_unit("SF"),
                item("GEN_TRIP", "Service call", q, p),
                item("GEN_TRIP", "Service call", q, p),
                item("GEN_TRIP", "Service call", q, p),
            ])
            .build();

        let scorecard = ClaimAuditor::standard().unwrap().audit_all(&claim);

        let summary = scorecard.claim_summary().unwrap();
        assert_eq!(summary.line_items, 8);
        assert_eq!(summary.gross.amount(), q * p * dec!(8));
        assert!(scorecard.findings_for_domain(AuditDomain::WaterRemediation).count() > 0);
        assert!(scorecard
            .findings()
            .iter()
            .all(|f| !f.title().starts_with("Rule Execution Error")));
        assert_score_consistent(&scorecard);
    }

    #[test]
    fn test_rule_descriptors_cover_all_domains() {
        let descriptors = ClaimAuditor::standard().unwrap().rule_descriptors();
        assert_eq!(descriptors.len(), 21);
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let mut policy = AuditPolicy::default();
        policy.equipment.critical_multiplier = dec!(0.5);
        assert!(ClaimAuditor::new(&policy).is_err());
    }

    #[test]
    fn test_score_cap_from_policy() {
        let mut policy = AuditPolicy::default();
        policy.scoring.max_score = Some(100);
        let scorecard = ClaimAuditor::new(&policy).unwrap().audit_all(&ClaimFixtures::sample_claim());
        assert_eq!(scorecard.risk_score(), 100);
        assert_eq!(scorecard.raw_score(), 170);
    }

    #[test]
    fn test_redaction_keeps_scores() {
        let scorecard = ClaimAuditor::standard().unwrap().audit_all(&ClaimFixtures::sample_claim());
        let redacted = scorecard.redact_with(|text| text.replace("Living Room", "[ROOM]"));

        assert!(redacted.is_redacted());
        assert_eq!(redacted.risk_score(), scorecard.risk_score());
        assert!(redacted.findings().iter().all(|f| !f.message().contains("Living Room")));
    }
}

// ============================================================================
// Scorecard Property Tests
// ============================================================================

mod scorecard_property_tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_score_is_sum_of_weights(findings in prop::collection::vec(finding_strategy(), 0..40)) {
            let expected: u32 = findings.iter().map(|f| f.severity().weight()).sum();
            let card = ScorecardAggregator::new().build(ClaimId::parse("CLM-P").unwrap(), findings);
            prop_assert_eq!(card.risk_score(), expected);
            let by_category: u32 = card.category_scores().values().sum();
            prop_assert_eq!(by_category, expected);
        }

        #[test]
        fn prop_extra_critical_adds_fifty(findings in prop::collection::vec(finding_strategy(), 0..40)) {
            let aggregator = ScorecardAggregator::new();
            let base = aggregator.build(ClaimId::parse("CLM-P").unwrap(), findings.clone());
            let mut more = findings;
            more.push(critical());
            let raised = aggregator.build(ClaimId::parse("CLM-P").unwrap(), more);
            prop_assert_eq!(raised.risk_score(), base.risk_score() + 50);
            prop_assert_eq!(
                raised.severity_count(AuditSeverity::Critical),
                base.severity_count(AuditSeverity::Critical) + 1
            );
        }

        #[test]
        fn prop_leakage_total_ignores_non_positive_deltas(findings in prop::collection::vec(finding_strategy(), 0..40)) {
            let card = ScorecardAggregator::new().build(ClaimId::parse("CLM-P").unwrap(), findings.clone());
            let expected: rust_decimal::Decimal = findings
                .iter()
                .filter(|f| f.category() == AuditCategory::Leakage)
                .filter_map(|f| f.delta())
                .filter(|d| *d > rust_decimal::Decimal::ZERO)
                .sum();
            prop_assert_eq!(card.total_potential_leakage(), expected.round_dp(2));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_generated_claims_audit_without_failures(claim in claim_strategy()) {
            let auditor = ClaimAuditor::standard().unwrap();
            let card = auditor.audit_all(&claim);
            prop_assert!(card.findings().iter().all(|f| !f.title().starts_with("Rule Execution Error")));
            let again = auditor.with_parallel(true).audit_all(&claim);
            prop_assert_eq!(card, again);
        }
    }
}
