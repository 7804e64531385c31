//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for money and audit findings
//! that give more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_audit::{AuditFinding, AuditScorecard, AuditSeverity};
use rust_decimal::Decimal;

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Findings raised by one rule, in emission order
pub fn findings_for<'a>(findings: &'a [AuditFinding], rule_id: &str) -> Vec<&'a AuditFinding> {
    findings
        .iter()
        .filter(|f| f.rule_id().as_str().eq_ignore_ascii_case(rule_id))
        .collect()
}

/// Asserts that a rule raised exactly one finding and returns it
pub fn assert_single_finding<'a>(findings: &'a [AuditFinding], rule_id: &str) -> &'a AuditFinding {
    let matched = findings_for(findings, rule_id);
    assert_eq!(
        matched.len(),
        1,
        "Expected exactly one {rule_id} finding, got {}: {:?}",
        matched.len(),
        matched.iter().map(|f| f.title()).collect::<Vec<_>>()
    );
    matched[0]
}

/// Asserts that a rule raised nothing
pub fn assert_no_finding(findings: &[AuditFinding], rule_id: &str) {
    let matched = findings_for(findings, rule_id);
    assert!(
        matched.is_empty(),
        "Expected no {rule_id} finding, got: {:?}",
        matched.iter().map(|f| f.title()).collect::<Vec<_>>()
    );
}

/// Asserts that a finding carries the given severity
pub fn assert_severity(finding: &AuditFinding, expected: AuditSeverity) {
    assert_eq!(
        finding.severity(),
        expected,
        "Finding {} '{}' has severity {}, expected {}",
        finding.rule_id(),
        finding.title(),
        finding.severity().label(),
        expected.label()
    );
}

/// Asserts the scorecard score equals the sum of its finding weights
pub fn assert_score_consistent(scorecard: &AuditScorecard) {
    let expected: u32 = scorecard.findings().iter().map(|f| f.severity().weight()).sum();
    assert_eq!(
        scorecard.raw_score(),
        expected,
        "Raw score {} does not match summed severity weights {}",
        scorecard.raw_score(),
        expected
    );
}
