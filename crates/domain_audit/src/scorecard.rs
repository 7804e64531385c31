//! Scorecard aggregation
//!
//! The risk score is the plain sum of severity weights over all findings,
//! so adding one CRITICAL finding always raises it by exactly 50. An
//! optional cap clamps the reported score; the raw score is kept.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use core_kernel::{ClaimId, Money};
use domain_claims::{ClaimData, WaterCategory};
use crate::finding::AuditFinding;
use crate::policy::AuditPolicy;
use crate::taxonomy::{AuditCategory, AuditDomain, AuditSeverity};

/// Claim totals echoed on the scorecard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimSummary {
    pub line_items: usize,
    pub unknown_items: usize,
    pub gross: Money,
    pub deductible: Money,
    pub expected_net: Money,
    pub water_category: Option<WaterCategory>,
}

impl ClaimSummary {
    pub fn from_claim(claim: &ClaimData, unknown_items: usize) -> Self {
        Self {
            line_items: claim.line_items().len(),
            unknown_items,
            gross: claim.gross_total().round_to_currency(),
            deductible: claim.policy().deductible(),
            expected_net: claim.expected_net().round_to_currency(),
            water_category: claim.property().water_category(),
        }
    }
}

/// Aggregate audit result for one claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditScorecard {
    claim_id: ClaimId,
    risk_score: u32,
    raw_score: u32,
    category_scores: BTreeMap<AuditCategory, u32>,
    severity_counts: BTreeMap<AuditSeverity, usize>,
    category_counts: BTreeMap<AuditCategory, usize>,
    total_potential_leakage: Decimal,
    total_supplement_risk: Decimal,
    domains_executed: Vec<AuditDomain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    claim_summary: Option<ClaimSummary>,
    redacted: bool,
    findings: Vec<AuditFinding>,
}

impl AuditScorecard {
    pub fn claim_id(&self) -> &ClaimId {
        &self.claim_id
    }

    /// Score after the optional cap
    pub fn risk_score(&self) -> u32 {
        self.risk_score
    }

    /// Uncapped sum of severity weights
    pub fn raw_score(&self) -> u32 {
        self.raw_score
    }

    pub fn category_scores(&self) -> &BTreeMap<AuditCategory, u32> {
        &self.category_scores
    }

    pub fn category_score(&self, category: AuditCategory) -> u32 {
        self.category_scores.get(&category).copied().unwrap_or(0)
    }

    pub fn severity_counts(&self) -> &BTreeMap<AuditSeverity, usize> {
        &self.severity_counts
    }

    pub fn severity_count(&self, severity: AuditSeverity) -> usize {
        self.severity_counts.get(&severity).copied().unwrap_or(0)
    }

    pub fn category_counts(&self) -> &BTreeMap<AuditCategory, usize> {
        &self.category_counts
    }

    pub fn total_potential_leakage(&self) -> Decimal {
        self.total_potential_leakage
    }

    pub fn total_supplement_risk(&self) -> Decimal {
        self.total_supplement_risk
    }

    pub fn domains_executed(&self) -> &[AuditDomain] {
        &self.domains_executed
    }

    pub fn claim_summary(&self) -> Option<&ClaimSummary> {
        self.claim_summary.as_ref()
    }

    pub fn is_redacted(&self) -> bool {
        self.redacted
    }

    pub fn findings(&self) -> &[AuditFinding] {
        &self.findings
    }

    pub fn findings_for_domain(&self, domain: AuditDomain) -> impl Iterator<Item = &AuditFinding> {
        self.findings.iter().filter(move |f| f.domain() == domain)
    }

    pub fn findings_in_category(&self, category: AuditCategory) -> impl Iterator<Item = &AuditFinding> {
        self.findings.iter().filter(move |f| f.category() == category)
    }

    pub fn has_critical(&self) -> bool {
        self.severity_count(AuditSeverity::Critical) > 0
    }

    /// New scorecard with every finding's free text passed through `f`
    ///
    /// Scores and counts are unchanged.
    pub fn redact_with<F>(&self, f: F) -> Self
    where
        F: Fn(&str) -> String,
    {
        Self {
            findings: self.findings.iter().map(|finding| finding.map_text(&f)).collect(),
            redacted: true,
            ..self.clone()
        }
    }
}

/// Folds findings into a scorecard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScorecardAggregator {
    max_score: Option<u32>,
}

impl ScorecardAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamps the aggregate score at `max_score`
    pub fn with_cap(max_score: u32) -> Self {
        Self {
            max_score: Some(max_score),
        }
    }

    pub fn from_policy(policy: &AuditPolicy) -> Self {
        Self {
            max_score: policy.scoring.max_score,
        }
    }

    pub fn max_score(&self) -> Option<u32> {
        self.max_score
    }

    /// Builds a scorecard from findings alone
    pub fn build(&self, claim_id: ClaimId, findings: Vec<AuditFinding>) -> AuditScorecard {
        let mut category_scores: BTreeMap<AuditCategory, u32> =
            AuditCategory::ALL.iter().map(|c| (*c, 0)).collect();
        let mut category_counts: BTreeMap<AuditCategory, usize> =
            AuditCategory::ALL.iter().map(|c| (*c, 0)).collect();
        let mut severity_counts: BTreeMap<AuditSeverity, usize> =
            AuditSeverity::ALL.iter().map(|s| (*s, 0)).collect();
        let mut raw_score = 0u32;
        let mut leakage = Decimal::ZERO;
        let mut supplement = Decimal::ZERO;

        for finding in &findings {
            let weight = finding.severity().weight();
            raw_score = raw_score.saturating_add(weight);
            *category_scores.entry(finding.category()).or_default() += weight;
            *category_counts.entry(finding.category()).or_default() += 1;
            *severity_counts.entry(finding.severity()).or_default() += 1;

            let exposure = finding.delta().filter(|d| d.is_sign_positive() && !d.is_zero());
            match (finding.category(), exposure) {
                (AuditCategory::Leakage, Some(d)) => leakage += d,
                (AuditCategory::SupplementRisk, Some(d)) => supplement += d,
                _ => {}
            }
        }

        let risk_score = match self.max_score {
            Some(cap) => raw_score.min(cap),
            None => raw_score,
        };

        AuditScorecard {
            claim_id,
            risk_score,
            raw_score,
            category_scores,
            severity_counts,
            category_counts,
            total_potential_leakage: leakage.round_dp(2),
            total_supplement_risk: supplement.round_dp(2),
            domains_executed: Vec::new(),
            claim_summary: None,
            redacted: false,
            findings,
        }
    }

    /// Builds a scorecard carrying the claim summary and executed domains
    pub fn build_for_claim(
        &self,
        claim: &ClaimData,
        domains: Vec<AuditDomain>,
        findings: Vec<AuditFinding>,
        unknown_items: usize,
    ) -> AuditScorecard {
        AuditScorecard {
            domains_executed: domains,
            claim_summary: Some(ClaimSummary::from_claim(claim, unknown_items)),
            ..self.build(claim.claim_id().clone(), findings)
        }
    }
}
