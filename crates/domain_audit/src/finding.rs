//! Audit findings
//!
//! Rule predicates return [`FindingDraft`]s. The engine stamps each draft
//! with the emitting rule's identity and domain to produce an immutable
//! [`AuditFinding`].

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use core_kernel::RuleId;
use domain_claims::LineItem;
use crate::taxonomy::{AuditCategory, AuditDomain, AuditSeverity};

/// Reference to a line item involved in a finding
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ItemRef {
    /// Zero-based position in the claim's line items
    pub index: usize,
    pub code: String,
}

/// A single problem detected by a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditFinding {
    rule_id: RuleId,
    rule_name: String,
    domain: AuditDomain,
    category: AuditCategory,
    severity: AuditSeverity,
    title: String,
    message: String,
    /// Signed monetary exposure; positive means overbilled or missing value
    #[serde(skip_serializing_if = "Option::is_none")]
    delta: Option<Decimal>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    items: Vec<ItemRef>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    evidence: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommendation: Option<String>,
}

impl AuditFinding {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rule_id: RuleId,
        rule_name: impl Into<String>,
        domain: AuditDomain,
        category: AuditCategory,
        severity: AuditSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
        delta: Option<Decimal>,
    ) -> Self {
        Self {
            rule_id,
            rule_name: rule_name.into(),
            domain,
            category,
            severity,
            title: title.into(),
            message: message.into(),
            delta,
            items: Vec::new(),
            evidence: BTreeMap::new(),
            recommendation: None,
        }
    }

    /// Stand-in finding for a rule whose predicate failed
    pub fn rule_failure(
        domain: AuditDomain,
        rule_id: RuleId,
        rule_name: &str,
        diagnostic: impl Into<String>,
    ) -> Self {
        Self::new(
            rule_id,
            rule_name,
            domain,
            AuditCategory::Financial,
            AuditSeverity::Error,
            format!("Rule Execution Error: {rule_name}"),
            diagnostic,
            None,
        )
    }

    pub fn with_items(mut self, items: Vec<ItemRef>) -> Self {
        self.items = items;
        self
    }

    pub fn with_evidence(mut self, evidence: BTreeMap<String, String>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_recommendation(mut self, recommendation: Option<String>) -> Self {
        self.recommendation = recommendation;
        self
    }

    pub fn rule_id(&self) -> &RuleId {
        &self.rule_id
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn domain(&self) -> AuditDomain {
        self.domain
    }

    pub fn category(&self) -> AuditCategory {
        self.category
    }

    pub fn severity(&self) -> AuditSeverity {
        self.severity
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn delta(&self) -> Option<Decimal> {
        self.delta
    }

    pub fn items(&self) -> &[ItemRef] {
        &self.items
    }

    pub fn evidence(&self) -> &BTreeMap<String, String> {
        &self.evidence
    }

    pub fn recommendation(&self) -> Option<&str> {
        self.recommendation.as_deref()
    }

    /// Returns a copy with every free-text field passed through `f`
    ///
    /// Identity, classification and amounts are left untouched.
    pub fn map_text<F>(&self, f: F) -> Self
    where
        F: Fn(&str) -> String,
    {
        Self {
            title: f(&self.title),
            message: f(&self.message),
            items: self
                .items
                .iter()
                .map(|i| ItemRef {
                    index: i.index,
                    code: f(&i.code),
                })
                .collect(),
            evidence: self
                .evidence
                .iter()
                .map(|(k, v)| (k.clone(), f(v)))
                .collect(),
            recommendation: self.recommendation.as_deref().map(&f),
            ..self.clone()
        }
    }
}

/// Finding produced by a predicate before rule identity is attached
///
/// Severity and category default to the emitting rule's primary
/// declaration when not set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindingDraft {
    pub title: String,
    pub message: String,
    pub severity: Option<AuditSeverity>,
    pub category: Option<AuditCategory>,
    pub delta: Option<Decimal>,
    pub items: Vec<ItemRef>,
    pub evidence: BTreeMap<String, String>,
    pub recommendation: Option<String>,
}

impl FindingDraft {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn category(mut self, category: AuditCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn delta(mut self, delta: Decimal) -> Self {
        self.delta = Some(delta);
        self
    }

    /// References a claim line item by position
    pub fn item(mut self, index: usize, item: &LineItem) -> Self {
        let code = if item.code().is_empty() {
            item.description().to_string()
        } else {
            item.code().to_string()
        };
        self.items.push(ItemRef { index, code });
        self
    }

    pub fn evidence(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.evidence.insert(key.into(), value.to_string());
        self
    }

    pub fn recommendation(mut self, text: impl Into<String>) -> Self {
        self.recommendation = Some(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn finding() -> AuditFinding {
        AuditFinding::new(
            RuleId::parse("GEN-001").unwrap(),
            "Double-Dip Detection",
            AuditDomain::GeneralRepair,
            AuditCategory::Leakage,
            AuditSeverity::Warning,
            "Overlap",
            "Call 555-123-4567",
            Some(dec!(40)),
        )
    }

    #[test]
    fn test_rule_failure_shape() {
        let f = AuditFinding::rule_failure(
            AuditDomain::Flooring,
            RuleId::parse("FLR-001").unwrap(),
            "Waste",
            "boom",
        );
        assert_eq!(f.severity(), AuditSeverity::Error);
        assert_eq!(f.title(), "Rule Execution Error: Waste");
        assert_eq!(f.delta(), None);
    }

    #[test]
    fn test_map_text_preserves_identity() {
        let f = finding();
        let mapped = f.map_text(|s| s.replace("555-123-4567", "[REDACTED]"));
        assert_eq!(mapped.message(), "Call [REDACTED]");
        assert_eq!(mapped.rule_id(), f.rule_id());
        assert_eq!(mapped.delta(), Some(dec!(40)));
    }
}
