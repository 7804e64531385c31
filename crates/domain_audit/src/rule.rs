//! Audit rules and their evaluation context
//!
//! A rule is a value: identity, declared category and severity, and a
//! predicate closure over a read-only [`RuleContext`]. Rules never mutate
//! the claim and never see each other's results.

use once_cell::sync::OnceCell;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use core_kernel::RuleId;
use domain_claims::{ClaimData, LineItem};
use crate::classifier::{ClassifiedCode, CodeClassifier};
use crate::error::{AuditError, RuleError};
use crate::finding::{AuditFinding, FindingDraft};
use crate::overlap::{resolve_scopes, ItemScope};
use crate::taxonomy::{AuditCategory, AuditDomain, AuditSeverity};

/// Predicate signature shared by all rules
pub type RulePredicate =
    Arc<dyn Fn(&RuleContext<'_>) -> Result<Vec<FindingDraft>, RuleError> + Send + Sync>;

/// Category and severity pair a rule may emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeclaredOutcome {
    pub category: AuditCategory,
    pub severity: AuditSeverity,
}

/// A single named audit check
#[derive(Clone)]
pub struct AuditRule {
    id: RuleId,
    name: String,
    description: String,
    category: AuditCategory,
    severity: AuditSeverity,
    secondary: Vec<DeclaredOutcome>,
    predicate: RulePredicate,
}

impl AuditRule {
    /// Creates a rule with its primary category and severity
    ///
    /// # Arguments
    ///
    /// * `id` - Rule identifier such as `"WTR-006"`
    /// * `name` - Display name
    /// * `category` - Primary category of emitted findings
    /// * `severity` - Primary severity of emitted findings
    /// * `predicate` - Check returning zero or more finding drafts
    pub fn new<F>(
        id: impl AsRef<str>,
        name: impl Into<String>,
        category: AuditCategory,
        severity: AuditSeverity,
        predicate: F,
    ) -> Result<Self, AuditError>
    where
        F: Fn(&RuleContext<'_>) -> Result<Vec<FindingDraft>, RuleError> + Send + Sync + 'static,
    {
        Ok(Self {
            id: RuleId::parse(id)?,
            name: name.into(),
            description: String::new(),
            category,
            severity,
            secondary: Vec::new(),
            predicate: Arc::new(predicate),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declares an additional category/severity the rule may emit
    pub fn also_emits(mut self, category: AuditCategory, severity: AuditSeverity) -> Self {
        self.secondary.push(DeclaredOutcome { category, severity });
        self
    }

    pub fn id(&self) -> &RuleId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> AuditCategory {
        self.category
    }

    pub fn severity(&self) -> AuditSeverity {
        self.severity
    }

    /// Whether the rule declared this outcome
    pub fn declares(&self, category: AuditCategory, severity: AuditSeverity) -> bool {
        (self.category == category && self.severity == severity)
            || self
                .secondary
                .iter()
                .any(|o| o.category == category && o.severity == severity)
    }

    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<FindingDraft>, RuleError> {
        (self.predicate)(ctx)
    }

    /// Stamps a draft with this rule's identity
    ///
    /// Returns the undeclared outcome as an error so the caller can
    /// replace the draft.
    pub fn finalize(
        &self,
        domain: AuditDomain,
        draft: FindingDraft,
    ) -> Result<AuditFinding, DeclaredOutcome> {
        let category = draft.category.unwrap_or(self.category);
        let severity = draft.severity.unwrap_or(self.severity);
        if !self.declares(category, severity) {
            return Err(DeclaredOutcome { category, severity });
        }

        Ok(AuditFinding::new(
            self.id.clone(),
            self.name.clone(),
            domain,
            category,
            severity,
            draft.title,
            draft.message,
            draft.delta,
        )
        .with_items(draft.items)
        .with_evidence(draft.evidence)
        .with_recommendation(draft.recommendation))
    }

    pub fn descriptor(&self, domain: AuditDomain) -> RuleDescriptor {
        RuleDescriptor {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            domain,
            category: self.category,
            severity: self.severity,
            also_emits: self.secondary.clone(),
        }
    }
}

impl fmt::Debug for AuditRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditRule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

/// Serializable rule metadata for listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleDescriptor {
    pub id: RuleId,
    pub name: String,
    pub description: String,
    pub domain: AuditDomain,
    pub category: AuditCategory,
    pub severity: AuditSeverity,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub also_emits: Vec<DeclaredOutcome>,
}

/// Read-only view of one claim during an audit
///
/// Classifications and room scopes are computed once on first use and
/// shared by every rule of every domain.
pub struct RuleContext<'a> {
    claim: &'a ClaimData,
    classifier: &'a CodeClassifier,
    classified: OnceCell<Vec<ClassifiedCode>>,
    scopes: OnceCell<Vec<ItemScope>>,
}

impl<'a> RuleContext<'a> {
    pub fn new(claim: &'a ClaimData, classifier: &'a CodeClassifier) -> Self {
        Self {
            claim,
            classifier,
            classified: OnceCell::new(),
            scopes: OnceCell::new(),
        }
    }

    pub fn claim(&self) -> &'a ClaimData {
        self.claim
    }

    pub fn classifier(&self) -> &'a CodeClassifier {
        self.classifier
    }

    /// Classification of each line item, by position
    pub fn classifications(&self) -> &[ClassifiedCode] {
        self.classified.get_or_init(|| {
            self.claim
                .line_items()
                .iter()
                .map(|item| self.classifier.classify_item(item))
                .collect()
        })
    }

    /// Room scope of each line item, by position
    pub fn scopes(&self) -> &[ItemScope] {
        self.scopes.get_or_init(|| resolve_scopes(self.claim))
    }

    /// Line items joined with their classification and scope
    pub fn items(&self) -> impl Iterator<Item = ClassifiedItem<'_>> {
        let line_items: &[LineItem] = self.claim.line_items();
        line_items
            .iter()
            .zip(self.classifications())
            .zip(self.scopes())
            .enumerate()
            .map(|(index, ((item, class), scope))| ClassifiedItem {
                index,
                item,
                class,
                scope,
            })
    }

    /// Number of line items that matched no trade category
    pub fn unknown_count(&self) -> usize {
        self.classifications().iter().filter(|c| c.is_unknown()).count()
    }
}

/// A line item with its position, classification and room scope
#[derive(Debug, Clone, Copy)]
pub struct ClassifiedItem<'a> {
    pub index: usize,
    pub item: &'a LineItem,
    pub class: &'a ClassifiedCode,
    pub scope: &'a ItemScope,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::FindingDraft;

    fn rule() -> AuditRule {
        AuditRule::new(
            "WTR-003",
            "Monitoring Labor Audit",
            AuditCategory::Leakage,
            AuditSeverity::Error,
            |_ctx: &RuleContext<'_>| Ok(Vec::new()),
        )
        .unwrap()
        .also_emits(AuditCategory::Leakage, AuditSeverity::Warning)
    }

    #[test]
    fn test_declares_primary_and_secondary() {
        let r = rule();
        assert!(r.declares(AuditCategory::Leakage, AuditSeverity::Error));
        assert!(r.declares(AuditCategory::Leakage, AuditSeverity::Warning));
        assert!(!r.declares(AuditCategory::Leakage, AuditSeverity::Critical));
    }

    #[test]
    fn test_finalize_defaults_to_primary() {
        let finding = rule()
            .finalize(AuditDomain::WaterRemediation, FindingDraft::new("t", "m"))
            .unwrap();
        assert_eq!(finding.severity(), AuditSeverity::Error);
        assert_eq!(finding.rule_id().as_str(), "WTR-003");
    }

    #[test]
    fn test_finalize_rejects_undeclared_outcome() {
        let draft = FindingDraft::new("t", "m").severity(AuditSeverity::Info);
        let rejected = rule().finalize(AuditDomain::WaterRemediation, draft).unwrap_err();
        assert_eq!(rejected.severity, AuditSeverity::Info);
    }

    #[test]
    fn test_invalid_rule_id_is_rejected() {
        let result = AuditRule::new(
            "  ",
            "Blank",
            AuditCategory::Leakage,
            AuditSeverity::Info,
            |_ctx: &RuleContext<'_>| Ok(Vec::new()),
        );
        assert!(matches!(result, Err(AuditError::RuleId(_))));
    }
}
