//! Rule Registry and Engine
//!
//! Each audit domain owns one ordered registry. Evaluation runs every rule
//! in registration order against a shared [`RuleContext`] and concatenates
//! the findings.
//!
//! # Failure Containment
//!
//! ```text
//! predicate Ok(drafts)     -> findings stamped with the rule's identity
//! predicate Err(e)         -> one "Rule Execution Error" finding
//! predicate panics         -> one "Rule Execution Error" finding
//! undeclared outcome       -> draft replaced by a "Rule Execution Error" finding
//! ```
//!
//! Remaining rules always run.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use core_kernel::RuleId;
use domain_claims::ClaimData;
use crate::classifier::CodeClassifier;
use crate::error::AuditError;
use crate::finding::AuditFinding;
use crate::rule::{AuditRule, RuleContext, RuleDescriptor};
use crate::taxonomy::{AuditCategory, AuditDomain};

/// Ordered, duplicate-free collection of rules for one domain
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    domain: AuditDomain,
    rules: Vec<AuditRule>,
    index: BTreeMap<RuleId, usize>,
}

impl RuleRegistry {
    pub fn new(domain: AuditDomain) -> Self {
        Self {
            domain,
            rules: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    pub fn domain(&self) -> AuditDomain {
        self.domain
    }

    /// Appends a rule
    ///
    /// # Errors
    ///
    /// `AuditError::DuplicateRule` if a rule with the same id is already
    /// registered; the registry is left unchanged.
    pub fn register(&mut self, rule: AuditRule) -> Result<(), AuditError> {
        if self.index.contains_key(rule.id()) {
            return Err(AuditError::DuplicateRule {
                domain: self.domain,
                rule_id: rule.id().clone(),
            });
        }
        self.index.insert(rule.id().clone(), self.rules.len());
        self.rules.push(rule);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&AuditRule> {
        let id = RuleId::parse(id).ok()?;
        self.index.get(&id).map(|&i| &self.rules[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Rules in registration order
    pub fn iter(&self) -> impl Iterator<Item = &AuditRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn descriptors(&self) -> Vec<RuleDescriptor> {
        self.rules.iter().map(|r| r.descriptor(self.domain)).collect()
    }

    /// Evaluates every rule against a claim
    pub fn evaluate(&self, claim: &ClaimData, classifier: &CodeClassifier) -> Vec<AuditFinding> {
        let ctx = RuleContext::new(claim, classifier);
        self.evaluate_in(&ctx)
    }

    /// Evaluates every rule against an existing context
    pub fn evaluate_in(&self, ctx: &RuleContext<'_>) -> Vec<AuditFinding> {
        self.rules
            .iter()
            .flat_map(|rule| self.run_rule(rule, ctx))
            .collect()
    }

    /// Evaluates only the rules whose primary category matches
    pub fn evaluate_category(
        &self,
        claim: &ClaimData,
        classifier: &CodeClassifier,
        category: AuditCategory,
    ) -> Vec<AuditFinding> {
        let ctx = RuleContext::new(claim, classifier);
        self.rules
            .iter()
            .filter(|rule| rule.category() == category)
            .flat_map(|rule| self.run_rule(rule, &ctx))
            .collect()
    }

    fn run_rule(&self, rule: &AuditRule, ctx: &RuleContext<'_>) -> Vec<AuditFinding> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(ctx)));

        let drafts = match outcome {
            Ok(Ok(drafts)) => drafts,
            Ok(Err(e)) => {
                tracing::warn!(rule_id = %rule.id(), domain = %self.domain, error = %e, "Rule evaluation failed");
                return vec![self.failure(rule, e.to_string())];
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(rule_id = %rule.id(), domain = %self.domain, panic = %message, "Rule panicked");
                return vec![self.failure(rule, format!("rule panicked: {message}"))];
            }
        };

        tracing::debug!(
            rule_id = %rule.id(),
            domain = %self.domain,
            findings = drafts.len(),
            "Rule evaluated"
        );

        drafts
            .into_iter()
            .map(|draft| {
                rule.finalize(self.domain, draft).unwrap_or_else(|undeclared| {
                    tracing::warn!(
                        rule_id = %rule.id(),
                        category = %undeclared.category,
                        severity = %undeclared.severity,
                        "Rule emitted an undeclared outcome"
                    );
                    self.failure(
                        rule,
                        format!(
                            "rule emitted undeclared outcome {}/{}",
                            undeclared.category, undeclared.severity
                        ),
                    )
                })
            })
            .collect()
    }

    fn failure(&self, rule: &AuditRule, diagnostic: String) -> AuditFinding {
        AuditFinding::rule_failure(self.domain, rule.id().clone(), rule.name(), diagnostic)
    }
}

/// Appends a rule to a registry; see [`RuleRegistry::register`]
pub fn add_rule(registry: &mut RuleRegistry, rule: AuditRule) -> Result<(), AuditError> {
    registry.register(rule)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
