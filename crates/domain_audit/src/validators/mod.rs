//! Domain validators
//!
//! A validator is a thin composition of one [`RuleRegistry`] and the
//! shared classifier. Each domain module exposes a `rules(policy)` builder
//! returning its fixed rule set in registration order.

pub mod financial;
pub mod water;
pub mod flooring;
pub mod general_repair;

use std::sync::Arc;

use core_kernel::{Currency, Money};
use domain_claims::{ClaimData, LineItem};
use crate::classifier::CodeClassifier;
use crate::error::{AuditError, RuleError};
use crate::finding::AuditFinding;
use crate::policy::AuditPolicy;
use crate::registry::RuleRegistry;
use crate::rule::{AuditRule, RuleContext};
use crate::taxonomy::AuditDomain;

/// Rules of one audit domain bound to the classifier
#[derive(Debug, Clone)]
pub struct DomainValidator {
    registry: RuleRegistry,
    classifier: Arc<CodeClassifier>,
}

impl DomainValidator {
    /// Builds a validator from an explicit rule list
    ///
    /// Rules disabled by the policy are skipped.
    ///
    /// # Errors
    ///
    /// `AuditError::DuplicateRule` if two rules share an id
    pub fn new(
        domain: AuditDomain,
        classifier: Arc<CodeClassifier>,
        rules: Vec<AuditRule>,
        policy: &AuditPolicy,
    ) -> Result<Self, AuditError> {
        let mut registry = RuleRegistry::new(domain);
        for rule in rules {
            if !policy.is_rule_enabled(rule.id().as_str()) {
                tracing::debug!(rule_id = %rule.id(), domain = %domain, "Rule disabled by policy");
                continue;
            }
            registry.register(rule)?;
        }
        Ok(Self { registry, classifier })
    }

    /// Builds the validator with the built-in rule set of a domain
    pub fn for_domain(
        domain: AuditDomain,
        classifier: Arc<CodeClassifier>,
        policy: &AuditPolicy,
    ) -> Result<Self, AuditError> {
        let rules = match domain {
            AuditDomain::Financial => financial::rules(policy)?,
            AuditDomain::WaterRemediation => water::rules(policy)?,
            AuditDomain::Flooring => flooring::rules(policy)?,
            AuditDomain::GeneralRepair => general_repair::rules(policy)?,
        };
        Self::new(domain, classifier, rules, policy)
    }

    /// Adds a rule after the built-in set
    pub fn with_rule(mut self, rule: AuditRule) -> Result<Self, AuditError> {
        self.registry.register(rule)?;
        Ok(self)
    }

    pub fn domain(&self) -> AuditDomain {
        self.registry.domain()
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut RuleRegistry {
        &mut self.registry
    }

    pub fn classifier(&self) -> &CodeClassifier {
        &self.classifier
    }

    /// Runs every rule of the domain against a claim
    pub fn validate(&self, claim: &ClaimData) -> Vec<AuditFinding> {
        self.registry.evaluate(claim, &self.classifier)
    }

    /// Runs every rule against a context shared with other validators
    pub fn validate_in(&self, ctx: &RuleContext<'_>) -> Vec<AuditFinding> {
        self.registry.evaluate_in(ctx)
    }
}

/// Sums line item totals in the claim currency
pub(crate) fn sum_totals<'a, I>(currency: Currency, items: I) -> Result<Money, RuleError>
where
    I: IntoIterator<Item = &'a LineItem>,
{
    let totals: Vec<Money> = items.into_iter().map(LineItem::total).collect();
    Ok(Money::sum(&totals, currency)?)
}

/// Formats a rounded decimal without trailing zeros
pub(crate) fn plain(value: rust_decimal::Decimal) -> String {
    value.normalize().to_string()
}
