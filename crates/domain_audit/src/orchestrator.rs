//! Audit orchestration
//!
//! Runs the enabled domain validators in phase order over one claim and
//! folds their findings into a scorecard.
//!
//! ```text
//! Financial -> Water Remediation -> Flooring -> General Repair
//! ```
//!
//! Every validator reads the same immutable claim and shares one lazily
//! built classification of its line items. In parallel mode validators
//! run on the rayon pool; results are collected in phase order, so the
//! merged finding list is identical to a sequential run.

use rayon::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

use domain_claims::{ClaimData, ClaimRecord};
use crate::classifier::CodeClassifier;
use crate::error::AuditError;
use crate::finding::AuditFinding;
use crate::policy::AuditPolicy;
use crate::registry::add_rule;
use crate::rule::{AuditRule, RuleContext, RuleDescriptor};
use crate::scorecard::{AuditScorecard, ScorecardAggregator};
use crate::taxonomy::AuditDomain;
use crate::validators::DomainValidator;

/// Entry point of the audit engine
#[derive(Debug, Clone)]
pub struct ClaimAuditor {
    classifier: Arc<CodeClassifier>,
    validators: Vec<DomainValidator>,
    aggregator: ScorecardAggregator,
    parallel: bool,
}

impl ClaimAuditor {
    /// Builds an auditor with the built-in rules and the shared classifier
    ///
    /// # Errors
    ///
    /// Fails if the policy is unusable or the built-in catalog or rule
    /// set cannot be constructed.
    pub fn new(policy: &AuditPolicy) -> Result<Self, AuditError> {
        Self::with_classifier(CodeClassifier::shared()?, policy)
    }

    /// Builds an auditor with the default policy
    pub fn standard() -> Result<Self, AuditError> {
        Self::new(&AuditPolicy::default())
    }

    /// Builds an auditor around a custom classifier
    pub fn with_classifier(
        classifier: Arc<CodeClassifier>,
        policy: &AuditPolicy,
    ) -> Result<Self, AuditError> {
        policy.validate()?;
        let validators = AuditDomain::ALL
            .iter()
            .map(|domain| DomainValidator::for_domain(*domain, Arc::clone(&classifier), policy))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            catalog = classifier.version(),
            rules = validators.iter().map(|v| v.registry().len()).sum::<usize>(),
            parallel = policy.parallel,
            "Claim auditor constructed"
        );

        Ok(Self {
            classifier,
            validators,
            aggregator: ScorecardAggregator::from_policy(policy),
            parallel: policy.parallel,
        })
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn classifier(&self) -> &CodeClassifier {
        &self.classifier
    }

    /// Validators in phase order
    pub fn validators(&self) -> &[DomainValidator] {
        &self.validators
    }

    pub fn validator(&self, domain: AuditDomain) -> Option<&DomainValidator> {
        self.validators.iter().find(|v| v.domain() == domain)
    }

    /// Appends a rule to one domain's registry
    pub fn register_rule(&mut self, domain: AuditDomain, rule: AuditRule) -> Result<(), AuditError> {
        let validator = self
            .validators
            .iter_mut()
            .find(|v| v.domain() == domain)
            .ok_or_else(|| AuditError::UnknownDomain(domain.to_string()))?;
        add_rule(validator.registry_mut(), rule)
    }

    /// Descriptors of every registered rule in phase and registration order
    pub fn rule_descriptors(&self) -> Vec<RuleDescriptor> {
        self.validators
            .iter()
            .flat_map(|v| v.registry().descriptors())
            .collect()
    }

    /// Audits a claim with every domain enabled
    pub fn audit_all(&self, claim: &ClaimData) -> AuditScorecard {
        let enabled: BTreeSet<AuditDomain> = AuditDomain::ALL.into_iter().collect();
        self.audit(claim, &enabled)
    }

    /// Audits a claim with the given domains enabled
    ///
    /// # Arguments
    ///
    /// * `claim` - The validated claim
    /// * `enabled` - Domains to run; the others contribute no findings
    ///
    /// # Returns
    ///
    /// The scorecard with findings in phase, then registration, order
    pub fn audit(&self, claim: &ClaimData, enabled: &BTreeSet<AuditDomain>) -> AuditScorecard {
        let ctx = RuleContext::new(claim, &self.classifier);
        let selected: Vec<&DomainValidator> = self
            .validators
            .iter()
            .filter(|v| enabled.contains(&v.domain()))
            .collect();

        let per_domain: Vec<Vec<AuditFinding>> = if self.parallel {
            selected.par_iter().map(|v| v.validate_in(&ctx)).collect()
        } else {
            selected.iter().map(|v| v.validate_in(&ctx)).collect()
        };
        let findings: Vec<AuditFinding> = per_domain.into_iter().flatten().collect();

        let unknown_items = ctx.unknown_count();
        let domains: Vec<AuditDomain> = selected.iter().map(|v| v.domain()).collect();
        let scorecard = self
            .aggregator
            .build_for_claim(claim, domains, findings, unknown_items);

        tracing::info!(
            claim_id = %claim.claim_id(),
            domains = scorecard.domains_executed().len(),
            findings = scorecard.findings().len(),
            risk_score = scorecard.risk_score(),
            unknown_items,
            "Claim audit completed"
        );

        scorecard
    }

    /// Validates a raw record and audits it
    ///
    /// # Errors
    ///
    /// `AuditError::InputShape` if the record is rejected; no rule runs.
    pub fn audit_record(
        &self,
        record: ClaimRecord,
        enabled: &BTreeSet<AuditDomain>,
    ) -> Result<AuditScorecard, AuditError> {
        let claim = ClaimData::try_from(record)?;
        Ok(self.audit(&claim, enabled))
    }
}
