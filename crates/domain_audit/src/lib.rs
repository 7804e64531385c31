//! Claim Audit Domain
//!
//! This crate implements the rule evaluation and classification engine that
//! audits claim estimates for billing discrepancies, policy violations and
//! overpayment risk.
//!
//! # Audit Pipeline
//!
//! ```text
//! ClaimData -> ClaimAuditor
//!   -> Financial -> Water Remediation -> Flooring -> General Repair
//!      (each: DomainValidator -> RuleRegistry -> predicates -> CodeClassifier)
//!   -> ScorecardAggregator -> AuditScorecard
//! ```
//!
//! Rules are plain values carrying a predicate closure. Each domain owns an
//! ordered registry, evaluation order is registration order, and a failing
//! predicate degrades to a single synthetic finding instead of aborting the
//! audit.

pub mod taxonomy;
pub mod classifier;
pub mod finding;
pub mod rule;
pub mod registry;
pub mod overlap;
pub mod policy;
pub mod validators;
pub mod orchestrator;
pub mod scorecard;
pub mod error;

pub use taxonomy::{AuditCategory, AuditDomain, AuditSeverity};
pub use classifier::{
    ClassifiedCode, CodeClassifier, DoubleDipPair, EquipmentKind, FlooringMaterial,
    FlooringOperation, PairScope, PairSide, PairSideKind, Pattern, TradeCategory, CATALOG_VERSION,
};
pub use finding::{AuditFinding, FindingDraft, ItemRef};
pub use rule::{AuditRule, ClassifiedItem, DeclaredOutcome, RuleContext, RuleDescriptor, RulePredicate};
pub use registry::{add_rule, RuleRegistry};
pub use overlap::{assess_equipment, find_double_dips, resolve_scopes, DoubleDipMatch, EquipmentAssessment, ItemScope};
pub use policy::{
    AuditPolicy, EquipmentPolicy, EquipmentRatio, FinancialPolicy, FlooringPolicy,
    GeneralRepairPolicy, OverlapPolicy, ScoringPolicy, WaterPolicy,
};
pub use validators::DomainValidator;
pub use orchestrator::ClaimAuditor;
pub use scorecard::{AuditScorecard, ClaimSummary, ScorecardAggregator};
pub use error::{AuditError, RuleError};
