//! Financial validation (FIN)
//!
//! Policy limits, deductible and arithmetic reconciliation.
//!
//! | id      | check                                   | severity |
//! |---------|-----------------------------------------|----------|
//! | FIN-001 | deductible present and applied          | WARNING  |
//! | FIN-002 | dwelling scope within Coverage A        | CRITICAL |
//! | FIN-003 | other structures within Coverage B      | ERROR    |
//! | FIN-004 | contents within Coverage C              | ERROR    |
//! | FIN-005 | peril and trade sub-limits              | WARNING  |
//! | FIN-006 | reported gross matches line items       | ERROR    |
//! | FIN-007 | reported net equals gross less deductible | ERROR  |

use rust_decimal::Decimal;

use core_kernel::Money;
use domain_claims::ClaimData;
use crate::classifier::{Pattern, TradeCategory};
use crate::error::{AuditError, RuleError};
use crate::finding::FindingDraft;
use crate::policy::AuditPolicy;
use crate::rule::{AuditRule, ClassifiedItem, RuleContext};
use crate::taxonomy::{AuditCategory, AuditSeverity};
use super::sum_totals;

/// Trade categories billed against the dwelling
const DWELLING: [TradeCategory; 7] = [
    TradeCategory::Water,
    TradeCategory::Drying,
    TradeCategory::FlooringCarpet,
    TradeCategory::FlooringNatural,
    TradeCategory::Painting,
    TradeCategory::Demolition,
    TradeCategory::General,
];

const OTHER_STRUCTURE: &str = r"\b(?:DETACHED|GARAGE|FENCE|SHED|OUTBUILDING|GAZEBO|CARPORT)\b";
const MOLD: &str = r"\bMOLD\b|\bFUNG|\bMICROBIAL\b";

/// Built-in financial rules in registration order
pub fn rules(policy: &AuditPolicy) -> Result<Vec<AuditRule>, AuditError> {
    let tolerance = policy.financial.tolerance;
    let other_structure = Pattern::new(OTHER_STRUCTURE)?;
    let dwelling_exclusion = other_structure.clone();
    let mold = Pattern::new(MOLD)?;

    Ok(vec![
        AuditRule::new(
            "FIN-001",
            "Deductible Application",
            AuditCategory::Financial,
            AuditSeverity::Warning,
            move |ctx: &RuleContext<'_>| check_deductible(ctx.claim(), tolerance),
        )?
        .with_description("Verify a deductible exists and is applied to the reported net claim"),
        AuditRule::new(
            "FIN-002",
            "Coverage A Limit",
            AuditCategory::Financial,
            AuditSeverity::Critical,
            move |ctx: &RuleContext<'_>| {
                let claim = ctx.claim();
                let items: Vec<_> = ctx
                    .items()
                    .filter(|e| e.class.has_any_category(&DWELLING))
                    .filter(|e| !dwelling_exclusion.matches_item(e.item.code(), e.item.description()))
                    .collect();
                coverage_check(claim, &items, claim.policy().coverage_a(), "Coverage A", "Dwelling repairs")
            },
        )?
        .with_description("Dwelling repair total must not exceed the Coverage A limit"),
        AuditRule::new(
            "FIN-003",
            "Coverage B Limit",
            AuditCategory::Financial,
            AuditSeverity::Error,
            move |ctx: &RuleContext<'_>| {
                let claim = ctx.claim();
                let items: Vec<_> = ctx
                    .items()
                    .filter(|e| other_structure.matches_item(e.item.code(), e.item.description()))
                    .collect();
                coverage_check(claim, &items, claim.policy().coverage_b(), "Coverage B", "Other structures")
            },
        )?
        .with_description("Detached structure repairs must not exceed the Coverage B limit"),
        AuditRule::new(
            "FIN-004",
            "Coverage C Limit",
            AuditCategory::Financial,
            AuditSeverity::Error,
            |ctx: &RuleContext<'_>| {
                let claim = ctx.claim();
                let items: Vec<_> = ctx
                    .items()
                    .filter(|e| e.class.has_category(TradeCategory::Contents))
                    .collect();
                coverage_check(claim, &items, claim.policy().coverage_c(), "Coverage C", "Contents")
            },
        )?
        .with_description("Contents total must not exceed the Coverage C limit"),
        AuditRule::new(
            "FIN-005",
            "Sub-Limit Compliance",
            AuditCategory::Financial,
            AuditSeverity::Warning,
            move |ctx: &RuleContext<'_>| check_sub_limits(ctx, &mold),
        )?
        .with_description("Peril and trade sub-limits such as water or mold must not be exceeded"),
        AuditRule::new(
            "FIN-006",
            "Gross Claim Reconciliation",
            AuditCategory::Financial,
            AuditSeverity::Error,
            move |ctx: &RuleContext<'_>| check_gross(ctx.claim(), tolerance),
        )?
        .with_description("Reported gross claim must equal the sum of line item totals"),
        AuditRule::new(
            "FIN-007",
            "Net Claim Calculation",
            AuditCategory::Financial,
            AuditSeverity::Error,
            move |ctx: &RuleContext<'_>| check_net(ctx.claim(), tolerance),
        )?
        .with_description("Reported net claim must equal gross less deductible, floored at zero"),
    ])
}

fn check_deductible(claim: &ClaimData, tolerance: Decimal) -> Result<Vec<FindingDraft>, RuleError> {
    let deductible = claim.policy().deductible();
    if deductible.is_zero() {
        return Ok(vec![FindingDraft::new(
            "Zero or Missing Deductible",
            "Policy shows no deductible. Verify this is correct.",
        )
        .evidence("deductible", deductible.amount())
        .recommendation("Confirm the policy terms carry a zero deductible or correct the claim data")]);
    }

    let reported = claim.reported();
    let (Some(net), gross) = (reported.net, reported.gross) else {
        return Ok(Vec::new());
    };
    let gross = gross.unwrap_or_else(|| claim.gross_total());
    if gross.is_positive() && (net.amount() - gross.amount()).abs() <= tolerance {
        return Ok(vec![FindingDraft::new(
            "Deductible Not Applied",
            format!("Reported net {net} equals gross {gross}; the {deductible} deductible was not subtracted"),
        )
        .delta(deductible.amount().min(gross.amount()))
        .evidence("deductible", deductible.amount())
        .evidence("gross", gross.amount())
        .evidence("reported_net", net.amount())
        .recommendation("Apply the deductible to the net claim")]);
    }
    Ok(Vec::new())
}

fn coverage_check(
    claim: &ClaimData,
    items: &[ClassifiedItem<'_>],
    limit: Money,
    coverage: &str,
    subject: &str,
) -> Result<Vec<FindingDraft>, RuleError> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let total = sum_totals(claim.currency(), items.iter().map(|e| e.item))?;
    if total.amount() <= limit.amount() {
        return Ok(Vec::new());
    }

    let overage = total.checked_sub(&limit)?.round_to_currency();
    let mut draft = FindingDraft::new(
        format!("{coverage} Limit Exceeded"),
        format!("{subject} total {total} exceeds the {coverage} limit of {limit}"),
    )
    .delta(overage.amount())
    .evidence("total", total.round_to_currency().amount())
    .evidence("limit", limit.amount())
    .evidence("overage", overage.amount())
    .recommendation("Review scope against the policy limit before payment");
    for e in items {
        draft = draft.item(e.index, e.item);
    }
    Ok(vec![draft])
}

fn check_sub_limits(ctx: &RuleContext<'_>, mold: &Pattern) -> Result<Vec<FindingDraft>, RuleError> {
    let claim = ctx.claim();
    let mut drafts = Vec::new();

    for (key, cap) in claim.policy().sub_limits() {
        let items: Vec<ClassifiedItem<'_>> = if key == "mold" {
            ctx.items()
                .filter(|e| mold.matches_item(e.item.code(), e.item.description()))
                .collect()
        } else if let Some(category) = TradeCategory::from_key(key) {
            ctx.items().filter(|e| e.class.has_category(category)).collect()
        } else {
            tracing::debug!(sub_limit = %key, "Sub-limit key matches no category, skipped");
            continue;
        };
        if items.is_empty() {
            continue;
        }

        let total = sum_totals(claim.currency(), items.iter().map(|e| e.item))?;
        if total.amount() <= cap.amount() {
            continue;
        }
        let overage = total.checked_sub(cap)?.round_to_currency();
        let mut draft = FindingDraft::new(
            format!("Sub-Limit Exceeded: {key}"),
            format!("Items under the '{key}' sub-limit total {total}, above the cap of {cap}"),
        )
        .delta(overage.amount())
        .evidence("sub_limit", key)
        .evidence("total", total.round_to_currency().amount())
        .evidence("cap", cap.amount())
        .recommendation("Limit payment for this peril or trade to the sub-limit");
        for e in &items {
            draft = draft.item(e.index, e.item);
        }
        drafts.push(draft);
    }

    Ok(drafts)
}

fn check_gross(claim: &ClaimData, tolerance: Decimal) -> Result<Vec<FindingDraft>, RuleError> {
    let Some(reported) = claim.reported().gross else {
        return Ok(Vec::new());
    };
    let computed = claim.gross_total().round_to_currency();
    let variance = reported.checked_sub(&computed)?;
    if variance.amount().abs() <= tolerance {
        return Ok(Vec::new());
    }

    Ok(vec![FindingDraft::new(
        "Gross Claim Mismatch",
        format!("Reported gross {reported} differs from the line item total {computed}"),
    )
    .delta(variance.amount())
    .evidence("reported_gross", reported.amount())
    .evidence("computed_gross", computed.amount())
    .recommendation("Reconcile the estimate summary with its line items")])
}

fn check_net(claim: &ClaimData, tolerance: Decimal) -> Result<Vec<FindingDraft>, RuleError> {
    let Some(net) = claim.reported().net else {
        return Ok(Vec::new());
    };
    let gross = claim
        .reported()
        .gross
        .unwrap_or_else(|| claim.gross_total().round_to_currency());
    let deductible = claim.policy().deductible();
    let expected = gross.checked_sub(&deductible)?.floor_at_zero();
    let variance = net.checked_sub(&expected)?;
    if variance.amount().abs() <= tolerance {
        return Ok(Vec::new());
    }

    Ok(vec![FindingDraft::new(
        "Net Claim Calculation Error",
        format!("Net claim {net} does not match expected {expected} (gross {gross} less deductible {deductible})"),
    )
    .delta(variance.amount())
    .evidence("stated_net", net.amount())
    .evidence("expected_net", expected.amount())
    .evidence("gross", gross.amount())
    .evidence("deductible", deductible.amount())
    .recommendation("Recalculate the net claim amount")])
}
