//! General repair validation (GEN)

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use core_kernel::MoneyError;
use crate::classifier::{FlooringOperation, Pattern, TradeCategory};
use crate::error::{AuditError, RuleError};
use crate::finding::FindingDraft;
use crate::overlap::find_double_dips;
use crate::policy::{AuditPolicy, GeneralRepairPolicy};
use crate::rule::{AuditRule, ClassifiedItem, RuleContext};
use crate::taxonomy::{AuditCategory, AuditDomain, AuditSeverity};
use super::sum_totals;

const CONTENT_HANDLING: &str = r"CONTENTS?\s*(?:MANIP|MOV|PROTECT|HANDL)|MOVE\s*(?:OUT|BACK|CONTENTS?|FURNITURE)|FURNITURE\s*MOV|PACK\s*-?\s*OUT";
const CONTENT_PROTECTION: &str = r"(?:BLOCK|PAD|PROTECT|COVER|MASK).*?(?:CONTENT|FURNITURE|APPLIANCE)";
const LABOR_MINIMUM: &str = r"(?:LABOR|LBR)\s*-?\s*MIN|MIN(?:IMUM)?\s*(?:CHARGE|LABOR|LBR)";
const SERVICE_CALL: &str = r"SERVICE\s*CALL|TRIP\s*CHARGE|MOBILIZATION|\bSETUP\b";

/// Trades with their own labor minimum, checked in order
const TRADES: [(&str, &str); 6] = [
    ("plumbing", r"PLUMB"),
    ("electrical", r"ELEC"),
    ("hvac", r"HVAC"),
    ("drywall", r"DRYWALL|WALLBOARD|SHEETROCK"),
    ("painting", r"PAINT"),
    ("flooring", r"FLOOR|CARPET|TILE|HARDWOOD|VINYL|LAMINATE"),
];

/// Built-in general repair rules in registration order
pub fn rules(policy: &AuditPolicy) -> Result<Vec<AuditRule>, AuditError> {
    let handling = Pattern::new(CONTENT_HANDLING)?;
    let protection = Pattern::new(CONTENT_PROTECTION)?;
    let labor_minimum = Pattern::new(LABOR_MINIMUM)?;
    let trades = TRADES
        .iter()
        .map(|(trade, source)| Ok((*trade, Pattern::new(source)?)))
        .collect::<Result<Vec<_>, AuditError>>()?;
    let service_call = Pattern::new(SERVICE_CALL)?;
    let coordination = policy.general_repair.clone();
    let overlap = policy.overlap.clone();

    Ok(vec![
        AuditRule::new(
            "GEN-001",
            "Double-Dip Detection",
            AuditCategory::Leakage,
            AuditSeverity::Warning,
            move |ctx: &RuleContext<'_>| {
                find_double_dips(ctx, ctx.classifier().pairs_for(AuditDomain::GeneralRepair), &overlap)
                    .iter()
                    .map(|m| m.to_draft(ctx.claim()))
                    .collect()
            },
        )?
        .with_description("Flag overlapping charges such as a pre-hung door billed with hinges"),
        AuditRule::new(
            "GEN-002",
            "Content Protection Check",
            AuditCategory::SupplementRisk,
            AuditSeverity::Info,
            move |ctx: &RuleContext<'_>| check_content_protection(ctx, &handling, &protection),
        )?
        .with_description("Flooring replacement usually needs contents moved or protected"),
        AuditRule::new(
            "GEN-003",
            "Labor Minimum Check",
            AuditCategory::Leakage,
            AuditSeverity::Warning,
            move |ctx: &RuleContext<'_>| check_labor_minimums(ctx, &labor_minimum, &trades),
        )?
        .with_description("Flag more than one labor minimum for the same trade"),
        AuditRule::new(
            "GEN-004",
            "Trade Coordination Check",
            AuditCategory::Leakage,
            AuditSeverity::Info,
            move |ctx: &RuleContext<'_>| check_trade_coordination(ctx, &service_call, &coordination),
        )?
        .with_description("Several service calls suggest trades that could share a visit"),
    ])
}

fn check_content_protection(
    ctx: &RuleContext<'_>,
    handling: &Pattern,
    protection: &Pattern,
) -> Result<Vec<FindingDraft>, RuleError> {
    let flooring_work: Vec<ClassifiedItem<'_>> = ctx
        .items()
        .filter(|e| e.class.is_flooring())
        .filter(|e| {
            e.class.has_operation(FlooringOperation::Install)
                || e.class.has_operation(FlooringOperation::TearOut)
        })
        .collect();
    if flooring_work.is_empty() {
        return Ok(Vec::new());
    }

    let protected = ctx.items().any(|e| {
        let (code, description) = (e.item.code(), e.item.description());
        e.class.has_category(TradeCategory::Contents)
            || handling.matches_item(code, description)
            || protection.matches_item(code, description)
    });
    if protected {
        return Ok(Vec::new());
    }

    let mut draft = FindingDraft::new(
        "Missing Content Protection for Flooring Work",
        "Flooring replacement is billed without content manipulation or protection; furniture may need to be moved",
    )
    .evidence("flooring_items", flooring_work.len())
    .recommendation("Verify whether contents must be moved or protected; this is a common supplement");
    for e in &flooring_work {
        draft = draft.item(e.index, e.item);
    }
    Ok(vec![draft])
}

fn check_labor_minimums(
    ctx: &RuleContext<'_>,
    labor_minimum: &Pattern,
    trades: &[(&'static str, Pattern)],
) -> Result<Vec<FindingDraft>, RuleError> {
    let currency = ctx.claim().currency();
    let mut by_trade: BTreeMap<&str, Vec<ClassifiedItem<'_>>> = BTreeMap::new();
    for entry in ctx.items() {
        let (code, description) = (entry.item.code(), entry.item.description());
        if !labor_minimum.matches_item(code, description) {
            continue;
        }
        let trade = trades
            .iter()
            .find(|(_, p)| p.matches_item(code, description))
            .map(|(trade, _)| *trade)
            .unwrap_or("general");
        by_trade.entry(trade).or_default().push(entry);
    }

    let mut drafts = Vec::new();
    for (trade, items) in by_trade {
        if items.len() < 2 {
            continue;
        }
        let total = sum_totals(currency, items.iter().map(|e| e.item))?;
        let largest = items
            .iter()
            .map(|e| e.item.total().amount())
            .max()
            .unwrap_or(Decimal::ZERO);
        let excess = (total.amount() - largest).round_dp(2);

        let mut draft = FindingDraft::new(
            format!("Multiple {trade} labor minimums"),
            format!(
                "{} labor minimum charges totaling {total} are billed for {trade}; one minimum per trade is typical",
                items.len()
            ),
        )
        .delta(excess)
        .evidence("trade", trade)
        .evidence("minimum_count", items.len())
        .evidence("total", total.round_to_currency().amount())
        .recommendation("Keep a single labor minimum per trade unless separate trips are documented");
        for e in &items {
            draft = draft.item(e.index, e.item);
        }
        drafts.push(draft);
    }
    Ok(drafts)
}

fn check_trade_coordination(
    ctx: &RuleContext<'_>,
    service_call: &Pattern,
    policy: &GeneralRepairPolicy,
) -> Result<Vec<FindingDraft>, RuleError> {
    let calls: Vec<ClassifiedItem<'_>> = ctx
        .items()
        .filter(|e| service_call.matches_item(e.item.code(), e.item.description()))
        .collect();
    if calls.len() <= policy.max_service_calls as usize {
        return Ok(Vec::new());
    }

    let total = sum_totals(ctx.claim().currency(), calls.iter().map(|e| e.item))?;
    let savings = total
        .amount()
        .checked_mul(policy.coordination_savings_pct)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .map(|v| v.round_dp(2))
        .ok_or(MoneyError::Overflow)?;
    let mut draft = FindingDraft::new(
        "Multiple Service Calls",
        format!(
            "{} service call or trip charges totaling {total} are billed; some trades may be able to coordinate visits",
            calls.len()
        ),
    )
    .delta(savings)
    .evidence("service_calls", calls.len())
    .evidence("total", total.round_to_currency().amount())
    .evidence("allowed", policy.max_service_calls)
    .recommendation("Review whether trades can combine visits to reduce service charges");
    for e in &calls {
        draft = draft.item(e.index, e.item);
    }
    Ok(vec![draft])
}
