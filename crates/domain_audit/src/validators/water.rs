//! Water remediation validation (WTR)
//!
//! Drying equipment against room area, monitoring labor against equipment
//! rental days, and category-specific billing.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use core_kernel::MoneyError;
use domain_claims::WaterCategory;
use crate::classifier::{EquipmentKind, Pattern, TradeCategory};
use crate::error::{AuditError, RuleError};
use crate::finding::FindingDraft;
use crate::overlap::{assess_equipment, EquipmentAssessment, ItemScope};
use crate::policy::{AuditPolicy, EquipmentPolicy, WaterPolicy};
use crate::rule::{AuditRule, ClassifiedItem, RuleContext};
use crate::taxonomy::{AuditCategory, AuditSeverity};
use super::{plain, sum_totals};

const MONITORING: &str = r"MONITOR|MOISTURE\s*(?:READ|MAP|CHECK)";
const CATEGORY_3_ONLY: &str =
    r"\bPPE\b|HAZMAT|TYVEK|RESPIRATOR|BIOHAZ|SEWAGE|ANTI-?MICROBIAL|DISINFECT|SANITIZ|BIOCIDE";

/// Built-in water remediation rules in registration order
pub fn rules(policy: &AuditPolicy) -> Result<Vec<AuditRule>, AuditError> {
    let shortfall_policy = policy.equipment.clone();
    let ratio_policy = policy.equipment.clone();
    let monitoring_policy = policy.water.clone();
    let days_policy = policy.water.clone();
    let monitoring = Pattern::new(MONITORING)?;
    let category_3 = Pattern::new(CATEGORY_3_ONLY)?;

    Ok(vec![
        AuditRule::new(
            "WTR-001",
            "Drying Coverage Shortfall",
            AuditCategory::SupplementRisk,
            AuditSeverity::Info,
            move |ctx: &RuleContext<'_>| check_shortfall(ctx, &shortfall_policy),
        )?
        .with_description("Flag drying equipment well below what the affected area requires"),
        AuditRule::new(
            "WTR-002",
            "Water Category Documentation",
            AuditCategory::SupplementRisk,
            AuditSeverity::Info,
            check_category_documented,
        )?
        .with_description("Water mitigation billed without a documented water category"),
        AuditRule::new(
            "WTR-003",
            "Monitoring Labor Audit",
            AuditCategory::Leakage,
            AuditSeverity::Error,
            move |ctx: &RuleContext<'_>| check_monitoring(ctx, &monitoring, &monitoring_policy),
        )?
        .also_emits(AuditCategory::Leakage, AuditSeverity::Warning)
        .with_description("Flag monitoring labor billed without, or beyond, drying equipment days"),
        AuditRule::new(
            "WTR-004",
            "Water Category Mismatch",
            AuditCategory::Leakage,
            AuditSeverity::Error,
            move |ctx: &RuleContext<'_>| check_category_billing(ctx, &category_3),
        )?
        .with_description("Flag Category 3 PPE and cleaning billed on a Category 1 loss"),
        AuditRule::new(
            "WTR-005",
            "Equipment Days Consistency",
            AuditCategory::Leakage,
            AuditSeverity::Info,
            move |ctx: &RuleContext<'_>| check_equipment_days(ctx, &days_policy),
        )?
        .with_description("Drying equipment in one room should run for the same number of days"),
        AuditRule::new(
            "WTR-006",
            "Equipment-to-Area Ratio",
            AuditCategory::Leakage,
            AuditSeverity::Warning,
            move |ctx: &RuleContext<'_>| check_equipment_ratio(ctx, &ratio_policy),
        )?
        .also_emits(AuditCategory::Leakage, AuditSeverity::Critical)
        .with_description("Compare billed drying equipment with per-room requirements by water category"),
    ])
}

fn describe_scope(assessment: &EquipmentAssessment) -> String {
    match &assessment.scope {
        ItemScope::Room(name) => format!("{name} ({} sqft)", plain(assessment.sqft)),
        ItemScope::Unscoped => format!("rooms without room-level billing ({} sqft)", plain(assessment.sqft)),
    }
}

fn ratio_text(assessment: &EquipmentAssessment) -> String {
    match assessment.sqft_per_unit {
        Some(per_unit) => format!("1 per {} sqft", plain(per_unit)),
        None => "none required for this water category".to_string(),
    }
}

fn assessment_evidence(draft: FindingDraft, a: &EquipmentAssessment, category: Option<WaterCategory>) -> FindingDraft {
    let draft = draft
        .evidence("equipment", a.kind.label())
        .evidence("scope", &a.scope)
        .evidence("affected_sqft", plain(a.sqft))
        .evidence("billed", plain(a.billed))
        .evidence("required", plain(a.required))
        .evidence(
            "water_category",
            category.map(|c| c.level().to_string()).unwrap_or_else(|| "undocumented".into()),
        );
    match a.sqft_per_unit {
        Some(per_unit) => draft.evidence("sqft_per_unit", plain(per_unit)),
        None => draft,
    }
}

fn with_items(mut draft: FindingDraft, ctx: &RuleContext<'_>, indices: &[usize]) -> FindingDraft {
    let items = ctx.claim().line_items();
    for &index in indices {
        if let Some(item) = items.get(index) {
            draft = draft.item(index, item);
        }
    }
    draft
}

fn check_shortfall(ctx: &RuleContext<'_>, policy: &EquipmentPolicy) -> Result<Vec<FindingDraft>, RuleError> {
    let claim = ctx.claim();
    let category = claim.property().water_category();
    let assessments = assess_equipment(ctx, policy)?;

    if assessments.is_empty() {
        let water_items = ctx
            .classifications()
            .iter()
            .any(|c| c.has_any_category(&[TradeCategory::Water, TradeCategory::Drying]));
        let affected = claim.property().total_affected_sqft();
        if water_items && affected > Decimal::ZERO {
            return Ok(vec![FindingDraft::new(
                "No Drying Equipment Billed",
                format!(
                    "Water mitigation is billed for {} sqft of affected area but no air movers or dehumidifiers are on the estimate",
                    plain(affected)
                ),
            )
            .evidence("affected_sqft", plain(affected))
            .recommendation("Confirm whether drying equipment was used; it is usually added by supplement")]);
        }
        return Ok(Vec::new());
    }

    Ok(assessments
        .iter()
        .filter(|a| a.is_shortfall(policy.shortfall_ratio))
        .map(|a| {
            let draft = FindingDraft::new(
                format!("Low {} Count", a.kind.label()),
                format!(
                    "{} {} units billed for {} where {} are required at {}",
                    plain(a.billed),
                    a.kind.label(),
                    describe_scope(a),
                    plain(a.required),
                    ratio_text(a),
                ),
            )
            .recommendation("Verify drying coverage is adequate for the affected area");
            with_items(assessment_evidence(draft, a, category), ctx, &a.items)
        })
        .collect())
}

fn check_category_documented(ctx: &RuleContext<'_>) -> Result<Vec<FindingDraft>, RuleError> {
    if ctx.claim().property().water_category().is_some() {
        return Ok(Vec::new());
    }
    let water: Vec<ClassifiedItem<'_>> = ctx
        .items()
        .filter(|e| e.class.has_any_category(&[TradeCategory::Water, TradeCategory::Drying]))
        .collect();
    if water.is_empty() {
        return Ok(Vec::new());
    }

    let draft = FindingDraft::new(
        "Water Category Not Documented",
        format!(
            "{} water mitigation line items are billed but the loss has no documented water category",
            water.len()
        ),
    )
    .evidence("water_items", water.len())
    .recommendation("Document the water category; Category 2 or 3 scope is often added later");
    let indices: Vec<usize> = water.iter().map(|e| e.index).collect();
    Ok(vec![with_items(draft, ctx, &indices)])
}

fn check_monitoring(
    ctx: &RuleContext<'_>,
    monitoring: &Pattern,
    policy: &WaterPolicy,
) -> Result<Vec<FindingDraft>, RuleError> {
    let claim = ctx.claim();
    let monitor: Vec<ClassifiedItem<'_>> = ctx
        .items()
        .filter(|e| !e.class.is_equipment())
        .filter(|e| monitoring.matches_item(e.item.code(), e.item.description()))
        .collect();
    if monitor.is_empty() {
        return Ok(Vec::new());
    }

    let monitoring_days: Decimal = monitor.iter().map(|e| e.item.quantity()).sum();
    let monitoring_total = sum_totals(claim.currency(), monitor.iter().map(|e| e.item))?;
    let indices: Vec<usize> = monitor.iter().map(|e| e.index).collect();
    let equipment: Vec<ClassifiedItem<'_>> = ctx.items().filter(|e| e.class.is_equipment()).collect();

    if equipment.is_empty() {
        let draft = FindingDraft::new(
            "Monitoring Without Equipment",
            format!(
                "Monitoring labor is billed for {} days but no drying equipment is on the claim",
                plain(monitoring_days)
            ),
        )
        .severity(AuditSeverity::Error)
        .delta(monitoring_total.round_to_currency().amount())
        .evidence("monitoring_days", plain(monitoring_days))
        .evidence("equipment_days", 0)
        .recommendation("Document the drying equipment or remove the monitoring charges");
        return Ok(vec![with_items(draft, ctx, &indices)]);
    }

    let Some(equipment_days) = equipment.iter().filter_map(|e| e.item.days()).max() else {
        return Ok(Vec::new());
    };
    let allowed = Decimal::from(equipment_days) + Decimal::from(policy.monitoring_day_tolerance);
    if monitoring_days <= allowed {
        return Ok(Vec::new());
    }

    let excess_days = monitoring_days - Decimal::from(equipment_days);
    let excess_cost = monitoring_total
        .amount()
        .checked_div(monitoring_days)
        .and_then(|daily_rate| daily_rate.checked_mul(excess_days))
        .map(|cost| cost.round_dp(2))
        .ok_or(MoneyError::Overflow)?;
    let draft = FindingDraft::new(
        "Excess Monitoring Days",
        format!(
            "Monitoring labor ({} days) exceeds the longest equipment rental ({equipment_days} days)",
            plain(monitoring_days)
        ),
    )
    .severity(AuditSeverity::Warning)
    .delta(excess_cost)
    .evidence("monitoring_days", plain(monitoring_days))
    .evidence("equipment_days", equipment_days)
    .evidence("excess_days", plain(excess_days))
    .recommendation("Align monitoring days with the active drying period");
    Ok(vec![with_items(draft, ctx, &indices)])
}

fn check_category_billing(ctx: &RuleContext<'_>, category_3: &Pattern) -> Result<Vec<FindingDraft>, RuleError> {
    let claim = ctx.claim();
    if claim.property().water_category() != Some(WaterCategory::Clean) {
        return Ok(Vec::new());
    }
    let flagged: Vec<ClassifiedItem<'_>> = ctx
        .items()
        .filter(|e| category_3.matches_item(e.item.code(), e.item.description()))
        .collect();
    if flagged.is_empty() {
        return Ok(Vec::new());
    }

    let total = sum_totals(claim.currency(), flagged.iter().map(|e| e.item))?;
    let draft = FindingDraft::new(
        "Category 3 Items Billed for Category 1 Loss",
        format!(
            "Loss is documented as Category 1 (clean water) but {} Category 3 PPE or cleaning items totaling {total} are billed",
            flagged.len()
        ),
    )
    .delta(total.round_to_currency().amount())
    .evidence("documented_category", WaterCategory::Clean.level())
    .evidence("flagged_items", flagged.len())
    .recommendation("Verify the water category or remove the Category 3 charges");
    let indices: Vec<usize> = flagged.iter().map(|e| e.index).collect();
    Ok(vec![with_items(draft, ctx, &indices)])
}

fn check_equipment_days(ctx: &RuleContext<'_>, policy: &WaterPolicy) -> Result<Vec<FindingDraft>, RuleError> {
    let mut by_scope: BTreeMap<&ItemScope, BTreeMap<EquipmentKind, (u32, Vec<usize>)>> = BTreeMap::new();
    for entry in ctx.items() {
        let (Some(kind), Some(days)) = (entry.class.equipment, entry.item.days()) else {
            continue;
        };
        let slot = by_scope.entry(entry.scope).or_default().entry(kind).or_default();
        slot.0 = slot.0.max(days);
        slot.1.push(entry.index);
    }

    let mut drafts = Vec::new();
    for (scope, kinds) in by_scope {
        if kinds.len() < 2 {
            continue;
        }
        let longest = kinds.values().map(|(d, _)| *d).max().unwrap_or(0);
        let shortest = kinds.values().map(|(d, _)| *d).min().unwrap_or(0);
        let spread = longest - shortest;
        if spread <= policy.equipment_day_tolerance {
            continue;
        }

        let mut draft = FindingDraft::new(
            "Inconsistent Equipment Days",
            format!("Drying equipment days in {scope} vary by {spread} days across equipment types"),
        )
        .evidence("scope", scope)
        .evidence("spread_days", spread)
        .recommendation("Verify rental days for each equipment type");
        let mut indices = Vec::new();
        for (kind, (days, items)) in &kinds {
            draft = draft.evidence(format!("{}_days", kind.label().to_lowercase().replace(' ', "_")), days);
            indices.extend(items.iter().copied());
        }
        indices.sort_unstable();
        drafts.push(with_items(draft, ctx, &indices));
    }
    Ok(drafts)
}

fn check_equipment_ratio(ctx: &RuleContext<'_>, policy: &EquipmentPolicy) -> Result<Vec<FindingDraft>, RuleError> {
    let category = ctx.claim().property().water_category();
    let assessments = assess_equipment(ctx, policy)?;

    assessments
        .iter()
        .filter_map(|a| a.overage(policy.critical_multiplier).map(|severity| (a, severity)))
        .map(|(a, severity)| -> Result<FindingDraft, RuleError> {
            let title = match severity {
                AuditSeverity::Critical => format!("Excessive {} Count", a.kind.label()),
                _ => format!("{} Count Above Requirement", a.kind.label()),
            };
            let draft = FindingDraft::new(
                title,
                format!(
                    "{} {} units billed for {} where {} are required at {}",
                    plain(a.billed),
                    a.kind.label(),
                    describe_scope(a),
                    plain(a.required),
                    ratio_text(a),
                ),
            )
            .severity(severity)
            .delta(a.excess_cost()?)
            .evidence("excess_units", plain(a.excess_units()))
            .recommendation("Reduce billed equipment to the room-level requirement or document the need");
            Ok(with_items(assessment_evidence(draft, a, category), ctx, &a.items))
        })
        .collect()
}
