//! Flooring validation (FLR)
//!
//! Waste allowances, carpet and pad tear-out overlap, preparation and
//! transitions for FCC (carpet) and FNC (natural and hard surface) scope.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

use core_kernel::{Money, MoneyError};
use crate::classifier::{FlooringMaterial, FlooringOperation, Pattern};
use crate::error::{AuditError, RuleError};
use crate::finding::FindingDraft;
use crate::overlap::find_double_dips;
use crate::policy::{AuditPolicy, FlooringPolicy};
use crate::rule::{AuditRule, ClassifiedItem, RuleContext};
use crate::taxonomy::{AuditCategory, AuditDomain, AuditSeverity};
use super::{plain, sum_totals};

const TRANSITION: &str = r"TRANSITION|THRESHOLD|REDUCER|T-?MOLD";

/// Built-in flooring rules in registration order
pub fn rules(policy: &AuditPolicy) -> Result<Vec<AuditRule>, AuditError> {
    let waste_policy = policy.flooring.clone();
    let prep_policy = policy.flooring.clone();
    let overlap = policy.overlap.clone();
    let transition = Pattern::new(TRANSITION)?;

    Ok(vec![
        AuditRule::new(
            "FLR-001",
            "Flooring Waste Audit",
            AuditCategory::Leakage,
            AuditSeverity::Warning,
            move |ctx: &RuleContext<'_>| check_waste(ctx, &waste_policy),
        )?
        .with_description("Flag waste above the allowance for the material"),
        AuditRule::new(
            "FLR-002",
            "Carpet/Pad Tear-Out Overlap",
            AuditCategory::Leakage,
            AuditSeverity::Warning,
            move |ctx: &RuleContext<'_>| {
                find_double_dips(ctx, ctx.classifier().pairs_for(AuditDomain::Flooring), &overlap)
                    .iter()
                    .map(|m| m.to_draft(ctx.claim()))
                    .collect()
            },
        )?
        .with_description("Flag pad tear-out billed separately from carpet tear-out in the same room"),
        AuditRule::new(
            "FLR-003",
            "Floor Preparation Check",
            AuditCategory::SupplementRisk,
            AuditSeverity::Info,
            move |ctx: &RuleContext<'_>| check_preparation(ctx, &prep_policy),
        )?
        .with_description("Hard surface installs without leveling or preparation often return as supplements"),
        AuditRule::new(
            "FLR-004",
            "Transition Strip Check",
            AuditCategory::SupplementRisk,
            AuditSeverity::Info,
            move |ctx: &RuleContext<'_>| check_transitions(ctx, &transition),
        )?
        .with_description("Flooring installed across rooms or materials without transition strips"),
    ])
}

/// Material an item is billed as; carpet wins over pad for combined lines
fn primary_material(entry: &ClassifiedItem<'_>) -> Option<FlooringMaterial> {
    if !entry.class.is_flooring() {
        return None;
    }
    entry.class.materials.iter().next().copied()
}

fn is_install(entry: &ClassifiedItem<'_>) -> bool {
    entry.class.has_operation(FlooringOperation::Install)
        && !entry.class.has_operation(FlooringOperation::Waste)
        && !entry.class.has_operation(FlooringOperation::TearOut)
}

fn check_waste(ctx: &RuleContext<'_>, policy: &FlooringPolicy) -> Result<Vec<FindingDraft>, RuleError> {
    let currency = ctx.claim().currency();
    let mut groups: BTreeMap<FlooringMaterial, (Vec<ClassifiedItem<'_>>, Vec<ClassifiedItem<'_>>)> = BTreeMap::new();
    for entry in ctx.items() {
        let Some(material) = primary_material(&entry) else {
            continue;
        };
        if entry.class.has_operation(FlooringOperation::Waste) {
            groups.entry(material).or_default().1.push(entry);
        } else if is_install(&entry) {
            groups.entry(material).or_default().0.push(entry);
        }
    }

    let mut drafts = Vec::new();
    for (material, (installed, waste)) in groups {
        let Some(allowance) = policy.waste_allowance(material) else {
            continue;
        };
        if installed.is_empty() || waste.is_empty() {
            continue;
        }
        let material_cost = sum_totals(currency, installed.iter().map(|e| e.item))?;
        let waste_cost = sum_totals(currency, waste.iter().map(|e| e.item))?;
        if !material_cost.is_positive() {
            continue;
        }
        let waste_pct = waste_cost.percentage_of(&material_cost)?.round_dp(1);
        if waste_pct <= allowance {
            continue;
        }

        let allowed = material_cost
            .amount()
            .checked_mul(allowance)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .map(|v| Money::new(v, currency))
            .ok_or(MoneyError::Overflow)?;
        let excess = waste_cost.checked_sub(&allowed)?.round_to_currency();
        let label = material.label();
        let mut draft = FindingDraft::new(
            format!("Excessive {} Waste", capitalize(label)),
            format!(
                "{} waste is {}% of material cost, above the {}% allowance for simple room profiles",
                capitalize(label),
                plain(waste_pct),
                plain(allowance)
            ),
        )
        .delta(excess.amount())
        .evidence("material", label)
        .evidence("material_cost", material_cost.round_to_currency().amount())
        .evidence("waste_cost", waste_cost.round_to_currency().amount())
        .evidence("waste_pct", plain(waste_pct))
        .evidence("allowance_pct", plain(allowance))
        .recommendation("Review room layout; irregular rooms, stairs or pattern matching can justify more waste");
        let mut involved: Vec<&ClassifiedItem<'_>> = installed.iter().chain(&waste).collect();
        involved.sort_by_key(|e| e.index);
        for e in involved {
            draft = draft.item(e.index, e.item);
        }
        drafts.push(draft);
    }
    Ok(drafts)
}

fn check_preparation(ctx: &RuleContext<'_>, policy: &FlooringPolicy) -> Result<Vec<FindingDraft>, RuleError> {
    let has_prep = ctx
        .classifications()
        .iter()
        .any(|c| c.has_operation(FlooringOperation::Leveling));
    if has_prep {
        return Ok(Vec::new());
    }

    let mut drafts = Vec::new();
    for material in &policy.prep_materials {
        let installs: Vec<ClassifiedItem<'_>> = ctx
            .items()
            .filter(|e| is_install(e) && primary_material(e) == Some(*material))
            .collect();
        if installs.is_empty() {
            continue;
        }
        let label = material.label();
        let mut draft = FindingDraft::new(
            format!("Missing Floor Prep for {}", capitalize(label)),
            format!(
                "{} installation is billed without leveling or floor preparation; subfloor work is a common supplement",
                capitalize(label)
            ),
        )
        .evidence("material", label)
        .evidence("install_items", installs.len())
        .recommendation("Verify subfloor condition and include preparation if needed");
        for e in &installs {
            draft = draft.item(e.index, e.item);
        }
        drafts.push(draft);
    }
    Ok(drafts)
}

fn check_transitions(ctx: &RuleContext<'_>, transition: &Pattern) -> Result<Vec<FindingDraft>, RuleError> {
    let has_transition = ctx
        .claim()
        .line_items()
        .iter()
        .any(|item| transition.matches_item(item.code(), item.description()));
    if has_transition {
        return Ok(Vec::new());
    }

    let installs: Vec<ClassifiedItem<'_>> = ctx
        .items()
        .filter(|e| is_install(e) && e.class.is_flooring())
        .collect();
    let rooms: BTreeSet<&str> = installs.iter().filter_map(|e| e.scope.room()).collect();
    let materials: BTreeSet<FlooringMaterial> = installs
        .iter()
        .filter_map(primary_material)
        .filter(|m| *m != FlooringMaterial::Pad)
        .collect();
    if rooms.len() < 2 && materials.len() < 2 {
        return Ok(Vec::new());
    }

    let mut draft = FindingDraft::new(
        "Missing Transition Strips",
        format!(
            "Flooring is installed in {} rooms with {} materials but no transition strips are billed",
            rooms.len(),
            materials.len()
        ),
    )
    .evidence("rooms", rooms.iter().copied().collect::<Vec<_>>().join(", "))
    .evidence(
        "materials",
        materials.iter().map(|m| m.label()).collect::<Vec<_>>().join(", "),
    )
    .recommendation("Verify whether transitions are needed between rooms or flooring types");
    for e in &installs {
        draft = draft.item(e.index, e.item);
    }
    Ok(vec![draft])
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
