//! Relationship checks between line items
//!
//! # Room Scoping
//!
//! Each line item resolves to a scope, first match wins:
//!
//! ```text
//! 1. explicit room reference          -> Room(canonical name)
//! 2. exactly one room named in text   -> Room(name)
//! 3. claim lists a single room        -> Room(that room)
//! 4. otherwise                        -> Unscoped
//! ```
//!
//! # Double-Dip Detection
//!
//! Items matching each side of a pattern pair are grouped by scope.
//! Room-scoped pairs overlap inside one room. With
//! `unscoped_matches_any_room` an Unscoped item also joins every room
//! where the opposite side is billed, and Unscoped items left over pair
//! only with each other. Claim-scoped pairs overlap anywhere. One match
//! is produced per (pair, scope) with both sides present.
//!
//! # Equipment-to-Area
//!
//! Required units are computed per room as `ceil(sqft / sqft_per_unit)`
//! and compared with the units billed to that room. Unscoped equipment is
//! pooled against the affected rooms that carry no scoped billing of the
//! same kind; their requirements are summed room by room.

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use core_kernel::{Currency, Money, MoneyError};
use domain_claims::{ClaimData, LineItem};
use crate::classifier::{DoubleDipPair, EquipmentKind, PairScope, PairSideKind};
use crate::error::RuleError;
use crate::finding::FindingDraft;
use crate::policy::{EquipmentPolicy, OverlapPolicy};
use crate::rule::RuleContext;
use crate::taxonomy::{AuditCategory, AuditSeverity};

/// Where a line item's work is performed
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemScope {
    Room(String),
    Unscoped,
}

impl ItemScope {
    pub fn room(&self) -> Option<&str> {
        match self {
            ItemScope::Room(name) => Some(name),
            ItemScope::Unscoped => None,
        }
    }
}

impl fmt::Display for ItemScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemScope::Room(name) => f.write_str(name),
            ItemScope::Unscoped => f.write_str("unscoped"),
        }
    }
}

/// Resolves the scope of every line item, by position
pub fn resolve_scopes(claim: &ClaimData) -> Vec<ItemScope> {
    let rooms = claim.property().rooms();
    let matchers: Vec<(&str, Regex)> = rooms
        .iter()
        .filter_map(|room| {
            Regex::new(&format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(room.name())))
                .ok()
                .map(|re| (room.name(), re))
        })
        .collect();

    claim
        .line_items()
        .iter()
        .map(|item| {
            if let Some(reference) = item.room() {
                let name = claim
                    .property()
                    .room(reference)
                    .map(|room| room.name().to_string())
                    .unwrap_or_else(|| reference.to_string());
                return ItemScope::Room(name);
            }

            let named: Vec<&str> = matchers
                .iter()
                .filter(|(_, re)| re.is_match(item.description()))
                .map(|(name, _)| *name)
                .collect();
            let specific: Vec<&str> = named
                .iter()
                .copied()
                .filter(|name| {
                    let lower = name.to_lowercase();
                    !named.iter().any(|other| {
                        other.len() > name.len() && other.to_lowercase().contains(&lower)
                    })
                })
                .collect();

            match (specific.as_slice(), rooms) {
                ([only], _) => ItemScope::Room((*only).to_string()),
                ([], [single]) => ItemScope::Room(single.name().to_string()),
                _ => ItemScope::Unscoped,
            }
        })
        .collect()
}

/// Both sides of a double-dip pair billed in one scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubleDipMatch {
    pub pair_id: String,
    pub label: String,
    pub recommendation: String,
    pub redundant: PairSideKind,
    /// `None` for claim-wide pairs
    pub scope: Option<ItemScope>,
    pub first: Vec<usize>,
    pub second: Vec<usize>,
}

impl DoubleDipMatch {
    /// Item positions on the redundant side
    pub fn redundant_items(&self) -> &[usize] {
        match self.redundant {
            PairSideKind::First => &self.first,
            PairSideKind::Second => &self.second,
        }
    }

    /// All involved item positions, ascending
    pub fn all_items(&self) -> Vec<usize> {
        let mut items: Vec<usize> = self.first.iter().chain(&self.second).copied().collect();
        items.sort_unstable();
        items
    }

    /// One LEAKAGE WARNING draft naming every involved item
    pub fn to_draft(&self, claim: &ClaimData) -> Result<FindingDraft, RuleError> {
        let items = claim.line_items();
        let exposure = total_of(claim, &self.all_items())?;
        let redundant = total_of(claim, self.redundant_items())?;
        let place = match &self.scope {
            Some(ItemScope::Room(name)) => format!(" in {name}"),
            Some(ItemScope::Unscoped) => " without a room reference".to_string(),
            None => String::new(),
        };

        let mut draft = FindingDraft::new(
            format!("Potential Overlap: {}", self.label),
            format!(
                "{}{place}: {} line items totaling {exposure} overlap; {redundant} is likely already included",
                self.label,
                self.first.len() + self.second.len(),
            ),
        )
        .category(AuditCategory::Leakage)
        .severity(AuditSeverity::Warning)
        .delta(exposure.round_to_currency().amount())
        .evidence("pair", &self.pair_id)
        .evidence("redundant_amount", redundant.round_to_currency().amount())
        .recommendation(self.recommendation.clone());
        if let Some(scope) = &self.scope {
            draft = draft.evidence("scope", scope);
        }
        for index in self.all_items() {
            if let Some(item) = items.get(index) {
                draft = draft.item(index, item);
            }
        }
        Ok(draft)
    }
}

/// Finds every (pair, scope) where both sides of a pair are billed
pub fn find_double_dips<'p, I>(
    ctx: &RuleContext<'_>,
    pairs: I,
    policy: &OverlapPolicy,
) -> Vec<DoubleDipMatch>
where
    I: IntoIterator<Item = &'p DoubleDipPair>,
{
    let mut matches = Vec::new();

    for pair in pairs {
        let mut groups: BTreeMap<Option<ItemScope>, (Vec<usize>, Vec<usize>)> = BTreeMap::new();
        for entry in ctx.items() {
            let Some(side) = pair.side_of(entry.item.code(), entry.item.description()) else {
                continue;
            };
            let key = match pair.scope {
                PairScope::Room => Some(entry.scope.clone()),
                PairScope::Claim => None,
            };
            let group = groups.entry(key).or_default();
            match side {
                PairSideKind::First => group.0.push(entry.index),
                PairSideKind::Second => group.1.push(entry.index),
            }
        }

        if policy.unscoped_matches_any_room && pair.scope == PairScope::Room {
            spread_unscoped(&mut groups);
        }

        for (scope, (first, second)) in groups {
            if first.is_empty() || second.is_empty() {
                continue;
            }
            matches.push(DoubleDipMatch {
                pair_id: pair.id.clone(),
                label: pair.label.clone(),
                recommendation: pair.recommendation.clone(),
                redundant: pair.redundant,
                scope,
                first,
                second,
            });
        }
    }

    matches
}

/// Joins Unscoped items to every room group billing the opposite side
///
/// Items joined to at least one room leave the Unscoped group.
fn spread_unscoped(groups: &mut BTreeMap<Option<ItemScope>, (Vec<usize>, Vec<usize>)>) {
    let Some((loose_first, loose_second)) = groups.remove(&Some(ItemScope::Unscoped)) else {
        return;
    };
    let mut first_joined = false;
    let mut second_joined = false;

    for (first, second) in groups.values_mut() {
        let has_first = !first.is_empty();
        let has_second = !second.is_empty();
        if has_second && !loose_first.is_empty() {
            first.extend(&loose_first);
            first.sort_unstable();
            first_joined = true;
        }
        if has_first && !loose_second.is_empty() {
            second.extend(&loose_second);
            second.sort_unstable();
            second_joined = true;
        }
    }

    let rest = (
        if first_joined { Vec::new() } else { loose_first },
        if second_joined { Vec::new() } else { loose_second },
    );
    if !rest.0.is_empty() || !rest.1.is_empty() {
        groups.insert(Some(ItemScope::Unscoped), rest);
    }
}

/// Billed versus required units of one equipment kind in one scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentAssessment {
    pub kind: EquipmentKind,
    /// Room, or `Unscoped` for the pool of rooms without scoped billing
    pub scope: ItemScope,
    /// Affected area compared against
    pub sqft: Decimal,
    pub sqft_per_unit: Option<Decimal>,
    pub required: Decimal,
    pub billed: Decimal,
    pub billed_total: Money,
    pub items: Vec<usize>,
}

impl EquipmentAssessment {
    /// Severity of an overage, if any
    ///
    /// CRITICAL above `required x multiplier`, WARNING for any smaller
    /// overage, including equipment with no area to serve.
    pub fn overage(&self, multiplier: Decimal) -> Option<AuditSeverity> {
        if self.billed <= self.required {
            None
        } else if self.required > Decimal::ZERO && self.billed > self.required * multiplier {
            Some(AuditSeverity::Critical)
        } else {
            Some(AuditSeverity::Warning)
        }
    }

    pub fn is_shortfall(&self, ratio: Decimal) -> bool {
        self.required > Decimal::ZERO && self.billed < self.required * ratio
    }

    pub fn excess_units(&self) -> Decimal {
        (self.billed - self.required).max(Decimal::ZERO)
    }

    /// Cost of the excess units at the average billed unit cost
    pub fn excess_cost(&self) -> Result<Decimal, MoneyError> {
        if self.billed.is_zero() {
            return Ok(Decimal::ZERO);
        }
        self.billed_total
            .amount()
            .checked_div(self.billed)
            .and_then(|unit_cost| unit_cost.checked_mul(self.excess_units()))
            .map(|cost| cost.round_dp(2))
            .ok_or(MoneyError::Overflow)
    }
}

/// Compares billed drying equipment with room-level requirements
///
/// Only kinds billed somewhere on the claim are assessed. Claims without
/// rooms yield nothing.
pub fn assess_equipment(
    ctx: &RuleContext<'_>,
    policy: &EquipmentPolicy,
) -> Result<Vec<EquipmentAssessment>, RuleError> {
    let claim = ctx.claim();
    let property = claim.property();
    if property.rooms().is_empty() {
        return Ok(Vec::new());
    }
    let ratios = policy.ratios_for(property.water_category());
    let currency = claim.currency();
    let mut assessments = Vec::new();

    for kind in EquipmentKind::ALL {
        let billed: Vec<_> = ctx
            .items()
            .filter(|entry| entry.class.equipment == Some(kind))
            .collect();
        if billed.is_empty() {
            continue;
        }
        let sqft_per_unit = ratios.sqft_per_unit(kind);

        let mut by_room: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        let mut unscoped = Vec::new();
        for entry in &billed {
            match entry.scope.room() {
                Some(room) => by_room.entry(room).or_default().push(entry.index),
                None => unscoped.push(entry.index),
            }
        }

        for (room_name, items) in &by_room {
            let sqft = property
                .room(room_name)
                .filter(|room| room.is_affected())
                .map(|room| room.sqft())
                .unwrap_or(Decimal::ZERO);
            assessments.push(assessment(
                kind,
                ItemScope::Room((*room_name).to_string()),
                sqft,
                units_required(sqft, sqft_per_unit),
                sqft_per_unit,
                items.clone(),
                claim.line_items(),
                currency,
            )?);
        }

        let pooled: Vec<_> = property
            .affected_rooms()
            .filter(|room| !by_room.keys().any(|name| room.is_named(name)))
            .collect();
        if !unscoped.is_empty() || !pooled.is_empty() {
            let sqft: Decimal = pooled.iter().map(|room| room.sqft()).sum();
            let required: Decimal = pooled
                .iter()
                .map(|room| units_required(room.sqft(), sqft_per_unit))
                .sum();
            assessments.push(assessment(
                kind,
                ItemScope::Unscoped,
                sqft,
                required,
                sqft_per_unit,
                unscoped,
                claim.line_items(),
                currency,
            )?);
        }
    }

    Ok(assessments)
}

fn units_required(sqft: Decimal, sqft_per_unit: Option<Decimal>) -> Decimal {
    match sqft_per_unit {
        Some(per_unit) if per_unit > Decimal::ZERO && sqft > Decimal::ZERO => {
            (sqft / per_unit).ceil()
        }
        _ => Decimal::ZERO,
    }
}

#[allow(clippy::too_many_arguments)]
fn assessment(
    kind: EquipmentKind,
    scope: ItemScope,
    sqft: Decimal,
    required: Decimal,
    sqft_per_unit: Option<Decimal>,
    items: Vec<usize>,
    line_items: &[LineItem],
    currency: Currency,
) -> Result<EquipmentAssessment, RuleError> {
    let billed = items.iter().map(|&i| line_items[i].quantity()).sum();
    let totals: Vec<Money> = items.iter().map(|&i| line_items[i].total()).collect();
    Ok(EquipmentAssessment {
        kind,
        scope,
        sqft,
        sqft_per_unit,
        required,
        billed,
        billed_total: Money::sum(&totals, currency)?,
        items,
    })
}

fn total_of(claim: &ClaimData, indices: &[usize]) -> Result<Money, RuleError> {
    let totals: Vec<Money> = indices
        .iter()
        .filter_map(|&i| claim.line_items().get(i))
        .map(|item| item.total())
        .collect();
    Ok(Money::sum(&totals, claim.currency())?)
}
