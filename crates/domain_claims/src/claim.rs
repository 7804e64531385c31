//! Claim aggregate consumed by the audit engine

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use core_kernel::{ClaimId, Currency, Money};
use crate::error::InputShapeError;
use crate::line_item::{LineItem, MAX_AMOUNT};
use crate::property::PropertyDetails;

/// Coverage limits and deductible of the policy the claim is filed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyLimits {
    currency: Currency,
    deductible: Money,
    /// Coverage A: dwelling
    coverage_a: Money,
    /// Coverage B: other structures
    coverage_b: Money,
    /// Coverage C: personal property
    coverage_c: Money,
    /// Peril or trade keyed caps nested within the coverages (keys lowercase)
    sub_limits: BTreeMap<String, Money>,
}

impl PolicyLimits {
    /// Creates policy limits; all amounts must be non-negative and share a currency
    pub fn new(
        deductible: Money,
        coverage_a: Money,
        coverage_b: Money,
        coverage_c: Money,
    ) -> Result<Self, InputShapeError> {
        let currency = deductible.currency();
        for (field, amount) in [
            ("deductible", deductible),
            ("coverage_a", coverage_a),
            ("coverage_b", coverage_b),
            ("coverage_c", coverage_c),
        ] {
            check_amount(field, &amount, currency)?;
        }

        Ok(Self {
            currency,
            deductible,
            coverage_a,
            coverage_b,
            coverage_c,
            sub_limits: BTreeMap::new(),
        })
    }

    /// Adds a sub-limit cap under a peril or category key (`water`, `mold`, ...)
    pub fn with_sub_limit(
        mut self,
        key: impl AsRef<str>,
        cap: Money,
    ) -> Result<Self, InputShapeError> {
        let key = key.as_ref().trim().to_lowercase();
        if key.is_empty() {
            return Err(InputShapeError::missing("sub-limit key"));
        }
        check_amount(&format!("sub_limits.{key}"), &cap, self.currency)?;
        self.sub_limits.insert(key, cap);
        Ok(self)
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn deductible(&self) -> Money {
        self.deductible
    }

    pub fn coverage_a(&self) -> Money {
        self.coverage_a
    }

    pub fn coverage_b(&self) -> Money {
        self.coverage_b
    }

    pub fn coverage_c(&self) -> Money {
        self.coverage_c
    }

    pub fn sub_limits(&self) -> &BTreeMap<String, Money> {
        &self.sub_limits
    }

    pub fn sub_limit(&self, key: &str) -> Option<Money> {
        self.sub_limits.get(&key.to_lowercase()).copied()
    }
}

/// Totals stated on the submitted estimate, reconciled by financial rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReportedTotals {
    pub gross: Option<Money>,
    pub net: Option<Money>,
}

/// Most line items a single estimate may carry
pub const MAX_LINE_ITEMS: usize = 10_000;

/// A claim estimate ready for audit
///
/// This is the audit engine's sole input. Nothing in the engine mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimData {
    claim_id: ClaimId,
    policy: PolicyLimits,
    line_items: Vec<LineItem>,
    property: PropertyDetails,
    reported: ReportedTotals,
    gross: Money,
}

impl ClaimData {
    /// Creates a claim; every line item must be priced in the policy currency
    ///
    /// The gross total is computed here, so an estimate whose totals cannot
    /// be represented is rejected before any rule sees it.
    pub fn new(
        claim_id: ClaimId,
        policy: PolicyLimits,
        line_items: Vec<LineItem>,
        property: PropertyDetails,
    ) -> Result<Self, InputShapeError> {
        if line_items.len() > MAX_LINE_ITEMS {
            return Err(InputShapeError::out_of_range(
                "line item count",
                Decimal::from(line_items.len()),
                Decimal::from(MAX_LINE_ITEMS),
            ));
        }
        for item in &line_items {
            check_amount(
                &format!("unit price of '{}'", item.code()),
                &item.unit_price(),
                policy.currency(),
            )?;
        }
        let totals: Vec<Money> = line_items.iter().map(LineItem::total).collect();
        let gross = Money::sum(&totals, policy.currency()).map_err(|_| InputShapeError::Overflow {
            field: "gross total".to_string(),
        })?;

        Ok(Self {
            claim_id,
            policy,
            line_items,
            property,
            reported: ReportedTotals::default(),
            gross,
        })
    }

    /// Attaches the totals stated on the estimate
    pub fn with_reported_totals(mut self, reported: ReportedTotals) -> Result<Self, InputShapeError> {
        let currency = self.policy.currency();
        if let Some(gross) = &reported.gross {
            check_amount("reported gross", gross, currency)?;
        }
        if let Some(net) = &reported.net {
            check_amount("reported net", net, currency)?;
        }
        self.reported = reported;
        Ok(self)
    }

    pub fn claim_id(&self) -> &ClaimId {
        &self.claim_id
    }

    pub fn policy(&self) -> &PolicyLimits {
        &self.policy
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn property(&self) -> &PropertyDetails {
        &self.property
    }

    pub fn reported(&self) -> &ReportedTotals {
        &self.reported
    }

    pub fn currency(&self) -> Currency {
        self.policy.currency()
    }

    /// Sum of all line item totals
    pub fn gross_total(&self) -> Money {
        self.gross
    }

    /// Gross total less the deductible, floored at zero
    pub fn expected_net(&self) -> Money {
        let net = self
            .gross
            .amount()
            .saturating_sub(self.policy.deductible().amount());
        Money::new(net, self.currency()).floor_at_zero()
    }
}

fn check_amount(field: &str, amount: &Money, currency: Currency) -> Result<(), InputShapeError> {
    if amount.currency() != currency {
        return Err(InputShapeError::CurrencyMismatch {
            field: field.to_string(),
            expected: currency,
            found: amount.currency(),
        });
    }
    if amount.is_negative() {
        return Err(InputShapeError::negative(field, amount.amount()));
    }
    if amount.amount() > MAX_AMOUNT {
        return Err(InputShapeError::out_of_range(field, amount.amount(), MAX_AMOUNT));
    }
    Ok(())
}
