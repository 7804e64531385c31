//! Raw claim records and their conversion into audited claim data
//!
//! Records are the serde shape of a claim as it arrives from an estimating
//! system or the HTTP API. Converting a record into [`ClaimData`] runs the
//! [`ClaimValidator`] first and fails closed: a record with any error is
//! rejected as a whole.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use core_kernel::{ClaimId, Currency, Money};
use crate::claim::{ClaimData, PolicyLimits, ReportedTotals};
use crate::error::InputShapeError;
use crate::line_item::{LineItem, DEFAULT_UNIT};
use crate::property::{PropertyDetails, Room, WaterCategory};
use crate::validation::ClaimValidator;

/// A submitted claim estimate
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClaimRecord {
    #[validate(length(min = 1, message = "claim_id is required"))]
    pub claim_id: String,
    #[validate(nested)]
    pub policy: PolicyRecord,
    #[serde(default)]
    #[validate(nested)]
    pub line_items: Vec<LineItemRecord>,
    #[serde(default)]
    #[validate(nested)]
    pub property: PropertyRecord,
    /// Gross claim as stated on the estimate
    #[serde(default)]
    pub reported_gross: Option<Decimal>,
    /// Net claim as stated on the estimate
    #[serde(default)]
    pub reported_net: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PolicyRecord {
    #[serde(default)]
    pub currency: Currency,
    pub deductible: Decimal,
    pub coverage_a: Decimal,
    pub coverage_b: Decimal,
    pub coverage_c: Decimal,
    #[serde(default)]
    pub sub_limits: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LineItemRecord {
    #[serde(default)]
    #[validate(length(max = 64, message = "code is too long"))]
    pub code: String,
    #[serde(default)]
    #[validate(length(max = 512, message = "description is too long"))]
    pub description: String,
    pub quantity: Decimal,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    #[validate(range(max = 365, message = "equipment days must not exceed 365"))]
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PropertyRecord {
    #[serde(default)]
    #[validate(nested)]
    pub rooms: Vec<RoomRecord>,
    #[serde(default)]
    pub water_category: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoomRecord {
    #[validate(length(min = 1, message = "room name is required"))]
    pub name: String,
    pub sqft: Decimal,
    #[serde(default = "default_affected")]
    pub affected: bool,
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

fn default_affected() -> bool {
    true
}

impl ClaimRecord {
    /// Validates the record and builds the immutable claim
    pub fn into_claim_data(self) -> Result<ClaimData, InputShapeError> {
        ClaimData::try_from(self)
    }
}

impl TryFrom<ClaimRecord> for ClaimData {
    type Error = InputShapeError;

    fn try_from(record: ClaimRecord) -> Result<Self, Self::Error> {
        let report = ClaimValidator::validate(&record);
        for warning in &report.warnings {
            tracing::debug!(claim_id = %record.claim_id, warning = %warning, "Claim record warning");
        }
        if !report.is_valid {
            tracing::warn!(
                claim_id = %record.claim_id,
                errors = report.errors.len(),
                "Rejecting malformed claim record"
            );
            return Err(InputShapeError::Rejected {
                errors: report.errors,
            });
        }

        let currency = record.policy.currency;
        let money = |amount: Decimal| Money::new(amount, currency);

        let mut policy = PolicyLimits::new(
            money(record.policy.deductible),
            money(record.policy.coverage_a),
            money(record.policy.coverage_b),
            money(record.policy.coverage_c),
        )?;
        for (key, cap) in &record.policy.sub_limits {
            policy = policy.with_sub_limit(key, money(*cap))?;
        }

        let line_items = record
            .line_items
            .into_iter()
            .map(|raw| -> Result<LineItem, InputShapeError> {
                let mut item = LineItem::new(raw.code, raw.description, raw.quantity, money(raw.unit_price))?
                    .with_unit(raw.unit);
                if let Some(room) = raw.room {
                    item = item.with_room(room);
                }
                if let Some(days) = raw.days {
                    item = item.with_days(days);
                }
                Ok(item)
            })
            .collect::<Result<Vec<_>, InputShapeError>>()?;

        let rooms = record
            .property
            .rooms
            .into_iter()
            .map(|raw| -> Result<Room, InputShapeError> {
                Ok(Room::new(raw.name, raw.sqft)?.with_affected(raw.affected))
            })
            .collect::<Result<Vec<_>, InputShapeError>>()?;
        let water_category = record
            .property
            .water_category
            .map(WaterCategory::try_from)
            .transpose()?;
        let property = PropertyDetails::new(rooms, water_category)?;

        let claim_id = ClaimId::parse(&record.claim_id)?;
        ClaimData::new(claim_id, policy, line_items, property)?.with_reported_totals(ReportedTotals {
            gross: record.reported_gross.map(money),
            net: record.reported_net.map(money),
        })
    }
}
