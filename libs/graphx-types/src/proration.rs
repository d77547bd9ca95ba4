//! Plan-switch amount calculation.
//!
//! The day-to-month conversion is a flat 30-day divisor, not calendar-aware,
//! and the Professional -> Enterprise path charges a flat fee instead of the
//! prorated difference. Both are part of the pricing contract.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{BillingError, Plan, PlanPricing};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
const DAYS_PER_MONTH: i64 = 30;

/// Amount owed for a switch and the expiry the subscription will have afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchResult {
    /// Whole currency units, never negative.
    pub amount_due: Decimal,
    pub new_expiry: DateTime<Utc>,
}

/// Compute what a user owes to move to `new_plan` at `now`.
///
/// `current_plan` and `current_expiry` describe the subscription being left;
/// either may be absent. Same-plan and unknown-plan requests must be rejected
/// beforehand (see [`validate_switch`]); this function is total over its inputs.
pub fn compute_switch_amount(
    pricing: &PlanPricing,
    current_plan: Option<Plan>,
    new_plan: Plan,
    current_expiry: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> SwitchResult {
    let (current_plan, current_expiry) = match (current_plan, current_expiry) {
        (Some(plan), Some(expiry)) if expiry > now => (plan, expiry),
        _ => {
            return SwitchResult {
                amount_due: pricing.price(new_plan),
                new_expiry: new_plan.period_end(now),
            };
        }
    };

    if current_plan == Plan::Professional && new_plan == Plan::Enterprise {
        return SwitchResult {
            amount_due: pricing.upgrade_fee,
            new_expiry: current_expiry,
        };
    }

    let remaining_millis = Decimal::from((current_expiry - now).num_milliseconds());
    let remaining_days = remaining_millis / Decimal::from(MILLIS_PER_DAY);
    let remaining_months = remaining_days / Decimal::from(DAYS_PER_MONTH);

    let remaining_value = remaining_months * pricing.price(current_plan);
    let new_plan_cost = remaining_months * pricing.price(new_plan);

    let mut amount_due = new_plan_cost - remaining_value;
    if new_plan == Plan::Enterprise && amount_due < pricing.enterprise_switch_minimum {
        amount_due = pricing.enterprise_switch_minimum;
    }

    SwitchResult {
        amount_due: amount_due.max(Decimal::ZERO),
        new_expiry: current_expiry,
    }
}

/// Parse a requested plan and reject switching to the plan already held.
pub fn validate_switch(current_plan: Option<Plan>, requested: &str) -> Result<Plan, BillingError> {
    let new_plan: Plan = requested.parse()?;
    if current_plan == Some(new_plan) {
        return Err(BillingError::NoOpSwitch(new_plan));
    }
    Ok(new_plan)
}
