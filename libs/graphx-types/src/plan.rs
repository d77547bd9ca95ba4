use chrono::{DateTime, Months, Utc};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::BillingError;

/// Paid subscription tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Professional,
    Enterprise,
}

impl Plan {
    pub const ALL: [Plan; 2] = [Plan::Professional, Plan::Enterprise];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Professional => "professional",
            Plan::Enterprise => "enterprise",
        }
    }

    /// Human-readable name used in emails and checkout descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            Plan::Professional => "Professional",
            Plan::Enterprise => "Enterprise",
        }
    }

    /// Length of a freshly purchased subscription period.
    pub fn duration_months(&self) -> u32 {
        match self {
            Plan::Professional => 1,
            Plan::Enterprise => 12,
        }
    }

    /// End of a period bought at `start`. Calendar months; days past the end
    /// of the target month clamp to its last day.
    pub fn period_end(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start
            .checked_add_months(Months::new(self.duration_months()))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Plan {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "professional" => Ok(Plan::Professional),
            "enterprise" => Ok(Plan::Enterprise),
            other => Err(BillingError::InvalidPlan(other.to_string())),
        }
    }
}

/// Price table for the proration engine, in whole currency units.
///
/// Passed explicitly to every calculation so tests can pin prices and the
/// service can override them from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPricing {
    pub professional: Decimal,
    pub enterprise: Decimal,
    /// Flat charge for a Professional -> Enterprise switch while Professional is active.
    pub upgrade_fee: Decimal,
    /// Lowest amount any prorated switch into Enterprise may cost.
    pub enterprise_switch_minimum: Decimal,
    pub currency: String,
}

impl Default for PlanPricing {
    fn default() -> Self {
        Self {
            professional: Decimal::from(700),
            enterprise: Decimal::from(1499),
            // Billed as a flat 799; not derived from the plan prices.
            upgrade_fee: Decimal::from(799),
            enterprise_switch_minimum: Decimal::from(799),
            currency: "INR".to_string(),
        }
    }
}

impl PlanPricing {
    /// Monthly price of a plan.
    pub fn price(&self, plan: Plan) -> Decimal {
        match plan {
            Plan::Professional => self.professional,
            Plan::Enterprise => self.enterprise,
        }
    }

    /// Full price of a plan in minor currency units (paise for INR).
    pub fn price_minor(&self, plan: Plan) -> Option<i64> {
        to_minor_units(self.price(plan))
    }
}

/// Convert a whole-unit amount to minor units, rounding halves away from zero.
///
/// Returns `None` only if the result does not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_plan_wire_format() {
        assert_eq!(
            serde_json::to_string(&Plan::Professional).unwrap(),
            r#""professional""#
        );
        let parsed: Plan = serde_json::from_str(r#""enterprise""#).unwrap();
        assert_eq!(parsed, Plan::Enterprise);
    }

    #[test]
    fn test_from_str_rejects_unknown_plans() {
        assert_eq!(Plan::from_str("professional"), Ok(Plan::Professional));
        assert_eq!(
            Plan::from_str("Enterprise"),
            Err(BillingError::InvalidPlan("Enterprise".to_string()))
        );
        assert!(Plan::from_str("free").is_err());
        assert!(Plan::from_str("").is_err());
    }

    #[test]
    fn test_durations() {
        assert_eq!(Plan::Professional.duration_months(), 1);
        assert_eq!(Plan::Enterprise.duration_months(), 12);
    }

    #[test]
    fn test_period_end() {
        use chrono::TimeZone;
        let start = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        assert_eq!(
            Plan::Professional.period_end(start),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
        assert_eq!(
            Plan::Enterprise.period_end(start),
            Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_default_prices() {
        let pricing = PlanPricing::default();
        assert_eq!(pricing.price(Plan::Professional), Decimal::from(700));
        assert_eq!(pricing.price(Plan::Enterprise), Decimal::from(1499));
        assert_eq!(pricing.price_minor(Plan::Professional), Some(70_000));
        assert_eq!(pricing.price_minor(Plan::Enterprise), Some(149_900));
    }

    #[test]
    fn test_to_minor_units_rounds_half_up() {
        assert_eq!(to_minor_units(Decimal::new(12345, 3)), Some(1235));
        assert_eq!(to_minor_units(Decimal::new(12344, 3)), Some(1234));
        assert_eq!(to_minor_units(Decimal::ZERO), Some(0));
        assert_eq!(to_minor_units(Decimal::new(5, 3)), Some(1));
    }
}
