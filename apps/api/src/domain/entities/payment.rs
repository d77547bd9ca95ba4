use chrono::{DateTime, Utc};
use graphx_types::Plan;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Lifecycle of a gateway order in our ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Created,
    Attempted,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }
}

/// Ledger row for one gateway order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: Plan,
    pub amount_minor: i64,
    pub currency: String,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub status: PaymentStatus,
    pub is_switch: bool,
    pub previous_plan: Option<Plan>,
    /// Gateway order as returned when the payment was verified.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn new_order(
        user_id: Uuid,
        plan: Plan,
        amount_minor: i64,
        currency: &str,
        gateway_order_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            plan,
            amount_minor,
            currency: currency.to_string(),
            gateway_order_id: gateway_order_id.to_string(),
            gateway_payment_id: None,
            gateway_signature: None,
            status: PaymentStatus::Created,
            is_switch: false,
            previous_plan: None,
            metadata: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    /// Same as [`PaymentRecord::new_order`] but for a plan switch.
    pub fn new_switch_order(
        user_id: Uuid,
        plan: Plan,
        previous_plan: Option<Plan>,
        amount_minor: i64,
        currency: &str,
        gateway_order_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            is_switch: true,
            previous_plan,
            ..Self::new_order(user_id, plan, amount_minor, currency, gateway_order_id, now)
        }
    }

    pub fn mark_paid(
        &mut self,
        payment_id: &str,
        signature: &str,
        order: serde_json::Value,
        now: DateTime<Utc>,
    ) {
        self.gateway_payment_id = Some(payment_id.to_string());
        self.gateway_signature = Some(signature.to_string());
        self.status = PaymentStatus::Paid;
        self.metadata = order;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_string_round_trip() {
        assert_eq!(PaymentStatus::Created.as_ref(), "created");
        assert_eq!(PaymentStatus::Paid.to_string(), "paid");
        assert_eq!(PaymentStatus::from_str("refunded"), Ok(PaymentStatus::Refunded));
        assert!(PaymentStatus::from_str("captured").is_err());
    }

    #[test]
    fn mark_paid_fills_gateway_fields() {
        let now = Utc::now();
        let mut record =
            PaymentRecord::new_order(Uuid::new_v4(), Plan::Enterprise, 149_900, "INR", "order_1", now);
        assert_eq!(record.status, PaymentStatus::Created);
        assert!(!record.is_switch);

        record.mark_paid("pay_1", "sig", serde_json::json!({"id": "order_1"}), now);
        assert!(record.status.is_paid());
        assert_eq!(record.gateway_payment_id.as_deref(), Some("pay_1"));
        assert_eq!(record.gateway_signature.as_deref(), Some("sig"));
        assert_eq!(record.metadata["id"], "order_1");
    }

    #[test]
    fn switch_order_keeps_previous_plan() {
        let record = PaymentRecord::new_switch_order(
            Uuid::new_v4(),
            Plan::Enterprise,
            Some(Plan::Professional),
            79_900,
            "INR",
            "order_2",
            Utc::now(),
        );
        assert!(record.is_switch);
        assert_eq!(record.previous_plan, Some(Plan::Professional));
        assert_eq!(record.amount_minor, 79_900);
    }
}
