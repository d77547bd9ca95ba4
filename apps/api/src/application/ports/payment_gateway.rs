use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use graphx_types::Plan;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};

/// Order as the gateway reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    /// Minor units.
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
    #[serde(default)]
    pub notes: BTreeMap<String, String>,
}

/// Payment attempt against an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    pub order_id: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

impl GatewayPayment {
    pub fn is_captured(&self) -> bool {
        self.status == "captured"
    }
}

/// What to ask the gateway for.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: OrderNotes,
}

/// Switch details carried in order notes.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchNotes {
    pub current_plan: Option<Plan>,
    pub new_expiry: DateTime<Utc>,
}

/// Metadata attached to every order, string-keyed on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderNotes {
    pub user_id: Uuid,
    pub plan: Plan,
    pub email: String,
    pub switch: Option<SwitchNotes>,
}

impl OrderNotes {
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("userId".to_string(), self.user_id.to_string());
        map.insert("plan".to_string(), self.plan.to_string());
        map.insert("email".to_string(), self.email.clone());
        if let Some(switch) = &self.switch {
            map.insert("isSwitch".to_string(), "true".to_string());
            if let Some(current) = switch.current_plan {
                map.insert("currentPlan".to_string(), current.to_string());
            }
            map.insert("newExpiry".to_string(), switch.new_expiry.to_rfc3339());
        }
        map
    }

    /// Parse notes read back from a fetched order.
    ///
    /// An unparsable `newExpiry` is treated as absent so the caller falls back
    /// to a fresh period.
    pub fn from_map(map: &BTreeMap<String, String>) -> AppResult<Self> {
        let user_id = map
            .get("userId")
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or_else(|| AppError::Gateway("Order notes missing userId".into()))?;
        let plan = map
            .get("plan")
            .and_then(|raw| raw.parse::<Plan>().ok())
            .ok_or_else(|| AppError::Gateway("Order notes missing plan".into()))?;
        let email = map.get("email").cloned().unwrap_or_default();

        let is_switch = map.get("isSwitch").is_some_and(|v| v == "true");
        let new_expiry = map
            .get("newExpiry")
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let switch = match (is_switch, new_expiry) {
            (true, Some(new_expiry)) => Some(SwitchNotes {
                current_plan: map.get("currentPlan").and_then(|raw| raw.parse().ok()),
                new_expiry,
            }),
            _ => None,
        };

        Ok(Self {
            user_id,
            plan,
            email,
            switch,
        })
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key id handed to the checkout widget.
    fn key_id(&self) -> &str;

    /// Verify a checkout callback signature.
    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;

    async fn create_order(&self, order: &NewOrder) -> AppResult<GatewayOrder>;

    async fn fetch_order(&self, order_id: &str) -> AppResult<GatewayOrder>;

    async fn fetch_order_payments(&self, order_id: &str) -> AppResult<Vec<GatewayPayment>>;
}
