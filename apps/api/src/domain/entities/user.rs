use chrono::{DateTime, Utc};
use graphx_types::{Plan, SubscriptionState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a payment as recorded in the user's own history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// One entry of `User::payments`, appended when a payment is verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistoryEntry {
    pub payment_id: String,
    pub order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub date: DateTime<Utc>,
    pub status: HistoryStatus,
    #[serde(default)]
    pub is_switch: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_plan: Option<Plan>,
}

/// A Graph-X account. Loaded and saved as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub display_name: Option<String>,
    pub is_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub subscription: SubscriptionState,
    pub payments: Vec<PaymentHistoryEntry>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Fresh account with an empty subscription.
    pub fn new(email: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            password_hash: None,
            google_id: None,
            display_name: None,
            is_verified: false,
            last_login: None,
            subscription: SubscriptionState::default(),
            payments: Vec::new(),
            created_at: now,
        }
    }

    /// Display name, falling back to the local part of the email.
    pub fn name(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_string(),
        }
    }

    /// Record a verified payment: overwrite the subscription and append the history entry.
    pub fn apply_payment(
        &mut self,
        plan: Plan,
        expires_at: DateTime<Utc>,
        entry: PaymentHistoryEntry,
    ) {
        self.subscription = SubscriptionState::activated(plan, expires_at);
        self.payments.push(entry);
    }

    /// A switch that costs nothing changes the plan without a history entry.
    pub fn apply_zero_cost_switch(&mut self, plan: Plan, expires_at: DateTime<Utc>) {
        self.subscription = SubscriptionState::activated(plan, expires_at);
    }

    /// Plan that counts for proration: the stored plan, only while it is active.
    pub fn active_plan(&self) -> Option<Plan> {
        if self.subscription.active {
            self.subscription.plan
        } else {
            None
        }
    }
}

/// Emails are stored trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
