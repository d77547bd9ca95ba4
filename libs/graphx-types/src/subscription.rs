use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Plan;

/// Channel a subscription was paid through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Razorpay,
    Stripe,
    Manual,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Razorpay => "razorpay",
            Self::Stripe => "stripe",
            Self::Manual => "manual",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "razorpay" => Ok(Self::Razorpay),
            "stripe" => Ok(Self::Stripe),
            "manual" => Ok(Self::Manual),
            other => Err(format!("Invalid payment method: {}", other)),
        }
    }
}

/// The `plan/active/expiresAt/paymentMethod` tuple stored on every user.
///
/// Only ever replaced as a whole; `active` implies `expires_at` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionState {
    pub plan: Option<Plan>,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub payment_method: PaymentMethod,
}

impl SubscriptionState {
    /// State after a completed payment or a free switch.
    pub fn activated(plan: Plan, expires_at: DateTime<Utc>) -> Self {
        Self {
            plan: Some(plan),
            active: true,
            expires_at: Some(expires_at),
            payment_method: PaymentMethod::Razorpay,
        }
    }

    /// True when the subscription claims to be active but its expiry has passed.
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.is_some_and(|expires_at| expires_at < now)
    }

    /// Lazy expiry: a copy with `active = false` once `expires_at` has passed.
    ///
    /// Pure; callers that report status persist the result when it differs.
    pub fn check_and_expire(&self, now: DateTime<Utc>) -> Self {
        if self.is_lapsed(now) {
            Self {
                active: false,
                ..self.clone()
            }
        } else {
            self.clone()
        }
    }

    /// Cancellation keeps plan and expiry for reference but drops access.
    pub fn canceled(&self) -> Self {
        Self {
            active: false,
            ..self.clone()
        }
    }
}
