use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use graphx_types::{
    Plan, PlanPricing, SubscriptionState, compute_switch_amount, to_minor_units, validate_switch,
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        email_templates::{
            PaymentConfirmation, PlanSwitch, payment_confirmation_email, plan_switch_email,
        },
        ports::payment_gateway::{
            GatewayOrder, GatewayPayment, NewOrder, OrderNotes, PaymentGateway, SwitchNotes,
        },
        use_cases::user::{EmailSender, UserRepo},
    },
    domain::entities::{
        payment::PaymentRecord,
        user::{HistoryStatus, PaymentHistoryEntry, User},
    },
};

pub const CHECKOUT_NAME: &str = "Graph-X";

#[async_trait]
pub trait PaymentRepo: Send + Sync {
    async fn insert(&self, record: &PaymentRecord) -> AppResult<()>;
    async fn get_by_order_id(&self, order_id: &str) -> AppResult<Option<PaymentRecord>>;
    async fn update(&self, record: &PaymentRecord) -> AppResult<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prefill {
    pub name: String,
    pub email: String,
}

/// Everything the checkout widget needs to open a payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOrder {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub key: String,
    pub name: String,
    pub description: String,
    pub prefill: Prefill,
}

/// Checkout callback fields.
#[derive(Debug, Clone)]
pub struct PaymentVerification {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwitchOutcome {
    /// Nothing to pay; the new plan is already in place.
    Switched { subscription: SubscriptionState },
    PaymentRequired {
        order_id: String,
        amount: i64,
        currency: String,
        new_expiry: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentStatusReport {
    pub paid: bool,
    pub order: GatewayOrder,
    pub payments: Vec<GatewayPayment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderKind {
    Purchase,
    Switch,
}

/// State a verified callback leaves behind, before the subscription is updated.
struct SettledPayment {
    user: User,
    record: PaymentRecord,
    notes: OrderNotes,
    order: GatewayOrder,
    already_settled: bool,
}

#[derive(Clone)]
pub struct SubscriptionUseCases {
    users: Arc<dyn UserRepo>,
    payments: Arc<dyn PaymentRepo>,
    gateway: Arc<dyn PaymentGateway>,
    email: Arc<dyn EmailSender>,
    pricing: PlanPricing,
    app_origin: String,
}

impl SubscriptionUseCases {
    pub fn new(
        users: Arc<dyn UserRepo>,
        payments: Arc<dyn PaymentRepo>,
        gateway: Arc<dyn PaymentGateway>,
        email: Arc<dyn EmailSender>,
        pricing: PlanPricing,
        app_origin: String,
    ) -> Self {
        Self {
            users,
            payments,
            gateway,
            email,
            pricing,
            app_origin,
        }
    }

    pub fn pricing(&self) -> &PlanPricing {
        &self.pricing
    }

    async fn load_user(&self, user_id: Uuid) -> AppResult<User> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// Current subscription with lazy expiry applied. Persists when expiry flipped it.
    #[instrument(skip(self))]
    pub async fn get_subscription(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<SubscriptionState> {
        let mut user = self.load_user(user_id).await?;
        let checked = user.subscription.check_and_expire(now);
        if checked != user.subscription {
            tracing::info!(%user_id, "Subscription expired, deactivating");
            user.subscription = checked;
            self.users.save(&user).await?;
        }
        Ok(user.subscription)
    }

    #[instrument(skip(self))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        plan: &str,
        now: DateTime<Utc>,
    ) -> AppResult<CheckoutOrder> {
        let plan: Plan = plan.parse()?;
        let user = self.load_user(user_id).await?;
        let amount_minor = self
            .pricing
            .price_minor(plan)
            .ok_or_else(|| AppError::Internal("Plan price out of range".into()))?;

        let order = self
            .gateway
            .create_order(&NewOrder {
                amount_minor,
                currency: self.pricing.currency.clone(),
                receipt: receipt("rcpt", user.id, now),
                notes: OrderNotes {
                    user_id: user.id,
                    plan,
                    email: user.email.clone(),
                    switch: None,
                },
            })
            .await?;

        let record =
            PaymentRecord::new_order(user.id, plan, order.amount, &order.currency, &order.id, now);
        self.payments.insert(&record).await?;

        tracing::info!(order_id = %order.id, %plan, "Created payment order");
        Ok(CheckoutOrder {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            key: self.gateway.key_id().to_string(),
            name: CHECKOUT_NAME.to_string(),
            description: format!("{CHECKOUT_NAME} {} Plan", plan.label()),
            prefill: Prefill {
                name: user.name(),
                email: user.email,
            },
        })
    }

    #[instrument(skip(self, verification), fields(order_id = %verification.order_id))]
    pub async fn verify_payment(
        &self,
        user_id: Uuid,
        verification: &PaymentVerification,
        now: DateTime<Utc>,
    ) -> AppResult<SubscriptionState> {
        let settled = self
            .settle(user_id, verification, OrderKind::Purchase)
            .await?;
        let SettledPayment {
            mut user,
            record,
            notes,
            order,
            already_settled,
        } = settled;
        if already_settled {
            self.mark_ledger_paid(record, verification, &order, now).await?;
            return Ok(user.subscription);
        }

        let expires_at = notes.plan.period_end(now);
        user.apply_payment(
            notes.plan,
            expires_at,
            history_entry(verification, &order, now, None),
        );
        self.users.save(&user).await?;
        self.mark_ledger_paid(record, verification, &order, now).await?;

        let (subject, html) = payment_confirmation_email(
            &self.app_origin,
            &PaymentConfirmation {
                name: &user.name(),
                plan: notes.plan,
                amount_minor: order.amount,
                expires_at,
                payment_id: &verification.payment_id,
            },
        );
        self.send_email(&user.email, &subject, &html).await;

        tracing::info!(plan = %notes.plan, "Payment verified, subscription activated");
        Ok(user.subscription)
    }

    #[instrument(skip(self))]
    pub async fn switch_plan(
        &self,
        user_id: Uuid,
        new_plan: &str,
        now: DateTime<Utc>,
    ) -> AppResult<SwitchOutcome> {
        let mut user = self.load_user(user_id).await?;
        let new_plan = validate_switch(user.subscription.plan, new_plan)?;
        let current_plan = user.active_plan();

        let result = compute_switch_amount(
            &self.pricing,
            current_plan,
            new_plan,
            user.subscription.expires_at,
            now,
        );
        let amount_minor = to_minor_units(result.amount_due)
            .ok_or_else(|| AppError::Internal("Switch amount out of range".into()))?;

        if amount_minor <= 0 {
            user.apply_zero_cost_switch(new_plan, result.new_expiry);
            self.users.save(&user).await?;

            let (subject, html) = plan_switch_email(
                &self.app_origin,
                &PlanSwitch {
                    name: &user.name(),
                    previous_plan: current_plan,
                    new_plan,
                    amount_minor: 0,
                    expires_at: result.new_expiry,
                    payment_id: None,
                },
            );
            self.send_email(&user.email, &subject, &html).await;

            tracing::info!(%new_plan, "Plan switched without payment");
            return Ok(SwitchOutcome::Switched {
                subscription: user.subscription,
            });
        }

        let order = self
            .gateway
            .create_order(&NewOrder {
                amount_minor,
                currency: self.pricing.currency.clone(),
                receipt: receipt("switch", user.id, now),
                notes: OrderNotes {
                    user_id: user.id,
                    plan: new_plan,
                    email: user.email.clone(),
                    switch: Some(SwitchNotes {
                        current_plan,
                        new_expiry: result.new_expiry,
                    }),
                },
            })
            .await?;

        let record = PaymentRecord::new_switch_order(
            user.id,
            new_plan,
            current_plan,
            order.amount,
            &order.currency,
            &order.id,
            now,
        );
        self.payments.insert(&record).await?;

        tracing::info!(order_id = %order.id, %new_plan, amount_minor, "Created switch order");
        Ok(SwitchOutcome::PaymentRequired {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            new_expiry: result.new_expiry,
        })
    }

    #[instrument(skip(self, verification), fields(order_id = %verification.order_id))]
    pub async fn verify_switch(
        &self,
        user_id: Uuid,
        verification: &PaymentVerification,
        now: DateTime<Utc>,
    ) -> AppResult<SubscriptionState> {
        let settled = self
            .settle(user_id, verification, OrderKind::Switch)
            .await?;
        let SettledPayment {
            mut user,
            record,
            notes,
            order,
            already_settled,
        } = settled;
        if already_settled {
            self.mark_ledger_paid(record, verification, &order, now).await?;
            return Ok(user.subscription);
        }

        let previous_plan = record
            .previous_plan
            .or_else(|| notes.switch.as_ref().and_then(|s| s.current_plan));
        let expires_at = notes
            .switch
            .as_ref()
            .map(|s| s.new_expiry)
            .unwrap_or_else(|| notes.plan.period_end(now));

        user.apply_payment(
            notes.plan,
            expires_at,
            history_entry(verification, &order, now, Some(previous_plan)),
        );
        self.users.save(&user).await?;
        self.mark_ledger_paid(record, verification, &order, now).await?;

        let (subject, html) = plan_switch_email(
            &self.app_origin,
            &PlanSwitch {
                name: &user.name(),
                previous_plan,
                new_plan: notes.plan,
                amount_minor: order.amount,
                expires_at,
                payment_id: Some(&verification.payment_id),
            },
        );
        self.send_email(&user.email, &subject, &html).await;

        tracing::info!(plan = %notes.plan, "Switch payment verified");
        Ok(user.subscription)
    }

    #[instrument(skip(self))]
    pub async fn payment_status(
        &self,
        user_id: Uuid,
        order_id: &str,
    ) -> AppResult<PaymentStatusReport> {
        if order_id.trim().is_empty() {
            return Err(AppError::InvalidInput("Order ID required".into()));
        }
        let order = self.gateway.fetch_order(order_id).await?;
        let notes = OrderNotes::from_map(&order.notes)?;
        if notes.user_id != user_id {
            return Err(AppError::Forbidden(
                "Order does not belong to this user".into(),
            ));
        }
        let payments = self.gateway.fetch_order_payments(order_id).await?;
        Ok(PaymentStatusReport {
            paid: payments.iter().any(GatewayPayment::is_captured),
            order,
            payments,
        })
    }

    #[instrument(skip(self))]
    pub async fn cancel_subscription(&self, user_id: Uuid) -> AppResult<SubscriptionState> {
        let mut user = self.load_user(user_id).await?;
        user.subscription = user.subscription.canceled();
        self.users.save(&user).await?;
        Ok(user.subscription)
    }

    /// Shared front half of both verify flows: signature, ownership and order kind.
    ///
    /// Writes nothing. The user's payment history decides whether this payment was
    /// already applied, so a failed save can always be retried.
    async fn settle(
        &self,
        user_id: Uuid,
        verification: &PaymentVerification,
        kind: OrderKind,
    ) -> AppResult<SettledPayment> {
        if !self.gateway.verify_signature(
            &verification.order_id,
            &verification.payment_id,
            &verification.signature,
        ) {
            tracing::warn!(%user_id, "Payment signature mismatch");
            return Err(AppError::InvalidInput("Invalid signature".into()));
        }

        let order = self.gateway.fetch_order(&verification.order_id).await?;
        let notes = OrderNotes::from_map(&order.notes)?;
        if notes.user_id != user_id {
            return Err(AppError::Forbidden(
                "Order does not belong to this user".into(),
            ));
        }

        let record = self
            .payments
            .get_by_order_id(&verification.order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment record not found".into()))?;
        if record.user_id != user_id {
            return Err(AppError::Forbidden(
                "Order does not belong to this user".into(),
            ));
        }
        match (kind, record.is_switch) {
            (OrderKind::Purchase, true) => {
                return Err(AppError::InvalidInput(
                    "Plan switch orders must be verified as a switch".into(),
                ));
            }
            (OrderKind::Switch, false) => {
                return Err(AppError::InvalidInput("Order is not a plan switch".into()));
            }
            _ => {}
        }
        let user = self.load_user(user_id).await?;

        // A repeated callback for the same payment must not extend the subscription twice.
        let already_settled = user
            .payments
            .iter()
            .any(|p| p.payment_id == verification.payment_id);

        Ok(SettledPayment {
            user,
            record,
            notes,
            order,
            already_settled,
        })
    }

    /// Ledger write that follows a saved subscription. A no-op when already recorded.
    async fn mark_ledger_paid(
        &self,
        mut record: PaymentRecord,
        verification: &PaymentVerification,
        order: &GatewayOrder,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if record.status.is_paid()
            && record.gateway_payment_id.as_deref() == Some(verification.payment_id.as_str())
        {
            return Ok(());
        }
        let order_json = serde_json::to_value(order)
            .map_err(|e| AppError::Internal(format!("Failed to serialize order: {e}")))?;
        record.mark_paid(
            &verification.payment_id,
            &verification.signature,
            order_json,
            now,
        );
        self.payments.update(&record).await
    }

    /// Confirmation mail is best effort; the payment stands either way.
    async fn send_email(&self, to: &str, subject: &str, html: &str) {
        if let Err(e) = self.email.send(to, subject, html).await {
            tracing::error!(error = %e, "Failed to send billing email");
        }
    }
}

fn history_entry(
    verification: &PaymentVerification,
    order: &GatewayOrder,
    now: DateTime<Utc>,
    switch_from: Option<Option<Plan>>,
) -> PaymentHistoryEntry {
    PaymentHistoryEntry {
        payment_id: verification.payment_id.clone(),
        order_id: verification.order_id.clone(),
        amount_minor: order.amount,
        currency: order.currency.clone(),
        date: now,
        status: HistoryStatus::Completed,
        is_switch: switch_from.is_some(),
        previous_plan: switch_from.flatten(),
    }
}

/// Merchant reference: `<prefix>-<last 8 of unix millis>-<last 8 of user id>`.
fn receipt(prefix: &str, user_id: Uuid, now: DateTime<Utc>) -> String {
    fn last8(s: &str) -> &str {
        &s[s.len().saturating_sub(8)..]
    }
    let millis = now.timestamp_millis().to_string();
    let id = user_id.simple().to_string();
    format!("{prefix}-{}-{}", last8(&millis), last8(&id))
}
