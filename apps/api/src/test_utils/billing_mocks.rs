//! In-memory mock implementations for the payment ledger and gateway.

use async_trait::async_trait;
use graphx_types::{Plan, sign_payment, verify_payment_signature};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_gateway::{GatewayOrder, GatewayPayment, NewOrder, OrderNotes, PaymentGateway},
        use_cases::subscription::PaymentRepo,
    },
    domain::entities::payment::PaymentRecord,
};

// ============================================================================
// InMemoryPaymentRepo
// ============================================================================

/// Payment ledger keyed by gateway order id.
#[derive(Default)]
pub struct InMemoryPaymentRepo {
    pub records: Mutex<HashMap<String, PaymentRecord>>,
}

impl InMemoryPaymentRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentRepo for InMemoryPaymentRepo {
    async fn insert(&self, record: &PaymentRecord) -> AppResult<()> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.gateway_order_id) {
            return Err(AppError::InvalidInput("Duplicate order id".into()));
        }
        records.insert(record.gateway_order_id.clone(), record.clone());
        Ok(())
    }

    async fn get_by_order_id(&self, order_id: &str) -> AppResult<Option<PaymentRecord>> {
        Ok(self.records.lock().unwrap().get(order_id).cloned())
    }

    async fn update(&self, record: &PaymentRecord) -> AppResult<()> {
        let mut records = self.records.lock().unwrap();
        let Some(stored) = records.get_mut(&record.gateway_order_id) else {
            return Err(AppError::NotFound("Payment record not found".into()));
        };
        *stored = record.clone();
        Ok(())
    }
}

// ============================================================================
// FakePaymentGateway
// ============================================================================

const FAKE_GATEWAY_SECRET: &str = "fake_gateway_secret";

/// Gateway double that keeps orders in memory and signs with a fixed secret.
#[derive(Default)]
pub struct FakePaymentGateway {
    orders: Mutex<HashMap<String, GatewayOrder>>,
    payments: Mutex<HashMap<String, Vec<GatewayPayment>>>,
    created: Mutex<Vec<NewOrder>>,
    next_id: AtomicUsize,
    fetches: AtomicUsize,
}

impl FakePaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signature a real checkout would hand back for this order and payment.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        sign_payment(FAKE_GATEWAY_SECRET, order_id, payment_id)
    }

    /// Every `create_order` request, in call order.
    pub fn created_orders(&self) -> Vec<NewOrder> {
        self.created.lock().unwrap().clone()
    }

    /// Number of `fetch_order` calls.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Put an order straight into the gateway, bypassing the ledger.
    pub fn seed_order(&self, user_id: Uuid, plan: Plan, amount_minor: i64) -> String {
        let notes = OrderNotes {
            user_id,
            plan,
            email: String::new(),
            switch: None,
        };
        let order = self.store_order(amount_minor, "INR", None, notes.to_map());
        order.id
    }

    pub fn add_payment(&self, order_id: &str, payment_id: &str, status: &str) {
        let (amount, currency) = self
            .orders
            .lock()
            .unwrap()
            .get(order_id)
            .map(|o| (o.amount, o.currency.clone()))
            .unwrap_or((0, "INR".to_string()));
        self.payments
            .lock()
            .unwrap()
            .entry(order_id.to_string())
            .or_default()
            .push(GatewayPayment {
                id: payment_id.to_string(),
                order_id: Some(order_id.to_string()),
                amount,
                currency,
                status: status.to_string(),
            });
    }

    fn store_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: Option<String>,
        notes: std::collections::BTreeMap<String, String>,
    ) -> GatewayOrder {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let order = GatewayOrder {
            id: format!("order_test_{n}"),
            amount,
            currency: currency.to_string(),
            receipt,
            status: "created".to_string(),
            notes,
        };
        self.orders
            .lock()
            .unwrap()
            .insert(order.id.clone(), order.clone());
        order
    }
}

#[async_trait]
impl PaymentGateway for FakePaymentGateway {
    fn key_id(&self) -> &str {
        "rzp_test_key"
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_payment_signature(FAKE_GATEWAY_SECRET, order_id, payment_id, signature)
    }

    async fn create_order(&self, order: &NewOrder) -> AppResult<GatewayOrder> {
        self.created.lock().unwrap().push(order.clone());
        Ok(self.store_order(
            order.amount_minor,
            &order.currency,
            Some(order.receipt.clone()),
            order.notes.to_map(),
        ))
    }

    async fn fetch_order(&self, order_id: &str) -> AppResult<GatewayOrder> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.orders
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| AppError::Gateway(format!("Unknown order {order_id}")))
    }

    async fn fetch_order_payments(&self, order_id: &str) -> AppResult<Vec<GatewayPayment>> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .unwrap_or_default())
    }
}
