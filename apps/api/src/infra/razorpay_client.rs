use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_gateway::{GatewayOrder, GatewayPayment, NewOrder, PaymentGateway},
};

const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";

/// Razorpay Orders API over reqwest, Basic auth with `key_id:key_secret`.
#[derive(Clone)]
pub struct RazorpayClient {
    client: Client,
    base_url: String,
    key_id: String,
    key_secret: SecretString,
}

#[derive(Serialize)]
struct CreateOrderReq<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    notes: BTreeMap<String, String>,
    payment_capture: u8,
}

#[derive(Deserialize)]
struct RazorpayOrder {
    id: String,
    amount: i64,
    currency: String,
    receipt: Option<String>,
    status: String,
    /// `{}` with notes, `[]` without.
    #[serde(default)]
    notes: Value,
}

#[derive(Deserialize)]
struct RazorpayPayment {
    id: String,
    order_id: Option<String>,
    amount: i64,
    currency: String,
    status: String,
}

#[derive(Deserialize)]
struct Collection<T> {
    items: Vec<T>,
}

#[derive(Deserialize)]
struct RazorpayErrorResponse {
    error: RazorpayErrorBody,
}

#[derive(Deserialize)]
struct RazorpayErrorBody {
    code: Option<String>,
    description: Option<String>,
}

impl RazorpayClient {
    pub fn new(client: Client, key_id: String, key_secret: SecretString) -> Self {
        Self {
            client,
            base_url: RAZORPAY_API_BASE.to_string(),
            key_id,
            key_secret,
        }
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Razorpay API error");
            return Err(AppError::Gateway(gateway_error_message(status.as_u16(), &body)));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse Razorpay response");
            AppError::Gateway(format!("Failed to parse Razorpay response: {e}"))
        })
    }
}

fn gateway_error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<RazorpayErrorResponse>(body) {
        Ok(err) => format!(
            "Razorpay error ({}): {}",
            err.error.code.unwrap_or_else(|| status.to_string()),
            err.error.description.unwrap_or_default()
        ),
        Err(_) => format!("Razorpay API error: {status}"),
    }
}

/// Notes come back as an object of scalars, or as an empty array when unset.
fn notes_from_value(value: &Value) -> BTreeMap<String, String> {
    let Value::Object(map) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Null => return None,
                other => other.to_string(),
            };
            Some((key.clone(), value))
        })
        .collect()
}

impl From<RazorpayOrder> for GatewayOrder {
    fn from(order: RazorpayOrder) -> Self {
        GatewayOrder {
            notes: notes_from_value(&order.notes),
            id: order.id,
            amount: order.amount,
            currency: order.currency,
            receipt: order.receipt,
            status: order.status,
        }
    }
}

impl From<RazorpayPayment> for GatewayPayment {
    fn from(payment: RazorpayPayment) -> Self {
        GatewayPayment {
            id: payment.id,
            order_id: payment.order_id,
            amount: payment.amount,
            currency: payment.currency,
            status: payment.status,
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        graphx_types::verify_payment_signature(
            self.key_secret.expose_secret(),
            order_id,
            payment_id,
            signature,
        )
    }

    async fn create_order(&self, order: &NewOrder) -> AppResult<GatewayOrder> {
        let body = CreateOrderReq {
            amount: order.amount_minor,
            currency: &order.currency,
            receipt: &order.receipt,
            notes: order.notes.to_map(),
            payment_capture: 1,
        };
        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Razorpay request failed: {e}")))?;

        let created: RazorpayOrder = self.handle_response(response).await?;
        Ok(created.into())
    }

    async fn fetch_order(&self, order_id: &str) -> AppResult<GatewayOrder> {
        let response = self
            .client
            .get(format!("{}/orders/{}", self.base_url, order_id))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Razorpay request failed: {e}")))?;

        let order: RazorpayOrder = self.handle_response(response).await?;
        Ok(order.into())
    }

    async fn fetch_order_payments(&self, order_id: &str) -> AppResult<Vec<GatewayPayment>> {
        let response = self
            .client
            .get(format!("{}/orders/{}/payments", self.base_url, order_id))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Razorpay request failed: {e}")))?;

        let payments: Collection<RazorpayPayment> = self.handle_response(response).await?;
        Ok(payments.items.into_iter().map(Into::into).collect())
    }
}
