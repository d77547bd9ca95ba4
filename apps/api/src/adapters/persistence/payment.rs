use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{PostgresPersistence, parse_plan_column};
use crate::{
    app_error::{AppError, AppResult},
    domain::entities::payment::{PaymentRecord, PaymentStatus},
    use_cases::subscription::PaymentRepo,
};

#[derive(FromRow)]
struct PaymentDb {
    id: Uuid,
    user_id: Uuid,
    plan: String,
    amount_minor: i64,
    currency: String,
    gateway_order_id: String,
    gateway_payment_id: Option<String>,
    gateway_signature: Option<String>,
    status: String,
    is_switch: bool,
    previous_plan: Option<String>,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentDb> for PaymentRecord {
    type Error = AppError;

    fn try_from(row: PaymentDb) -> Result<Self, Self::Error> {
        let id = row.id.to_string();
        let plan = parse_plan_column(Some(&row.plan), "payment", &id)
            .ok_or_else(|| AppError::Internal(format!("Payment {id} has an unknown plan")))?;
        let status = row.status.parse().unwrap_or_else(|_| {
            tracing::warn!(payment_id = %id, status = %row.status, "Unknown payment status in database");
            PaymentStatus::default()
        });

        Ok(PaymentRecord {
            previous_plan: parse_plan_column(row.previous_plan.as_deref(), "payment", &id),
            plan,
            status,
            id: row.id,
            user_id: row.user_id,
            amount_minor: row.amount_minor,
            currency: row.currency,
            gateway_order_id: row.gateway_order_id,
            gateway_payment_id: row.gateway_payment_id,
            gateway_signature: row.gateway_signature,
            is_switch: row.is_switch,
            metadata: row.metadata.unwrap_or(serde_json::Value::Null),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// JSON null is stored as SQL NULL.
fn metadata_column(record: &PaymentRecord) -> Option<&serde_json::Value> {
    Some(&record.metadata).filter(|value| !value.is_null())
}

#[async_trait]
impl PaymentRepo for PostgresPersistence {
    async fn insert(&self, record: &PaymentRecord) -> AppResult<()> {
        sqlx::query(
            r#"INSERT INTO payments
                (id, user_id, plan, amount_minor, currency, gateway_order_id, gateway_payment_id,
                 gateway_signature, status, is_switch, previous_plan, metadata, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.plan.as_str())
        .bind(record.amount_minor)
        .bind(&record.currency)
        .bind(&record.gateway_order_id)
        .bind(&record.gateway_payment_id)
        .bind(&record.gateway_signature)
        .bind(record.status.as_ref())
        .bind(record.is_switch)
        .bind(record.previous_plan.map(|p| p.as_str()))
        .bind(metadata_column(record))
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_by_order_id(&self, order_id: &str) -> AppResult<Option<PaymentRecord>> {
        let row = sqlx::query_as::<_, PaymentDb>(
            r#"SELECT id, user_id, plan, amount_minor, currency, gateway_order_id, gateway_payment_id,
                      gateway_signature, status, is_switch, previous_plan, metadata, created_at, updated_at
               FROM payments
               WHERE gateway_order_id = $1"#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(PaymentRecord::try_from).transpose()
    }

    async fn update(&self, record: &PaymentRecord) -> AppResult<()> {
        let result = sqlx::query(
            r#"UPDATE payments SET
                gateway_payment_id = $2, gateway_signature = $3, status = $4,
                metadata = $5, updated_at = $6
               WHERE id = $1"#,
        )
        .bind(record.id)
        .bind(&record.gateway_payment_id)
        .bind(&record.gateway_signature)
        .bind(record.status.as_ref())
        .bind(metadata_column(record))
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Payment record not found".into()));
        }
        Ok(())
    }
}
