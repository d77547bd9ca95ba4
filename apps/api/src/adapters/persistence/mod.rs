use graphx_types::Plan;
use sqlx::PgPool;

use crate::app_error::AppError;

pub mod chart;
pub mod payment;
pub mod user;

const MAX_JSON_LOG_LEN: usize = 200;

/// Parse a JSONB column into `T`, logging and falling back to `T::default()`
/// on corrupt data. SQL NULL is treated as empty without a warning.
pub fn parse_json_with_fallback<T: serde::de::DeserializeOwned + Default>(
    json: &serde_json::Value,
    field_name: &str,
    entity_type: &str,
    entity_id: &str,
) -> T {
    if json.is_null() {
        return T::default();
    }

    serde_json::from_value(json.clone()).unwrap_or_else(|err| {
        let raw_str = json.to_string();
        let truncated = if raw_str.len() > MAX_JSON_LOG_LEN {
            let head: String = raw_str.chars().take(MAX_JSON_LOG_LEN).collect();
            format!("{head}...")
        } else {
            raw_str
        };

        tracing::warn!(
            field = field_name,
            entity_type = entity_type,
            entity_id = entity_id,
            raw_json = %truncated,
            error = %err,
            "Failed to parse JSON field, using default value"
        );
        T::default()
    })
}

/// Plan stored as TEXT. Unknown values read as no plan.
fn parse_plan_column(raw: Option<&str>, entity_type: &str, entity_id: &str) -> Option<Plan> {
    let raw = raw?;
    match raw.parse() {
        Ok(plan) => Some(plan),
        Err(_) => {
            tracing::warn!(entity_type, entity_id, plan = raw, "Unknown plan in database");
            None
        }
    }
}

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    AppError::InvalidInput("A record with this value already exists".into())
                } else if msg.contains("violates foreign key") {
                    AppError::InvalidInput("Referenced record not found".into())
                } else if msg.contains("null value") && msg.contains("violates not-null") {
                    AppError::InvalidInput("Required field is missing".into())
                } else {
                    tracing::error!(error = ?err, "Database error");
                    AppError::Database("Database operation failed".into())
                }
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{chart::SavedChart, user::PaymentHistoryEntry};
    use serde_json::json;

    #[test]
    fn parse_history_array() {
        let raw = json!([{
            "paymentId": "pay_1",
            "orderId": "order_1",
            "amountMinor": 70000,
            "currency": "INR",
            "date": "2025-03-01T08:00:00Z",
            "status": "completed"
        }]);
        let history: Vec<PaymentHistoryEntry> =
            parse_json_with_fallback(&raw, "payments", "user", "u1");
        assert_eq!(history.len(), 1);
        assert!(!history[0].is_switch);
        assert_eq!(history[0].previous_plan, None);
    }

    #[test]
    fn parse_json_sql_null_returns_empty() {
        let charts: Vec<SavedChart> =
            parse_json_with_fallback(&serde_json::Value::Null, "charts", "user_charts", "a");
        assert!(charts.is_empty());
    }

    #[test]
    fn parse_json_corrupt_returns_empty() {
        let raw = json!({"serial": "one"});
        let charts: Vec<SavedChart> = parse_json_with_fallback(&raw, "charts", "user_charts", "a");
        assert!(charts.is_empty());

        let raw = json!([{"serial": -1, "chartDetails": {}}]);
        let charts: Vec<SavedChart> = parse_json_with_fallback(&raw, "charts", "user_charts", "a");
        assert!(charts.is_empty());
    }

    #[test]
    fn plan_column_reads_known_values_only() {
        assert_eq!(
            parse_plan_column(Some("enterprise"), "user", "u1"),
            Some(Plan::Enterprise)
        );
        assert_eq!(parse_plan_column(Some("gold"), "user", "u1"), None);
        assert_eq!(parse_plan_column(None, "user", "u1"), None);
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            AppError::from(sqlx::Error::RowNotFound),
            AppError::NotFound(_)
        ));
    }
}
