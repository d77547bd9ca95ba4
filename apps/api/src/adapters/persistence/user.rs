use async_trait::async_trait;
use chrono::{DateTime, Utc};
use graphx_types::{PaymentMethod, SubscriptionState};
use sqlx::FromRow;
use uuid::Uuid;

use super::{PostgresPersistence, parse_json_with_fallback, parse_plan_column};
use crate::{
    app_error::{AppError, AppResult},
    domain::entities::user::User,
    use_cases::user::UserRepo,
};

const USER_COLUMNS: &str = "id, email, password_hash, google_id, display_name, is_verified, \
     last_login, plan, active, expires_at, payment_method, payments, created_at";

// User row as stored in the db.
#[derive(FromRow)]
struct UserDb {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
    google_id: Option<String>,
    display_name: Option<String>,
    is_verified: bool,
    last_login: Option<DateTime<Utc>>,
    plan: Option<String>,
    active: bool,
    expires_at: Option<DateTime<Utc>>,
    payment_method: String,
    payments: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<UserDb> for User {
    fn from(row: UserDb) -> Self {
        let id = row.id.to_string();
        let payment_method = row.payment_method.parse().unwrap_or_else(|err| {
            tracing::warn!(user_id = %id, error = %err, "Unknown payment method in database");
            PaymentMethod::default()
        });
        User {
            subscription: SubscriptionState {
                plan: parse_plan_column(row.plan.as_deref(), "user", &id),
                active: row.active,
                expires_at: row.expires_at,
                payment_method,
            },
            payments: parse_json_with_fallback(&row.payments, "payments", "user", &id),
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            google_id: row.google_id,
            display_name: row.display_name,
            is_verified: row.is_verified,
            last_login: row.last_login,
            created_at: row.created_at,
        }
    }
}

fn payments_json(user: &User) -> AppResult<serde_json::Value> {
    serde_json::to_value(&user.payments)
        .map_err(|e| AppError::Internal(format!("Failed to encode payment history: {e}")))
}

impl PostgresPersistence {
    async fn fetch_user_where(&self, column: &str, value: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let row = sqlx::query_as::<_, UserDb>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl UserRepo for PostgresPersistence {
    async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserDb>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.fetch_user_where("email", &email.to_lowercase()).await
    }

    async fn get_by_google_id(&self, google_id: &str) -> AppResult<Option<User>> {
        self.fetch_user_where("google_id", google_id).await
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        let sub = &user.subscription;
        sqlx::query(
            r#"INSERT INTO users
                (id, email, password_hash, google_id, display_name, is_verified, last_login,
                 plan, active, expires_at, payment_method, payments, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.google_id)
        .bind(&user.display_name)
        .bind(user.is_verified)
        .bind(user.last_login)
        .bind(sub.plan.map(|p| p.as_str()))
        .bind(sub.active)
        .bind(sub.expires_at)
        .bind(sub.payment_method.as_str())
        .bind(payments_json(user)?)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save(&self, user: &User) -> AppResult<()> {
        let sub = &user.subscription;
        let result = sqlx::query(
            r#"UPDATE users SET
                email = $2, password_hash = $3, google_id = $4, display_name = $5,
                is_verified = $6, last_login = $7, plan = $8, active = $9, expires_at = $10,
                payment_method = $11, payments = $12, updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.google_id)
        .bind(&user.display_name)
        .bind(user.is_verified)
        .bind(user.last_login)
        .bind(sub.plan.map(|p| p.as_str()))
        .bind(sub.active)
        .bind(sub.expires_at)
        .bind(sub.payment_method.as_str())
        .bind(payments_json(user)?)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        Ok(())
    }
}
