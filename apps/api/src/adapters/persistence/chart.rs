use async_trait::async_trait;
use sqlx::FromRow;

use super::{PostgresPersistence, parse_json_with_fallback};
use crate::{
    app_error::{AppError, AppResult},
    domain::entities::chart::UserCharts,
    use_cases::chart::ChartRepo,
};

#[derive(FromRow)]
struct UserChartsDb {
    email: String,
    charts: serde_json::Value,
}

#[async_trait]
impl ChartRepo for PostgresPersistence {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<UserCharts>> {
        let row = sqlx::query_as::<_, UserChartsDb>(
            "SELECT email, charts FROM user_charts WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| UserCharts {
            charts: parse_json_with_fallback(&row.charts, "charts", "user_charts", &row.email),
            email: row.email,
        }))
    }

    async fn save(&self, charts: &UserCharts) -> AppResult<()> {
        let json = serde_json::to_value(&charts.charts)
            .map_err(|e| AppError::Internal(format!("Failed to encode charts: {e}")))?;
        sqlx::query(
            r#"INSERT INTO user_charts (email, charts)
               VALUES ($1, $2)
               ON CONFLICT (email) DO UPDATE
               SET charts = EXCLUDED.charts, updated_at = NOW()"#,
        )
        .bind(&charts.email)
        .bind(json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
