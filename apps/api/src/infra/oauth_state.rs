use async_trait::async_trait;
use redis::{AsyncCommands, Script, aio::ConnectionManager};

use crate::{
    app_error::{AppError, AppResult},
    use_cases::user::{OAuthStateData, OAuthStateStore},
};

/// GET + DEL in one step so a state can only ever be redeemed once.
const CONSUME_SCRIPT: &str = r#"
local value = redis.call('GET', KEYS[1])
if value then
    redis.call('DEL', KEYS[1])
end
return value
"#;

#[derive(Clone)]
pub struct RedisOAuthStateStore {
    manager: ConnectionManager,
}

impl RedisOAuthStateStore {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    fn state_key(state: &str) -> String {
        format!("oauth_state:{state}")
    }
}

#[async_trait]
impl OAuthStateStore for RedisOAuthStateStore {
    async fn store_state(
        &self,
        state: &str,
        data: &OAuthStateData,
        ttl_minutes: i64,
    ) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let ttl_secs: u64 = (ttl_minutes.max(1) * 60) as u64;
        let json = serde_json::to_string(data)
            .map_err(|e| AppError::Internal(format!("Failed to serialize OAuth state: {e}")))?;

        let _: () = conn
            .set_ex(Self::state_key(state), json, ttl_secs)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn consume_state(&self, state: &str) -> AppResult<Option<OAuthStateData>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = Script::new(CONSUME_SCRIPT)
            .key(Self::state_key(state))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to consume OAuth state: {e}")))?;

        raw.map(|value| {
            serde_json::from_str(&value)
                .map_err(|e| AppError::Internal(format!("Failed to parse OAuth state: {e}")))
        })
        .transpose()
    }
}
