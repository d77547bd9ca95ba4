use redis::aio::ConnectionManager;

use crate::{adapters::persistence::PostgresPersistence, infra::db::init_db};

pub mod app;
pub mod config;
pub mod db;
mod error;
pub mod google_identity;
pub mod http_client;
pub mod oauth_state;
pub mod password;
pub mod quickchart;
pub mod rate_limit;
pub mod razorpay_client;
pub mod setup;

pub use error::InfraError;

pub async fn postgres_persistence(database_url: &str) -> Result<PostgresPersistence, InfraError> {
    let pool = init_db(database_url).await?;
    Ok(PostgresPersistence::new(pool))
}

/// One multiplexed Redis connection, cloned into every Redis-backed adapter.
pub async fn redis_manager(redis_url: &str) -> Result<ConnectionManager, InfraError> {
    let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
    ConnectionManager::new(client)
        .await
        .map_err(InfraError::RedisConnection)
}
