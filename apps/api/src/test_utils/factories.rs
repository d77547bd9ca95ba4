//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::{DateTime, TimeZone, Utc};
use secrecy::SecretString;
use uuid::Uuid;

use crate::{application::jwt, domain::entities::user::User};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-route-tests";

/// Fixed instant used as "now" across billing tests.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
}

/// Create a test user with sensible defaults: password login, no subscription.
pub fn create_test_user(overrides: impl FnOnce(&mut User)) -> User {
    let id = Uuid::new_v4();
    let mut user = User::new(&format!("user-{}@example.com", id.simple()), test_now());
    user.id = id;
    user.display_name = Some("Test User".to_string());
    user.password_hash = Some("plain:password123".to_string());
    overrides(&mut user);
    user
}

/// Session token accepted by a state built with `TestAppStateBuilder`.
pub fn session_token(user_id: Uuid) -> String {
    jwt::issue(
        user_id,
        &SecretString::new(TEST_JWT_SECRET.into()),
        time::Duration::hours(1),
    )
    .unwrap()
}
