//! Session cookie helpers shared by the route modules.

use axum::http::{HeaderMap, HeaderValue};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt,
    domain::entities::user::User,
    infra::config::AppConfig,
};

pub const SESSION_COOKIE: &str = "access_token";

/// Public view of a user, as returned by login and status endpoints.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_verified: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name(),
            is_verified: user.is_verified,
        }
    }
}

/// User id from the session cookie. Missing or invalid sessions are `InvalidCredentials`.
pub fn current_user(jar: &CookieJar, app_state: &AppState) -> AppResult<Uuid> {
    let Some(access_cookie) = jar.get(SESSION_COOKIE) else {
        return Err(AppError::InvalidCredentials);
    };
    jwt::verify(access_cookie.value(), &app_state.config.jwt_secret)?.user_id()
}

fn session_cookie_base(config: &AppConfig, value: String) -> Cookie<'static> {
    let same_site = if config.cookie_secure {
        SameSite::None
    } else {
        SameSite::Lax
    };
    Cookie::build((SESSION_COOKIE, value))
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(same_site)
        .path("/")
        .build()
}

pub fn append_cookie(headers: &mut HeaderMap, cookie: Cookie<'_>) -> AppResult<()> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|_| AppError::Internal("Failed to build cookie header".into()))?;
    headers.append("set-cookie", value);
    Ok(())
}

/// Issue a session token for `user_id` and return the `Set-Cookie` headers.
pub fn session_headers(config: &AppConfig, user_id: Uuid) -> AppResult<HeaderMap> {
    let token = jwt::issue(user_id, &config.jwt_secret, config.session_ttl)?;
    let mut cookie = session_cookie_base(config, token);
    cookie.set_max_age(config.session_ttl);

    let mut headers = HeaderMap::new();
    append_cookie(&mut headers, cookie)?;
    Ok(headers)
}

pub fn cleared_session_headers(config: &AppConfig) -> AppResult<HeaderMap> {
    let mut cookie = session_cookie_base(config, String::new());
    cookie.set_max_age(time::Duration::seconds(0));

    let mut headers = HeaderMap::new();
    append_cookie(&mut headers, cookie)?;
    Ok(headers)
}
