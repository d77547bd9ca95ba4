use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::common::{UserView, cleared_session_headers, current_user, session_headers};
use crate::{adapters::http::app_state::AppState, app_error::AppResult};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterPayload {
    email: String,
    password: String,
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct GoogleCallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
struct LoginResponse {
    success: bool,
    user: UserView,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    is_authenticated: bool,
    user: Option<UserView>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/auth/status", get(status))
        .route("/auth/google", get(google_start))
        .route("/auth/google/callback", get(google_callback))
}

async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> AppResult<impl IntoResponse> {
    let user = app_state
        .auth_use_cases
        .register(
            &payload.email,
            &payload.password,
            payload.display_name.as_deref(),
            Utc::now(),
        )
        .await?;
    let headers = session_headers(&app_state.config, user.id)?;
    Ok((
        StatusCode::CREATED,
        headers,
        Json(LoginResponse {
            success: true,
            user: UserView::from(&user),
        }),
    ))
}

async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> AppResult<impl IntoResponse> {
    let user = app_state
        .auth_use_cases
        .login_with_password(&payload.email, &payload.password, Utc::now())
        .await?;
    let headers = session_headers(&app_state.config, user.id)?;
    Ok((
        headers,
        Json(LoginResponse {
            success: true,
            user: UserView::from(&user),
        }),
    ))
}

async fn logout(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let headers = cleared_session_headers(&app_state.config)?;
    Ok((
        headers,
        Json(serde_json::json!({
            "success": true,
            "message": "Logged out successfully",
        })),
    ))
}

async fn status(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Json<StatusResponse>> {
    let user = match current_user(&jar, &app_state) {
        Ok(user_id) => app_state.auth_use_cases.get_user(user_id).await?,
        Err(_) => None,
    };
    Ok(Json(StatusResponse {
        is_authenticated: user.is_some(),
        user: user.as_ref().map(UserView::from),
    }))
}

async fn google_start(State(app_state): State<AppState>) -> AppResult<Redirect> {
    let url = app_state.auth_use_cases.start_google_login().await?;
    Ok(Redirect::to(&url))
}

/// Always redirects to the frontend; failures land on the login page.
async fn google_callback(
    State(app_state): State<AppState>,
    Query(query): Query<GoogleCallbackQuery>,
) -> (HeaderMap, Redirect) {
    let frontend = app_state.config.frontend_base();
    let failure = || {
        (
            HeaderMap::new(),
            Redirect::to(&format!("{frontend}/login?error=google_auth_failed")),
        )
    };

    if let Some(error) = query.error {
        tracing::warn!(error = %error, "Google returned an OAuth error");
        return failure();
    }
    let (Some(code), Some(state)) = (query.code, query.state) else {
        return failure();
    };

    let result = async {
        let user = app_state
            .auth_use_cases
            .complete_google_login(&state, &code, Utc::now())
            .await?;
        session_headers(&app_state.config, user.id)
    }
    .await;

    match result {
        Ok(headers) => (
            headers,
            Redirect::to(&format!("{frontend}/dashboard?login_success=true")),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Google login failed");
            failure()
        }
    }
}
