use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    use_cases::user::{ExternalIdentity, IdentityProvider},
};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Google OAuth 2.0 authorization code flow with PKCE.
#[derive(Clone)]
pub struct GoogleIdentityProvider {
    client: Client,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
}

#[derive(Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
}

impl GoogleIdentityProvider {
    pub fn new(
        client: Client,
        client_id: String,
        client_secret: SecretString,
        redirect_uri: String,
    ) -> Self {
        Self {
            client,
            client_id,
            client_secret,
            redirect_uri,
        }
    }

    async fn fetch_userinfo(&self, access_token: &str) -> AppResult<GoogleUserInfo> {
        let response = self
            .client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Network error during OAuth: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Google userinfo request failed");
            return Err(AppError::Internal(format!(
                "Google userinfo error ({status})"
            )));
        }

        response
            .json::<GoogleUserInfo>()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to parse userinfo response: {e}")))
    }
}

/// Maps a failed token endpoint response onto the error the caller sees.
fn token_error(status: u16, body: &str) -> AppError {
    let error_code = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("error")?.as_str().map(str::to_string));

    if error_code.as_deref() == Some("invalid_grant") {
        return AppError::InvalidInput("Authorization code expired or already used".into());
    }
    if status >= 500 {
        AppError::Internal(format!("Google API error ({status}): {body}"))
    } else {
        AppError::InvalidInput("Failed to authenticate with Google".into())
    }
}

impl From<GoogleUserInfo> for ExternalIdentity {
    fn from(info: GoogleUserInfo) -> Self {
        ExternalIdentity {
            subject: info.sub,
            // Unverified addresses must not link to an existing account.
            email: info.email.filter(|_| info.email_verified),
            name: info.name,
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    fn authorize_url(&self, state: &str, code_challenge: &str) -> String {
        let mut url = Url::parse(GOOGLE_AUTH_URL).expect("static Google auth URL");
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email profile")
            .append_pair("state", state)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("prompt", "select_account");
        url.to_string()
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AppResult<ExternalIdentity> {
        let response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
                ("code_verifier", code_verifier),
            ])
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Network error during OAuth: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Google token exchange failed");
            return Err(token_error(status.as_u16(), &body));
        }

        let tokens = response
            .json::<GoogleTokenResponse>()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to parse token response: {e}")))?;

        let info = self.fetch_userinfo(&tokens.access_token).await?;
        Ok(info.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GoogleIdentityProvider {
        GoogleIdentityProvider::new(
            Client::new(),
            "client-123.apps.googleusercontent.com".into(),
            SecretString::new("shh".into()),
            "http://localhost:3001/auth/google/callback".into(),
        )
    }

    #[test]
    fn authorize_url_carries_pkce_and_state() {
        let url = Url::parse(&provider().authorize_url("st4te", "chall3nge")).unwrap();
        assert_eq!(url.host_str(), Some("accounts.google.com"));

        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["state"], "st4te");
        assert_eq!(pairs["code_challenge"], "chall3nge");
        assert_eq!(pairs["code_challenge_method"], "S256");
        assert_eq!(pairs["scope"], "openid email profile");
        assert_eq!(
            pairs["redirect_uri"],
            "http://localhost:3001/auth/google/callback"
        );
    }

    #[test]
    fn invalid_grant_is_client_error() {
        let err = token_error(400, r#"{"error":"invalid_grant"}"#);
        assert!(matches!(err, AppError::InvalidInput(ref m) if m.contains("expired")));

        let err = token_error(503, "unavailable");
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn unverified_email_is_dropped() {
        let identity: ExternalIdentity = GoogleUserInfo {
            sub: "g-1".into(),
            email: Some("a@example.com".into()),
            email_verified: false,
            name: Some("Ada".into()),
        }
        .into();
        assert_eq!(identity.email, None);
        assert_eq!(identity.subject, "g-1");
    }
}
