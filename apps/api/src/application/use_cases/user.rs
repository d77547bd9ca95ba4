use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        email_templates::login_notification_email,
        validators::{MIN_PASSWORD_LEN, is_valid_email, is_valid_password},
    },
    domain::entities::user::{User, normalize_email},
};

pub const OAUTH_STATE_TTL_MINUTES: i64 = 10;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<User>>;
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn get_by_google_id(&self, google_id: &str) -> AppResult<Option<User>>;
    async fn insert(&self, user: &User) -> AppResult<()>;
    /// Overwrites every mutable field of the stored user.
    async fn save(&self, user: &User) -> AppResult<()>;
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()>;
}

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> AppResult<String>;
    /// `Ok(false)` on mismatch; errors only for unreadable hashes.
    fn verify(&self, password: &str, hash: &str) -> AppResult<bool>;
}

/// Profile returned by the identity provider after a code exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalIdentity {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorize_url(&self, state: &str, code_challenge: &str) -> String;
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AppResult<ExternalIdentity>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthStateData {
    pub code_verifier: String,
}

#[async_trait]
pub trait OAuthStateStore: Send + Sync {
    async fn store_state(
        &self,
        state: &str,
        data: &OAuthStateData,
        ttl_minutes: i64,
    ) -> AppResult<()>;
    /// Single use: a consumed state is gone for every later caller.
    async fn consume_state(&self, state: &str) -> AppResult<Option<OAuthStateData>>;
}

#[derive(Clone)]
pub struct AuthUseCases {
    repo: Arc<dyn UserRepo>,
    email: Arc<dyn EmailSender>,
    hasher: Arc<dyn PasswordHasher>,
    identity: Arc<dyn IdentityProvider>,
    oauth_states: Arc<dyn OAuthStateStore>,
    app_origin: String,
}

impl AuthUseCases {
    pub fn new(
        repo: Arc<dyn UserRepo>,
        email: Arc<dyn EmailSender>,
        hasher: Arc<dyn PasswordHasher>,
        identity: Arc<dyn IdentityProvider>,
        oauth_states: Arc<dyn OAuthStateStore>,
        app_origin: String,
    ) -> Self {
        Self {
            repo,
            email,
            hasher,
            identity,
            oauth_states,
            app_origin,
        }
    }

    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        self.repo.get_by_id(user_id).await
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<User> {
        if !is_valid_email(email) {
            return Err(AppError::InvalidInput("Invalid email address".into()));
        }
        if !is_valid_password(password) {
            return Err(AppError::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let email = normalize_email(email);
        if self.repo.get_by_email(&email).await?.is_some() {
            return Err(AppError::InvalidInput(
                "An account with this email already exists".into(),
            ));
        }

        let mut user = User::new(&email, now);
        user.password_hash = Some(self.hasher.hash(password)?);
        user.display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        user.last_login = Some(now);
        self.repo.insert(&user).await?;

        tracing::info!(user_id = %user.id, "Registered new user");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> AppResult<User> {
        let Some(mut user) = self.repo.get_by_email(&normalize_email(email)).await? else {
            return Err(AppError::InvalidCredentials);
        };
        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AppError::InvalidCredentials);
        };
        if !self.hasher.verify(password, hash)? {
            return Err(AppError::InvalidCredentials);
        }

        user.last_login = Some(now);
        self.repo.save(&user).await?;
        self.notify_login(&user);
        Ok(user)
    }

    /// Create a single-use OAuth state and return the provider's authorize URL.
    #[instrument(skip(self))]
    pub async fn start_google_login(&self) -> AppResult<String> {
        let state = generate_token();
        let code_verifier = generate_token();
        self.oauth_states
            .store_state(
                &state,
                &OAuthStateData {
                    code_verifier: code_verifier.clone(),
                },
                OAUTH_STATE_TTL_MINUTES,
            )
            .await?;
        Ok(self
            .identity
            .authorize_url(&state, &pkce_challenge(&code_verifier)))
    }

    #[instrument(skip(self, code))]
    pub async fn complete_google_login(
        &self,
        state: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> AppResult<User> {
        let Some(state_data) = self.oauth_states.consume_state(state).await? else {
            return Err(AppError::InvalidInput("Invalid or expired OAuth state".into()));
        };

        let identity = self
            .identity
            .exchange_code(code, &state_data.code_verifier)
            .await?;
        let Some(email) = identity
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty())
        else {
            return Err(AppError::InvalidInput(
                "Google account has no email address".into(),
            ));
        };

        let existing = match self.repo.get_by_google_id(&identity.subject).await? {
            Some(user) => Some(user),
            None => self.repo.get_by_email(&email).await?,
        };

        let user = match existing {
            Some(mut user) => {
                if user.google_id.is_none() {
                    user.google_id = Some(identity.subject.clone());
                }
                if user.display_name.is_none() {
                    user.display_name = identity.name.clone();
                }
                user.is_verified = true;
                user.last_login = Some(now);
                self.repo.save(&user).await?;
                user
            }
            None => {
                let mut user = User::new(&email, now);
                user.google_id = Some(identity.subject.clone());
                user.display_name = identity.name.clone();
                user.is_verified = true;
                user.last_login = Some(now);
                self.repo.insert(&user).await?;
                tracing::info!(user_id = %user.id, "Created user from Google login");
                user
            }
        };

        self.notify_login(&user);
        Ok(user)
    }

    /// Fire-and-forget: the login response never waits on the mail provider.
    fn notify_login(&self, user: &User) {
        let (subject, html) = login_notification_email(&self.app_origin, &user.name());
        let email = self.email.clone();
        let to = user.email.clone();
        tokio::spawn(async move {
            if let Err(e) = email.send(&to, &subject, &html).await {
                tracing::warn!(error = %e, "Failed to send login notification");
            }
        });
    }
}

fn generate_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// S256 code challenge for a PKCE verifier.
pub fn pkce_challenge(code_verifier: &str) -> String {
    let digest = Sha256::digest(code_verifier.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
}
