//! In-memory mock implementations for account, session and email ports.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::user::{
        EmailSender, ExternalIdentity, IdentityProvider, OAuthStateData, OAuthStateStore,
        PasswordHasher, UserRepo,
    },
    domain::entities::user::User,
    infra::rate_limit::RateLimiterTrait,
};

// ============================================================================
// InMemoryUserRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepo {
    pub users: Mutex<HashMap<Uuid, User>>,
    saves: AtomicUsize,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users.into_iter().map(|u| (u.id, u)).collect()),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn find(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| predicate(u))
            .cloned()
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self.find(|u| u.email.to_lowercase() == email))
    }

    async fn get_by_google_id(&self, google_id: &str) -> AppResult<Option<User>> {
        Ok(self.find(|u| u.google_id.as_deref() == Some(google_id)))
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::InvalidInput("Email already registered".into()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn save(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let Some(stored) = users.get_mut(&user.id) else {
            return Err(AppError::NotFound("User not found".into()));
        };
        *stored = user.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// InMemoryEmailSender
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Records every email instead of sending it.
#[derive(Default)]
pub struct InMemoryEmailSender {
    sent: Mutex<Vec<SentEmail>>,
    fail: AtomicBool,
}

impl InMemoryEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Make every following `send` fail with an internal error.
    pub fn fail_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmailSender for InMemoryEmailSender {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("Email provider unavailable".into()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

/// Poll until at least `count` emails were recorded. Login notifications are
/// sent from a spawned task, so tests cannot read them synchronously.
pub async fn wait_for_emails(sender: &InMemoryEmailSender, count: usize) -> Vec<SentEmail> {
    for _ in 0..100 {
        let sent = sender.sent();
        if sent.len() >= count {
            return sent;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {count} emails, got {}", sender.sent().len());
}

// ============================================================================
// InMemoryOAuthStateStore
// ============================================================================

#[derive(Default)]
pub struct InMemoryOAuthStateStore {
    states: Mutex<HashMap<String, OAuthStateData>>,
}

impl InMemoryOAuthStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a state without consuming it.
    pub fn peek(&self, state: &str) -> Option<OAuthStateData> {
        self.states.lock().unwrap().get(state).cloned()
    }

    pub fn len(&self) -> usize {
        self.states.lock().unwrap().len()
    }
}

#[async_trait]
impl OAuthStateStore for InMemoryOAuthStateStore {
    async fn store_state(
        &self,
        state: &str,
        data: &OAuthStateData,
        _ttl_minutes: i64,
    ) -> AppResult<()> {
        self.states
            .lock()
            .unwrap()
            .insert(state.to_string(), data.clone());
        Ok(())
    }

    async fn consume_state(&self, state: &str) -> AppResult<Option<OAuthStateData>> {
        Ok(self.states.lock().unwrap().remove(state))
    }
}

// ============================================================================
// FakeIdentityProvider
// ============================================================================

/// Identity provider that accepts any code and returns a configurable profile.
pub struct FakeIdentityProvider {
    identity: Mutex<ExternalIdentity>,
    authorize_calls: Mutex<Vec<(String, String)>>,
    exchanges: Mutex<Vec<(String, String)>>,
}

impl Default for FakeIdentityProvider {
    fn default() -> Self {
        Self {
            identity: Mutex::new(ExternalIdentity {
                subject: "google-sub-default".to_string(),
                email: Some("google.user@gmail.com".to_string()),
                name: Some("Google User".to_string()),
            }),
            authorize_calls: Mutex::new(Vec::new()),
            exchanges: Mutex::new(Vec::new()),
        }
    }
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_identity(&self, identity: ExternalIdentity) {
        *self.identity.lock().unwrap() = identity;
    }

    /// `(state, code_challenge)` of the most recent authorize URL.
    pub fn last_authorize(&self) -> Option<(String, String)> {
        self.authorize_calls.lock().unwrap().last().cloned()
    }

    /// `(code, code_verifier)` of the most recent exchange.
    pub fn last_exchange(&self) -> Option<(String, String)> {
        self.exchanges.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    fn authorize_url(&self, state: &str, code_challenge: &str) -> String {
        self.authorize_calls
            .lock()
            .unwrap()
            .push((state.to_string(), code_challenge.to_string()));
        format!("https://idp.test/authorize?state={state}&code_challenge={code_challenge}")
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AppResult<ExternalIdentity> {
        self.exchanges
            .lock()
            .unwrap()
            .push((code.to_string(), code_verifier.to_string()));
        Ok(self.identity.lock().unwrap().clone())
    }
}

// ============================================================================
// PlainPasswordHasher
// ============================================================================

/// Reversible "hash" so tests can seed users without running argon2.
pub struct PlainPasswordHasher;

impl PlainPasswordHasher {
    pub fn hashed(password: &str) -> String {
        format!("plain:{password}")
    }
}

impl PasswordHasher for PlainPasswordHasher {
    fn hash(&self, password: &str) -> AppResult<String> {
        Ok(Self::hashed(password))
    }

    fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
        let Some(stored) = hash.strip_prefix("plain:") else {
            return Err(AppError::Internal("Unreadable password hash".into()));
        };
        Ok(stored == password)
    }
}

// ============================================================================
// InMemoryRateLimiter
// ============================================================================

/// In-memory rate limiter for testing. Counts never reset.
pub struct InMemoryRateLimiter {
    counts: Mutex<HashMap<String, u64>>,
    max_per_ip: u64,
}

impl InMemoryRateLimiter {
    pub fn new(max_per_ip: u64) -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            max_per_ip,
        }
    }

    /// Create a permissive rate limiter that never blocks (for most tests).
    pub fn permissive() -> Self {
        Self::new(u64::MAX)
    }
}

#[async_trait]
impl RateLimiterTrait for InMemoryRateLimiter {
    async fn check(&self, ip: &str) -> AppResult<()> {
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(format!("rate:ip:{ip}")).or_insert(0);
        *count += 1;
        if *count > self.max_per_ip {
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_user;

    #[tokio::test]
    async fn user_repo_email_lookup_ignores_case() {
        let user = create_test_user(|u| u.email = "mixed@example.com".into());
        let repo = InMemoryUserRepo::with_users(vec![user.clone()]);

        let found = repo.get_by_email("MIXED@Example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn save_unknown_user_is_not_found() {
        let repo = InMemoryUserRepo::new();
        let err = repo.save(&create_test_user(|_| {})).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(repo.save_count(), 0);
    }

    #[tokio::test]
    async fn rate_limiter_blocks_after_limit() {
        let limiter = InMemoryRateLimiter::new(2);
        assert!(limiter.check("1.2.3.4").await.is_ok());
        assert!(limiter.check("1.2.3.4").await.is_ok());
        assert!(matches!(
            limiter.check("1.2.3.4").await,
            Err(AppError::RateLimited)
        ));
        assert!(limiter.check("5.6.7.8").await.is_ok());
    }
}
