//! Test app state builder for HTTP-level testing.
//!
//! `TestAppStateBuilder` creates an `AppState` whose every port is an in-memory
//! mock, and can hand those mocks back so route tests can seed and inspect them.

use std::sync::Arc;

use axum::http::HeaderValue;
use graphx_types::PlanPricing;
use secrecy::SecretString;
use time::Duration;

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::{
        chart::ChartUseCases, subscription::SubscriptionUseCases, user::AuthUseCases,
    },
    domain::entities::user::User,
    infra::{config::AppConfig, rate_limit::RateLimiterTrait},
    test_utils::{
        FakeIdentityProvider, FakePaymentGateway, InMemoryChartRepo, InMemoryEmailSender,
        InMemoryOAuthStateStore, InMemoryPaymentRepo, InMemoryRateLimiter, InMemoryUserRepo,
        PlainPasswordHasher, RecordingChartRenderer, TEST_JWT_SECRET,
    },
};

/// Config used by every test state. Only the fields routes read matter.
pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
        session_ttl: Duration::hours(1),
        cookie_secure: false,
        frontend_url: "http://localhost:3000".parse().unwrap(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        redis_url: "redis://127.0.0.1:6379".to_string(),
        rate_limit_window_secs: 900,
        rate_limit_per_ip: 100,
        database_url: "postgres://localhost/graphx_test".to_string(),
        trust_proxy: false,
        razorpay_key_id: "rzp_test_key".to_string(),
        razorpay_key_secret: SecretString::new("fake_gateway_secret".into()),
        google_client_id: "test-client".to_string(),
        google_client_secret: SecretString::new("test-secret".into()),
        google_callback_url: "http://localhost:3001/auth/google/callback".to_string(),
        resend_api_key: SecretString::new("re_test".into()),
        email_from: "Graph-X <no-reply@graphx.test>".to_string(),
        chart_renderer_url: "https://quickchart.test".parse().unwrap(),
        pricing: PlanPricing::default(),
    }
}

/// Handles to the mocks behind a built `AppState`.
pub struct TestMocks {
    pub users: Arc<InMemoryUserRepo>,
    pub payments: Arc<InMemoryPaymentRepo>,
    pub gateway: Arc<FakePaymentGateway>,
    pub email: Arc<InMemoryEmailSender>,
    pub oauth_states: Arc<InMemoryOAuthStateStore>,
    pub identity: Arc<FakeIdentityProvider>,
    pub charts: Arc<InMemoryChartRepo>,
    pub renderer: Arc<RecordingChartRenderer>,
}

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let user = create_test_user(|u| u.email = "ada@example.com".into());
/// let (app_state, mocks) = TestAppStateBuilder::new().with_user(user).build_with_mocks();
/// ```
pub struct TestAppStateBuilder {
    users: Vec<User>,
    rate_limiter: Option<Arc<dyn RateLimiterTrait>>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            users: vec![],
            rate_limiter: None,
        }
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiterTrait>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    pub fn build(self) -> AppState {
        self.build_with_mocks().0
    }

    pub fn build_with_mocks(self) -> (AppState, TestMocks) {
        let config = test_config();
        let app_origin = config.frontend_base();

        let mocks = TestMocks {
            users: Arc::new(InMemoryUserRepo::with_users(self.users)),
            payments: Arc::new(InMemoryPaymentRepo::new()),
            gateway: Arc::new(FakePaymentGateway::new()),
            email: Arc::new(InMemoryEmailSender::new()),
            oauth_states: Arc::new(InMemoryOAuthStateStore::new()),
            identity: Arc::new(FakeIdentityProvider::new()),
            charts: Arc::new(InMemoryChartRepo::new()),
            renderer: Arc::new(RecordingChartRenderer::new()),
        };

        let auth_use_cases = AuthUseCases::new(
            mocks.users.clone(),
            mocks.email.clone(),
            Arc::new(PlainPasswordHasher),
            mocks.identity.clone(),
            mocks.oauth_states.clone(),
            app_origin.clone(),
        );
        let subscription_use_cases = SubscriptionUseCases::new(
            mocks.users.clone(),
            mocks.payments.clone(),
            mocks.gateway.clone(),
            mocks.email.clone(),
            config.pricing.clone(),
            app_origin,
        );
        let chart_use_cases = ChartUseCases::new(mocks.charts.clone(), mocks.renderer.clone());

        let app_state = AppState {
            config: Arc::new(config),
            auth_use_cases: Arc::new(auth_use_cases),
            subscription_use_cases: Arc::new(subscription_use_cases),
            chart_use_cases: Arc::new(chart_use_cases),
            rate_limiter: self
                .rate_limiter
                .unwrap_or_else(|| Arc::new(InMemoryRateLimiter::permissive())),
        };
        (app_state, mocks)
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
