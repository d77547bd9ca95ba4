use crate::{
    adapters::{email::resend::ResendEmailSender, http::app_state::AppState},
    infra::{
        InfraError,
        config::AppConfig,
        google_identity::GoogleIdentityProvider,
        http_client::try_build_client,
        oauth_state::RedisOAuthStateStore,
        password::Argon2PasswordHasher,
        postgres_persistence,
        quickchart::QuickChartRenderer,
        rate_limit::{RateLimiterTrait, RedisRateLimiter},
        razorpay_client::RazorpayClient,
        redis_manager,
    },
    use_cases::{
        chart::{ChartRepo, ChartUseCases},
        subscription::{PaymentRepo, SubscriptionUseCases},
        user::{AuthUseCases, EmailSender, UserRepo},
    },
};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> Result<AppState, InfraError> {
    let config = AppConfig::from_env();

    let postgres_arc = Arc::new(postgres_persistence(&config.database_url).await?);
    let redis = redis_manager(&config.redis_url).await?;
    let http = try_build_client().map_err(InfraError::HttpClient)?;

    let rate_limiter: Arc<dyn RateLimiterTrait> = Arc::new(RedisRateLimiter::new(
        redis.clone(),
        config.rate_limit_window_secs,
        config.rate_limit_per_ip,
    ));

    let email: Arc<dyn EmailSender> = Arc::new(ResendEmailSender::new(
        http.clone(),
        config.resend_api_key.clone(),
        config.email_from.clone(),
    ));

    let user_repo_arc = postgres_arc.clone() as Arc<dyn UserRepo>;
    let payment_repo_arc = postgres_arc.clone() as Arc<dyn PaymentRepo>;
    let chart_repo_arc = postgres_arc.clone() as Arc<dyn ChartRepo>;
    let app_origin = config.frontend_base();

    let auth_use_cases = AuthUseCases::new(
        user_repo_arc.clone(),
        email.clone(),
        Arc::new(Argon2PasswordHasher),
        Arc::new(GoogleIdentityProvider::new(
            http.clone(),
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.google_callback_url.clone(),
        )),
        Arc::new(RedisOAuthStateStore::new(redis)),
        app_origin.clone(),
    );

    let subscription_use_cases = SubscriptionUseCases::new(
        user_repo_arc,
        payment_repo_arc,
        Arc::new(RazorpayClient::new(
            http.clone(),
            config.razorpay_key_id.clone(),
            config.razorpay_key_secret.clone(),
        )),
        email,
        config.pricing.clone(),
        app_origin,
    );

    let chart_use_cases = ChartUseCases::new(
        chart_repo_arc,
        Arc::new(QuickChartRenderer::new(
            http,
            config.chart_renderer_url.clone(),
        )),
    );

    Ok(AppState {
        config: Arc::new(config),
        auth_use_cases: Arc::new(auth_use_cases),
        subscription_use_cases: Arc::new(subscription_use_cases),
        chart_use_cases: Arc::new(chart_use_cases),
        rate_limiter,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "graphx_api=debug,tower_http=debug".into());

    let console_layer = fmt::layer().with_target(false).with_level(true).pretty();

    // JSON lines for log shipping
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
