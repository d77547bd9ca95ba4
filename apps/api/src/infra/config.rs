use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use graphx_types::PlanPricing;
use rust_decimal::Decimal;
use secrecy::SecretString;
use time::Duration;
use url::Url;

pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub session_ttl: Duration,
    /// Marks the session cookie `Secure` with `SameSite=None`. Enable behind HTTPS.
    pub cookie_secure: bool,
    /// Where the browser lands after OAuth and where email links point.
    pub frontend_url: Url,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
    pub redis_url: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_per_ip: u64,
    pub database_url: String,
    /// Whether to trust X-Forwarded-For headers. Set to true when behind a reverse proxy.
    /// SECURITY: Only enable this when the API is not directly exposed to the internet.
    pub trust_proxy: bool,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: SecretString,
    pub google_client_id: String,
    pub google_client_secret: SecretString,
    pub google_callback_url: String,
    pub resend_api_key: SecretString,
    pub email_from: String,
    pub chart_renderer_url: Url,
    pub pricing: PlanPricing,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret = SecretString::new(get_env::<String>("JWT_SECRET").into());
        let session_ttl_secs: i64 = get_env_default("SESSION_TTL_SECS", 86_400);
        let cookie_secure: bool = get_env_default("COOKIE_SECURE", false);

        let frontend_url: Url =
            get_env_default("FRONTEND_URL", "http://localhost:3000".parse().unwrap());
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", frontend_url.origin().ascii_serialization())
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");

        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());
        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());
        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 900);
        let rate_limit_per_ip: u64 = get_env_default("RATE_LIMIT_PER_IP", 100);
        let database_url: String = get_env("DATABASE_URL");
        // Default to false for security - must explicitly enable when behind a trusted proxy
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);

        let razorpay_key_id: String = get_env("RAZORPAY_KEY_ID");
        let razorpay_key_secret = SecretString::new(get_env::<String>("RAZORPAY_KEY_SECRET").into());
        let google_client_id: String = get_env("GOOGLE_CLIENT_ID");
        let google_client_secret =
            SecretString::new(get_env::<String>("GOOGLE_CLIENT_SECRET").into());
        let google_callback_url: String = get_env_default(
            "GOOGLE_CALLBACK_URL",
            "http://localhost:3001/auth/google/callback".to_string(),
        );
        let resend_api_key = SecretString::new(get_env::<String>("RESEND_API_KEY").into());
        let email_from: String =
            get_env_default("EMAIL_FROM", "Graph-X <no-reply@graphx.app>".to_string());
        let chart_renderer_url: Url = get_env_default(
            "CHART_RENDERER_URL",
            "https://quickchart.io".parse().unwrap(),
        );

        let defaults = PlanPricing::default();
        let pricing = PlanPricing {
            professional: get_env_default::<Decimal>("PRICE_PROFESSIONAL", defaults.professional),
            enterprise: get_env_default::<Decimal>("PRICE_ENTERPRISE", defaults.enterprise),
            upgrade_fee: get_env_default::<Decimal>("PRICE_UPGRADE_FEE", defaults.upgrade_fee),
            enterprise_switch_minimum: get_env_default::<Decimal>(
                "PRICE_ENTERPRISE_MIN_SWITCH",
                defaults.enterprise_switch_minimum,
            ),
            currency: defaults.currency,
        };

        Self {
            jwt_secret,
            session_ttl: Duration::seconds(session_ttl_secs),
            cookie_secure,
            frontend_url,
            cors_origin,
            bind_addr,
            redis_url,
            rate_limit_window_secs,
            rate_limit_per_ip,
            database_url,
            trust_proxy,
            razorpay_key_id,
            razorpay_key_secret,
            google_client_id,
            google_client_secret,
            google_callback_url,
            resend_api_key,
            email_from,
            chart_renderer_url,
            pricing,
        }
    }

    /// Frontend URL without a trailing slash, for building redirects.
    pub fn frontend_base(&self) -> String {
        self.frontend_url.as_str().trim_end_matches('/').to_string()
    }
}
