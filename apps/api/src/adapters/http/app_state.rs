use std::sync::Arc;

use crate::{
    infra::{config::AppConfig, rate_limit::RateLimiterTrait},
    use_cases::{chart::ChartUseCases, subscription::SubscriptionUseCases, user::AuthUseCases},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_use_cases: Arc<AuthUseCases>,
    pub subscription_use_cases: Arc<SubscriptionUseCases>,
    pub chart_use_cases: Arc<ChartUseCases>,
    pub rate_limiter: Arc<dyn RateLimiterTrait>,
}
