use std::sync::Arc;

use crate::{
    application::use_cases::{auth::AuthUseCases, session::SessionGuard},
    infra::{RateLimiterTrait, config::AppConfig},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthUseCases>,
    pub guard: Arc<SessionGuard>,
    pub rate_limiter: Arc<dyn RateLimiterTrait>,
}
