use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{
        http::app_state::AppState, notification::HttpNotifier, persistence::PostgresPersistence,
    },
    application::{
        jwt::TokenCodec,
        use_cases::{
            account::{AccountRepo, PasswordHasher},
            auth::AuthUseCases,
            notify::NotificationDispatch,
            otp::OtpManager,
            password_reset::PasswordResetUseCases,
            session::SessionGuard,
        },
    },
    infra::{
        clock::{Clock, SystemClock},
        config::AppConfig,
        db::init_db,
        password::Argon2PasswordHasher,
        rate_limit::{RateLimiterTrait, RedisRateLimiter},
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let pool = init_db(&config.database_url).await?;
    let accounts = Arc::new(PostgresPersistence::new(pool)) as Arc<dyn AccountRepo>;

    let rate_limiter = Arc::new(
        RedisRateLimiter::new(
            &config.redis_url,
            config.rate_limit_window_secs,
            config.rate_limit_per_ip,
            config.rate_limit_per_identifier,
        )
        .await?,
    ) as Arc<dyn RateLimiterTrait>;

    let notifier = Arc::new(HttpNotifier::new(
        config.resend_api_key.clone(),
        config.email_from.clone(),
        config.sms_gateway_url.clone(),
        config.sms_gateway_key.clone(),
        config.otp_ttl_minutes,
    )) as Arc<dyn NotificationDispatch>;

    let clock = Arc::new(SystemClock) as Arc<dyn Clock>;
    let hasher = Arc::new(Argon2PasswordHasher) as Arc<dyn PasswordHasher>;

    let codec = TokenCodec::new(
        config.jwt_secret.clone(),
        config.jwt_issuer.clone(),
        config.access_token_ttl_secs,
        config.refresh_token_ttl_secs,
    );

    let otp = OtpManager::new(
        accounts.clone(),
        clock.clone(),
        config.otp_ttl_minutes,
        config.otp_bypass_code.clone(),
    );

    let reset = PasswordResetUseCases::new(
        accounts.clone(),
        hasher.clone(),
        notifier.clone(),
        clock.clone(),
        config.app_origin.to_string(),
    );

    let guard = SessionGuard::new(codec.clone(), accounts.clone(), clock.clone());

    let auth = AuthUseCases::new(
        accounts,
        hasher,
        notifier,
        otp,
        reset,
        codec,
        clock,
        config.password_validation_enabled,
    );

    Ok(AppState {
        config: Arc::new(config),
        auth: Arc::new(auth),
        guard: Arc::new(guard),
        rate_limiter,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sesame_auth=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
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
