//! Builder for assembling an `AppState` backed entirely by in-memory mocks,
//! for HTTP-level testing of the auth routes.

use std::sync::Arc;

use axum::http::HeaderValue;
use chrono::{TimeZone, Utc};
use secrecy::SecretString;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::{
        jwt::TokenCodec,
        use_cases::{
            auth::AuthUseCases, otp::OtpManager, password_reset::PasswordResetUseCases,
            session::SessionGuard,
        },
    },
    infra::config::AppConfig,
    test_utils::{FixedClock, InMemoryAccountRepo, InMemoryRateLimiter, PlainPasswordHasher, RecordingNotifier},
};

/// Handles to the mocks inside a built `AppState`, so tests can read
/// dispatched codes, drive the clock, or inspect stored accounts.
pub struct TestHarness {
    pub repo: Arc<InMemoryAccountRepo>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<FixedClock>,
    pub codec: TokenCodec,
}

pub struct TestAppStateBuilder {
    identifier_limit: u64,
    password_validation_enabled: bool,
    otp_bypass_code: Option<SecretString>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            identifier_limit: u64::MAX,
            password_validation_enabled: false,
            otp_bypass_code: None,
        }
    }

    pub fn with_identifier_limit(mut self, limit: u64) -> Self {
        self.identifier_limit = limit;
        self
    }

    pub fn with_password_validation(mut self) -> Self {
        self.password_validation_enabled = true;
        self
    }

    pub fn with_otp_bypass_code(mut self, code: &str) -> Self {
        self.otp_bypass_code = Some(SecretString::new(code.into()));
        self
    }

    pub fn build(self) -> (AppState, TestHarness) {
        let repo = Arc::new(InMemoryAccountRepo::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        ));
        let hasher = Arc::new(PlainPasswordHasher);

        let codec = TokenCodec::new(
            SecretString::new("test-secret".into()),
            "sesame".to_string(),
            900,
            86_400,
        );

        let otp = OtpManager::new(repo.clone(), clock.clone(), 10, self.otp_bypass_code);
        let reset = PasswordResetUseCases::new(
            repo.clone(),
            hasher.clone(),
            notifier.clone(),
            clock.clone(),
            "https://app.example.com".to_string(),
        );
        let guard = SessionGuard::new(codec.clone(), repo.clone(), clock.clone());
        let auth = AuthUseCases::new(
            repo.clone(),
            hasher,
            notifier.clone(),
            otp,
            reset,
            codec.clone(),
            clock.clone(),
            self.password_validation_enabled,
        );

        let config = AppConfig {
            jwt_secret: SecretString::new("test-secret".into()),
            jwt_issuer: "sesame".to_string(),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 86_400,
            otp_ttl_minutes: 10,
            otp_bypass_code: None,
            password_validation_enabled: self.password_validation_enabled,
            app_origin: Url::parse("https://app.example.com").unwrap(),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            database_url: String::new(),
            redis_url: String::new(),
            rate_limit_window_secs: 60,
            rate_limit_per_ip: u64::MAX,
            rate_limit_per_identifier: self.identifier_limit,
            trust_proxy: false,
            resend_api_key: SecretString::new("test-key".into()),
            email_from: "noreply@example.com".to_string(),
            sms_gateway_url: Url::parse("https://sms.example.invalid/send").unwrap(),
            sms_gateway_key: SecretString::new("test-key".into()),
        };

        let app_state = AppState {
            config: Arc::new(config),
            auth: Arc::new(auth),
            guard: Arc::new(guard),
            rate_limiter: Arc::new(InMemoryRateLimiter::new(u64::MAX, self.identifier_limit)),
        };

        let harness = TestHarness {
            repo,
            notifier,
            clock,
            codec,
        };

        (app_state, harness)
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
