use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

use crate::application::span::parse_span;

/// Process configuration, read once at startup and passed by value into the
/// components that need it. No ambient globals.
pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub jwt_issuer: String,
    /// Access-token lifetime in seconds, parsed from a span string ("1d").
    pub access_token_ttl_secs: i64,
    /// Refresh-token lifetime in seconds, parsed from a span string ("30d").
    pub refresh_token_ttl_secs: i64,
    pub otp_ttl_minutes: i64,
    /// Code that always verifies. Development/test escape hatch; leave unset
    /// in production.
    pub otp_bypass_code: Option<SecretString>,
    /// Enforce password-strength rules at registration.
    pub password_validation_enabled: bool,
    /// Base URL embedded in reset links.
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub redis_url: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_per_ip: u64,
    pub rate_limit_per_identifier: u64,
    /// Whether to trust X-Forwarded-For headers. Set to true when behind a reverse proxy.
    /// SECURITY: Only enable this when the API is not directly exposed to the internet.
    pub trust_proxy: bool,
    pub resend_api_key: SecretString,
    pub email_from: String,
    pub sms_gateway_url: Url,
    pub sms_gateway_key: SecretString,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret: SecretString = SecretString::new(get_env::<String>("JWT_SECRET").into());
        let jwt_issuer: String = get_env_default("JWT_ISSUER", "sesame".to_string());

        let access_span: String = get_env_default("ACCESS_TOKEN_TTL", "1d".to_string());
        let access_token_ttl_secs = parse_span(&access_span)
            .unwrap_or_else(|| panic!("ACCESS_TOKEN_TTL is not a valid span: {access_span}"));
        let refresh_span: String = get_env_default("REFRESH_TOKEN_TTL", "30d".to_string());
        let refresh_token_ttl_secs = parse_span(&refresh_span)
            .unwrap_or_else(|| panic!("REFRESH_TOKEN_TTL is not a valid span: {refresh_span}"));

        let otp_ttl_minutes: i64 = get_env_default("OTP_TTL_MINUTES", 10);
        let otp_bypass_code: Option<SecretString> = std::env::var("OTP_BYPASS_CODE")
            .ok()
            .filter(|v| !v.is_empty())
            .map(|v| SecretString::new(v.into()));
        let password_validation_enabled: bool =
            get_env_default("PASSWORD_VALIDATION_ENABLED", false);

        let app_origin: Url = get_env("APP_ORIGIN");
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");

        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");
        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());
        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 60);
        let rate_limit_per_ip: u64 = get_env_default("RATE_LIMIT_PER_IP", 60);
        let rate_limit_per_identifier: u64 = get_env_default("RATE_LIMIT_PER_IDENTIFIER", 10);
        // Default to false for security - must explicitly enable when behind a trusted proxy
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);

        let resend_api_key: SecretString =
            SecretString::new(get_env::<String>("RESEND_API_KEY").into());
        let email_from: String = get_env("EMAIL_FROM");
        let sms_gateway_url: Url = get_env("SMS_GATEWAY_URL");
        let sms_gateway_key: SecretString =
            SecretString::new(get_env::<String>("SMS_GATEWAY_KEY").into());

        Self {
            jwt_secret,
            jwt_issuer,
            access_token_ttl_secs,
            refresh_token_ttl_secs,
            otp_ttl_minutes,
            otp_bypass_code,
            password_validation_enabled,
            app_origin,
            cors_origin,
            bind_addr,
            database_url,
            redis_url,
            rate_limit_window_secs,
            rate_limit_per_ip,
            rate_limit_per_identifier,
            trust_proxy,
            resend_api_key,
            email_from,
            sms_gateway_url,
            sms_gateway_key,
        }
    }
}
