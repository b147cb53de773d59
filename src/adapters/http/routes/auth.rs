//! Authentication routes: registration, OTP verification, login, token
//! refresh, logout and the password-reset flows.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt::TokenPair,
    application::use_cases::auth::RegisterInput,
    application::validators::{is_valid_email, is_valid_phone},
    domain::entities::account::{Account, AccountStatus, OtpChannel},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify-otp", post(verify_otp))
        .route("/resend-otp", post(resend_otp))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/change-password", post(change_password))
        .route("/me", get(me))
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Deserialize)]
struct RegisterPayload {
    email: String,
    phone: String,
    password: String,
    otp_channel: Option<OtpChannel>,
}

#[derive(Deserialize)]
struct VerifyOtpPayload {
    account_id: Uuid,
    code: String,
}

#[derive(Deserialize)]
struct ResendOtpPayload {
    account_id: Uuid,
}

#[derive(Deserialize)]
struct LoginPayload {
    identifier: String,
    password: String,
}

#[derive(Deserialize)]
struct RefreshPayload {
    refresh_token: String,
}

#[derive(Deserialize)]
struct ForgotPasswordPayload {
    email: String,
}

#[derive(Deserialize)]
struct ResetPasswordPayload {
    token: String,
    password: String,
}

#[derive(Deserialize)]
struct ChangePasswordPayload {
    old_password: String,
    new_password: String,
}

/// Public projection of an account. Credential material, OTP state and the
/// stored token reference never leave the service.
#[derive(Serialize)]
struct AccountResponse {
    id: Uuid,
    email: String,
    phone: String,
    status: AccountStatus,
    email_verified: bool,
    email_verified_at: Option<DateTime<Utc>>,
    phone_verified: bool,
    phone_verified_at: Option<DateTime<Utc>>,
    is_admin: bool,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            phone: account.phone.clone(),
            status: account.status,
            email_verified: account.email_verified,
            email_verified_at: account.email_verified_at,
            phone_verified: account.phone_verified,
            phone_verified_at: account.phone_verified_at,
            is_admin: account.is_admin,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Serialize)]
struct RegisterResponse {
    account: AccountResponse,
    requires_verification: bool,
    message: &'static str,
}

#[derive(Serialize)]
struct AuthenticatedResponse {
    account: AccountResponse,
    tokens: TokenPair,
    message: &'static str,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> AppResult<impl IntoResponse> {
    let email = payload.email.trim();
    if !is_valid_email(email) {
        return Err(AppError::InvalidInput("Invalid email format".into()));
    }
    let phone = payload.phone.trim();
    if !is_valid_phone(phone) {
        return Err(AppError::InvalidInput("Invalid phone format".into()));
    }

    let outcome = app_state
        .auth
        .register(RegisterInput {
            email: email.to_string(),
            phone: phone.to_string(),
            password: payload.password,
            otp_channel: payload.otp_channel,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            account: AccountResponse::from(&outcome.account),
            requires_verification: outcome.requires_verification,
            message: outcome.message,
        }),
    ))
}

async fn verify_otp(
    State(app_state): State<AppState>,
    Json(payload): Json<VerifyOtpPayload>,
) -> AppResult<impl IntoResponse> {
    let outcome = app_state
        .auth
        .verify_otp(payload.account_id, payload.code.trim())
        .await?;

    Ok(Json(AuthenticatedResponse {
        account: AccountResponse::from(&outcome.account),
        tokens: outcome.tokens,
        message: outcome.message,
    }))
}

async fn resend_otp(
    State(app_state): State<AppState>,
    Json(payload): Json<ResendOtpPayload>,
) -> AppResult<impl IntoResponse> {
    let message = app_state.auth.resend_otp(payload.account_id).await?;
    Ok(Json(MessageResponse { message }))
}

async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> AppResult<impl IntoResponse> {
    // Credential endpoints also bump a per-identifier bucket so one account
    // cannot be brute-forced from many addresses.
    app_state
        .rate_limiter
        .check_identifier(&payload.identifier)
        .await?;

    let outcome = app_state
        .auth
        .login(payload.identifier.trim(), &payload.password)
        .await?;

    Ok(Json(AuthenticatedResponse {
        account: AccountResponse::from(&outcome.account),
        tokens: outcome.tokens,
        message: outcome.message,
    }))
}

async fn refresh(
    State(app_state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> AppResult<impl IntoResponse> {
    let tokens = app_state.auth.refresh(&payload.refresh_token).await?;
    Ok(Json(tokens))
}

async fn logout(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let token = bearer_token(&headers)?;
    let claims = app_state.guard.validate(token).await?;
    let account_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::TokenInvalid)?;

    let outcome = app_state.auth.logout(account_id).await?;
    Ok(Json(outcome))
}

async fn forgot_password(
    State(app_state): State<AppState>,
    Json(payload): Json<ForgotPasswordPayload>,
) -> AppResult<impl IntoResponse> {
    let email = payload.email.trim();
    if !is_valid_email(email) {
        return Err(AppError::InvalidInput("Invalid email format".into()));
    }
    app_state.rate_limiter.check_identifier(email).await?;

    let response = app_state.auth.forgot_password(email).await?;
    Ok(Json(response))
}

async fn reset_password(
    State(app_state): State<AppState>,
    Json(payload): Json<ResetPasswordPayload>,
) -> AppResult<impl IntoResponse> {
    let response = app_state
        .auth
        .reset_password(payload.token.trim(), &payload.password)
        .await?;
    Ok(Json(response))
}

async fn change_password(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordPayload>,
) -> AppResult<impl IntoResponse> {
    let token = bearer_token(&headers)?;
    let claims = app_state.guard.validate(token).await?;
    let account_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::TokenInvalid)?;

    let response = app_state
        .auth
        .change_password(account_id, &payload.old_password, &payload.new_password)
        .await?;
    Ok(Json(response))
}

async fn me(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let token = bearer_token(&headers)?;
    let account = app_state
        .guard
        .resolve_account(token)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    Ok(Json(AccountResponse::from(&account)))
}

fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or(AppError::TokenInvalid)
}
