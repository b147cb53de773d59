use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::jwt::{TokenCodec, TokenPair};
use crate::application::use_cases::account::{AccountRepo, NewAccount, PasswordHasher};
use crate::application::use_cases::notify::NotificationDispatch;
use crate::application::use_cases::otp::OtpManager;
use crate::application::use_cases::password_reset::{
    PasswordResetUseCases, ResetCompleted, ResetRequested,
};
use crate::application::validators::password_strength_errors;
use crate::domain::entities::account::{Account, AccountStatus, OtpChannel};
use crate::infra::clock::Clock;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub phone: String,
    pub password: String,
    pub otp_channel: Option<OtpChannel>,
}

#[derive(Debug)]
pub struct RegisterOutcome {
    pub account: Account,
    pub requires_verification: bool,
    pub message: &'static str,
}

#[derive(Debug)]
pub struct AuthenticatedOutcome {
    pub account: Account,
    pub tokens: TokenPair,
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoutOutcome {
    pub message: &'static str,
}

/// Composes the OTP manager, token codec and reset flow into the public
/// authentication operations, enforcing the account state machine:
/// `Inactive --[OTP success]--> Active`, and nothing else.
#[derive(Clone)]
pub struct AuthUseCases {
    accounts: Arc<dyn AccountRepo>,
    hasher: Arc<dyn PasswordHasher>,
    notifier: Arc<dyn NotificationDispatch>,
    otp: OtpManager,
    reset: PasswordResetUseCases,
    codec: TokenCodec,
    clock: Arc<dyn Clock>,
    password_validation_enabled: bool,
}

impl AuthUseCases {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        accounts: Arc<dyn AccountRepo>,
        hasher: Arc<dyn PasswordHasher>,
        notifier: Arc<dyn NotificationDispatch>,
        otp: OtpManager,
        reset: PasswordResetUseCases,
        codec: TokenCodec,
        clock: Arc<dyn Clock>,
        password_validation_enabled: bool,
    ) -> Self {
        Self {
            accounts,
            hasher,
            notifier,
            otp,
            reset,
            codec,
            clock,
            password_validation_enabled,
        }
    }

    /// Create an inactive account and send a verification code on the
    /// requested channel. Uniqueness violations are visible by design here;
    /// this is the one flow where "that identifier is taken" is the point.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> AppResult<RegisterOutcome> {
        if self.password_validation_enabled {
            let errors = password_strength_errors(&input.password);
            if !errors.is_empty() {
                return Err(AppError::InvalidInput(format!(
                    "password {}",
                    errors.join(", ")
                )));
            }
        }

        if self.accounts.get_by_email(&input.email).await?.is_some() {
            return Err(AppError::EmailTaken);
        }
        if self.accounts.get_by_phone(&input.phone).await?.is_some() {
            return Err(AppError::PhoneTaken);
        }

        let credential = self.hasher.hash(&input.password)?;
        let account = self
            .accounts
            .create(NewAccount {
                email: input.email,
                phone: input.phone,
                password_hash: credential.hash,
                password_salt: credential.salt,
                is_admin: false,
            })
            .await?;

        let channel = input.otp_channel.unwrap_or(OtpChannel::Email);
        let issued = self.otp.create(account.id, channel).await?;
        self.dispatch_otp(&account, channel, &issued.code).await;

        // Reload so the returned record carries the OTP bookkeeping fields.
        let account = self
            .accounts
            .get_by_id(account.id)
            .await?
            .ok_or(AppError::AccountNotFound)?;

        Ok(RegisterOutcome {
            account,
            requires_verification: true,
            message: "Registration successful. Check your email or phone for the verification code.",
        })
    }

    /// Consume the pending OTP, activate the account, and hand back a first
    /// token pair.
    #[instrument(skip(self, code))]
    pub async fn verify_otp(&self, account_id: Uuid, code: &str) -> AppResult<AuthenticatedOutcome> {
        self.otp.verify(account_id, code).await?;

        let account = self
            .accounts
            .get_by_id(account_id)
            .await?
            .ok_or(AppError::AccountNotFound)?;

        let channel = account.otp_channel.unwrap_or(OtpChannel::Email);
        let account = self
            .accounts
            .activate(account_id, channel, self.clock.now())
            .await?;

        let tokens = self.issue_and_store(&account).await?;

        Ok(AuthenticatedOutcome {
            account,
            tokens,
            message: "Account verified.",
        })
    }

    /// Issue a replacement OTP for a not-yet-verified account.
    #[instrument(skip(self))]
    pub async fn resend_otp(&self, account_id: Uuid) -> AppResult<&'static str> {
        let account = self
            .accounts
            .get_by_id(account_id)
            .await?
            .ok_or(AppError::AccountNotFound)?;

        if account.status == AccountStatus::Active {
            return Err(AppError::AlreadyVerified);
        }

        let issued = self.otp.resend(account_id).await?;
        let channel = account.otp_channel.unwrap_or(OtpChannel::Email);
        self.dispatch_otp(&account, channel, &issued.code).await;

        Ok("A new verification code has been sent.")
    }

    /// Password login. Unknown identifier and wrong password produce the same
    /// error so callers cannot enumerate accounts.
    #[instrument(skip(self, password))]
    pub async fn login(&self, identifier: &str, password: &str) -> AppResult<AuthenticatedOutcome> {
        // Fixed heuristic: an "@" means email, anything else is a phone.
        let account = if identifier.contains('@') {
            self.accounts.get_by_email(identifier).await?
        } else {
            self.accounts.get_by_phone(identifier).await?
        };

        let Some(account) = account else {
            return Err(AppError::InvalidCredentials);
        };

        if account.status != AccountStatus::Active {
            return Err(AppError::AccountNotVerified);
        }

        if !self.hasher.verify(password, &account.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        let tokens = self.issue_and_store(&account).await?;

        Ok(AuthenticatedOutcome {
            account,
            tokens,
            message: "Signed in.",
        })
    }

    /// Exchange a refresh token for a fresh pair. Every failure mode —
    /// bad signature, expiry, unknown subject, inactive account — collapses
    /// into `TokenInvalid` so the response leaks nothing about account state.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.codec.verify_refresh(refresh_token, self.clock.now())?;
        let id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::TokenInvalid)?;

        let Some(account) = self.accounts.get_by_id(id).await? else {
            return Err(AppError::TokenInvalid);
        };

        if account.status != AccountStatus::Active {
            return Err(AppError::TokenInvalid);
        }

        self.issue_and_store(&account).await
    }

    /// Drop the stored token reference and advance the revocation watermark,
    /// invalidating every token issued before this instant.
    #[instrument(skip(self))]
    pub async fn logout(&self, account_id: Uuid) -> AppResult<LogoutOutcome> {
        self.accounts
            .revoke_sessions(account_id, self.clock.now())
            .await?;

        Ok(LogoutOutcome {
            message: "Signed out.",
        })
    }

    pub async fn forgot_password(&self, email: &str) -> AppResult<ResetRequested> {
        self.reset.request(email).await
    }

    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> AppResult<ResetCompleted> {
        self.reset.consume(token, new_password).await
    }

    pub async fn change_password(
        &self,
        account_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<ResetCompleted> {
        self.reset
            .change(account_id, old_password, new_password)
            .await
    }

    async fn issue_and_store(&self, account: &Account) -> AppResult<TokenPair> {
        let tokens = self.codec.issue_pair(account, self.clock.now())?;
        self.accounts
            .store_access_token(account.id, &tokens.access_token)
            .await?;
        Ok(tokens)
    }

    /// Best-effort delivery: the code is considered issued even if the
    /// message never leaves the building.
    async fn dispatch_otp(&self, account: &Account, channel: OtpChannel, code: &str) {
        let recipient = match channel {
            OtpChannel::Email => account.email.as_str(),
            OtpChannel::Sms => account.phone.as_str(),
        };
        if let Err(err) = self
            .notifier
            .send_otp(channel, recipient, code, account.id)
            .await
        {
            tracing::warn!(account_id = %account.id, %channel, error = %err, "OTP dispatch failed");
        }
    }
}
