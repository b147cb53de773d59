use std::sync::Arc;

use base64::Engine;
use chrono::Duration;
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::account::{AccountRepo, PasswordHasher};
use crate::application::use_cases::notify::{NotificationDispatch, TemplateKey};
use crate::domain::entities::account::AccountStatus;
use crate::infra::clock::Clock;

/// Reset tokens live for one hour.
pub const RESET_TOKEN_TTL_SECS: i64 = 3600;

/// Returned for every reset request, whether or not the email is known.
const GENERIC_RESET_MESSAGE: &str =
    "If an account exists for this email, a reset link has been sent.";

#[derive(Debug, Clone, Serialize)]
pub struct ResetRequested {
    pub message: &'static str,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetCompleted {
    pub message: &'static str,
    pub success: bool,
}

/// Single-use, hashed, time-bound password-reset tokens, plus the
/// authenticated change-password path.
#[derive(Clone)]
pub struct PasswordResetUseCases {
    accounts: Arc<dyn AccountRepo>,
    hasher: Arc<dyn PasswordHasher>,
    notifier: Arc<dyn NotificationDispatch>,
    clock: Arc<dyn Clock>,
    app_origin: String,
}

impl PasswordResetUseCases {
    pub fn new(
        accounts: Arc<dyn AccountRepo>,
        hasher: Arc<dyn PasswordHasher>,
        notifier: Arc<dyn NotificationDispatch>,
        clock: Arc<dyn Clock>,
        app_origin: String,
    ) -> Self {
        Self {
            accounts,
            hasher,
            notifier,
            clock,
            app_origin,
        }
    }

    /// Issue a reset token for an active account. The response is identical
    /// whether or not the email resolves to an account, so callers cannot
    /// probe for registered addresses. Only the SHA-256 of the token is
    /// stored; the raw value goes out via notification dispatch.
    #[instrument(skip(self))]
    pub async fn request(&self, email: &str) -> AppResult<ResetRequested> {
        let generic = ResetRequested {
            message: GENERIC_RESET_MESSAGE,
            email: email.to_string(),
        };

        let account = match self.accounts.get_by_email(email).await? {
            Some(account) if account.status == AccountStatus::Active => account,
            _ => return Ok(generic),
        };

        let raw_token = generate_reset_token();
        let token_hash = hash_reset_token(&raw_token);
        let expires_at = self.clock.now() + Duration::seconds(RESET_TOKEN_TTL_SECS);

        self.accounts
            .store_reset_token(account.id, &token_hash, expires_at)
            .await?;

        let reset_link = format!(
            "{}/auth/reset-password?token={}",
            self.app_origin.trim_end_matches('/'),
            raw_token
        );
        let payload = json!({
            "reset_link": reset_link,
            "expires_in_minutes": RESET_TOKEN_TTL_SECS / 60,
        });

        if let Err(err) = self
            .notifier
            .send_templated(TemplateKey::PasswordReset, payload, &account.email, account.id)
            .await
        {
            tracing::warn!(account_id = %account.id, error = %err, "Reset email dispatch failed");
        }

        Ok(generic)
    }

    /// Consume a reset token: set the new password, clear the token fields
    /// and revoke all existing sessions in one update. A second submission of
    /// the same token finds no matching hash and fails.
    #[instrument(skip_all)]
    pub async fn consume(&self, raw_token: &str, new_password: &str) -> AppResult<ResetCompleted> {
        let token_hash = hash_reset_token(raw_token);
        let now = self.clock.now();

        let account = self
            .accounts
            .get_by_active_reset_token(&token_hash, now)
            .await?
            .ok_or(AppError::ResetTokenInvalid)?;

        let credential = self.hasher.hash(new_password)?;
        let consumed = self
            .accounts
            .consume_reset_token(
                account.id,
                &token_hash,
                &credential.hash,
                &credential.salt,
                now,
            )
            .await?;
        if !consumed {
            // A concurrent consumer won the conditional update.
            return Err(AppError::ResetTokenInvalid);
        }

        self.notify_password_changed(&account.email, account.id).await;

        Ok(ResetCompleted {
            message: "Your password has been reset.",
            success: true,
        })
    }

    /// Authenticated password change. Does not revoke existing sessions: the
    /// caller already holds a valid one.
    #[instrument(skip(self, old_password, new_password))]
    pub async fn change(
        &self,
        account_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<ResetCompleted> {
        let account = self
            .accounts
            .get_by_id(account_id)
            .await?
            .ok_or(AppError::AccountNotFound)?;

        if !self.hasher.verify(old_password, &account.password_hash)? {
            return Err(AppError::OldPasswordMismatch);
        }

        let credential = self.hasher.hash(new_password)?;
        self.accounts
            .replace_password(account.id, &credential.hash, &credential.salt)
            .await?;

        self.notify_password_changed(&account.email, account.id).await;

        Ok(ResetCompleted {
            message: "Your password has been changed.",
            success: true,
        })
    }

    async fn notify_password_changed(&self, email: &str, account_id: Uuid) {
        if let Err(err) = self
            .notifier
            .send_templated(TemplateKey::PasswordChanged, json!({}), email, account_id)
            .await
        {
            tracing::warn!(account_id = %account_id, error = %err, "Confirmation email dispatch failed");
        }
    }
}

/// 32 bytes from the OS RNG, base64url-encoded: 256 bits of entropy.
fn generate_reset_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn hash_reset_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
