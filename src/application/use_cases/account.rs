use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::app_error::AppResult;
use crate::domain::entities::account::{Account, OtpChannel};

/// Fields required to create a new account. Status starts `Inactive`;
/// verification flags start false.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub password_salt: String,
    pub is_admin: bool,
}

/// Keyed account store. The engine owns no persistence of its own; every
/// durable state change goes through one of these narrow transitions, each of
/// which the backing store applies as a single atomic document update.
#[async_trait]
pub trait AccountRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Account>>;
    async fn get_by_email(&self, email: &str) -> AppResult<Option<Account>>;
    async fn get_by_phone(&self, phone: &str) -> AppResult<Option<Account>>;
    async fn create(&self, new: NewAccount) -> AppResult<Account>;

    /// Store a fresh OTP: code, expiry and channel, with the attempt counter
    /// reset to zero.
    async fn store_otp(
        &self,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
        channel: OtpChannel,
    ) -> AppResult<()>;

    async fn bump_otp_attempts(&self, id: Uuid, attempts: i32) -> AppResult<()>;

    /// Clear the code and expiry and reset attempts. The channel is kept so
    /// the caller still knows which contact point was being verified.
    async fn clear_otp(&self, id: Uuid) -> AppResult<()>;

    /// Flip the account to `Active` and mark the given channel verified.
    async fn activate(
        &self,
        id: Uuid,
        channel: OtpChannel,
        verified_at: DateTime<Utc>,
    ) -> AppResult<Account>;

    async fn store_access_token(&self, id: Uuid, token: &str) -> AppResult<()>;

    /// Clear the stored token reference and advance the revocation watermark.
    async fn revoke_sessions(&self, id: Uuid, revoked_at: DateTime<Utc>) -> AppResult<()>;

    async fn store_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Look up the account whose stored reset-token hash matches and whose
    /// expiry is still in the future.
    async fn get_by_active_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Account>>;

    /// Set the new password, clear the reset-token fields and advance the
    /// revocation watermark in one update, conditional on the stored hash
    /// still matching. Returns false when a concurrent consumer already
    /// cleared the token.
    async fn consume_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        password_hash: &str,
        password_salt: &str,
        revoked_at: DateTime<Utc>,
    ) -> AppResult<bool>;

    async fn replace_password(
        &self,
        id: Uuid,
        password_hash: &str,
        password_salt: &str,
    ) -> AppResult<()>;
}

#[derive(Debug, Clone)]
pub struct PasswordCredential {
    pub hash: String,
    pub salt: String,
}

/// One-way password hashing primitive. The hash embeds its parameters; the
/// salt is also returned separately because the account record stores both.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> AppResult<PasswordCredential>;
    fn verify(&self, plaintext: &str, hash: &str) -> AppResult<bool>;
}
