use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::account::AccountRepo;
use crate::domain::entities::account::{OtpChannel, OtpState};
use crate::infra::clock::Clock;

/// A code survives at most five submissions before a fresh one is required.
pub const MAX_OTP_ATTEMPTS: i32 = 5;
/// Minimum gap between issuing codes for the same account.
pub const RESEND_COOLDOWN_SECS: i64 = 60;

#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues, verifies and re-issues one-time verification codes. All durable
/// state lives in the account record; expiry is checked lazily against the
/// injected clock at verification time.
#[derive(Clone)]
pub struct OtpManager {
    accounts: Arc<dyn AccountRepo>,
    clock: Arc<dyn Clock>,
    ttl_minutes: i64,
    /// Development/test escape hatch: a code that always verifies. Must never
    /// be set in production.
    bypass_code: Option<SecretString>,
}

impl OtpManager {
    pub fn new(
        accounts: Arc<dyn AccountRepo>,
        clock: Arc<dyn Clock>,
        ttl_minutes: i64,
        bypass_code: Option<SecretString>,
    ) -> Self {
        Self {
            accounts,
            clock,
            ttl_minutes,
            bypass_code,
        }
    }

    /// Generate and store a fresh code for the account. The raw code is
    /// returned to the caller for out-of-band delivery and is never exposed
    /// past the orchestrator.
    #[instrument(skip(self))]
    pub async fn create(&self, account_id: Uuid, channel: OtpChannel) -> AppResult<IssuedOtp> {
        let code = generate_code();
        let expires_at = self.clock.now() + Duration::minutes(self.ttl_minutes);

        self.accounts
            .store_otp(account_id, &code, expires_at, channel)
            .await?;

        Ok(IssuedOtp { code, expires_at })
    }

    /// Verify a submitted code. On success the OTP state is cleared so the
    /// code can never be consumed twice.
    #[instrument(skip(self, submitted))]
    pub async fn verify(&self, account_id: Uuid, submitted: &str) -> AppResult<()> {
        let account = self
            .accounts
            .get_by_id(account_id)
            .await?
            .ok_or(AppError::AccountNotFound)?;

        if let Some(bypass) = &self.bypass_code
            && bypass.expose_secret() == submitted
        {
            self.accounts.clear_otp(account_id).await?;
            return Ok(());
        }

        let OtpState::Pending {
            code,
            expires_at,
            attempts,
            ..
        } = account.otp()
        else {
            return Err(AppError::NoActiveOtp);
        };

        if self.clock.now() > expires_at {
            return Err(AppError::OtpExpired);
        }

        if attempts >= MAX_OTP_ATTEMPTS {
            return Err(AppError::TooManyAttempts);
        }

        if code != submitted {
            self.accounts
                .bump_otp_attempts(account_id, attempts + 1)
                .await?;
            // The submission that exhausts the budget reports the lockout,
            // not a zero-attempts-remaining mismatch.
            if attempts + 1 >= MAX_OTP_ATTEMPTS {
                return Err(AppError::TooManyAttempts);
            }
            let remaining = (MAX_OTP_ATTEMPTS - 1 - attempts).max(0) as u32;
            return Err(AppError::OtpMismatch { remaining });
        }

        self.accounts.clear_otp(account_id).await?;
        Ok(())
    }

    /// Re-issue a code on the account's existing channel, rejecting requests
    /// made within the cool-down window of the current code's creation.
    #[instrument(skip(self))]
    pub async fn resend(&self, account_id: Uuid) -> AppResult<IssuedOtp> {
        let account = self
            .accounts
            .get_by_id(account_id)
            .await?
            .ok_or(AppError::AccountNotFound)?;

        if let Some(expires_at) = account.otp_expires_at {
            // The creation instant is not stored; recover it from the expiry.
            let created_at = expires_at - Duration::minutes(self.ttl_minutes);
            let elapsed = (self.clock.now() - created_at).num_seconds();
            if elapsed < RESEND_COOLDOWN_SECS {
                return Err(AppError::ResendTooSoon {
                    wait_secs: RESEND_COOLDOWN_SECS - elapsed,
                });
            }
        }

        let channel = account.otp_channel.unwrap_or(OtpChannel::Email);
        self.create(account_id, channel).await
    }
}

/// Six decimal digits, 100000-999999. Unpredictability beyond what a
/// short-lived, attempt-limited secret needs is not required.
fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}
