//! In-memory mock implementations of the engine's collaborator traits.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        account::{AccountRepo, NewAccount, PasswordCredential, PasswordHasher},
        notify::{NotificationDispatch, TemplateKey},
    },
    domain::entities::account::{Account, AccountStatus, OtpChannel},
    infra::{clock::Clock, rate_limit::RateLimiterTrait},
};

// ============================================================================
// InMemoryAccountRepo
// ============================================================================

/// In-memory implementation of `AccountRepo` for testing.
#[derive(Default)]
pub struct InMemoryAccountRepo {
    pub accounts: Mutex<HashMap<Uuid, Account>>,
}

impl InMemoryAccountRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        let map: HashMap<Uuid, Account> = accounts.into_iter().map(|a| (a.id, a)).collect();
        Self {
            accounts: Mutex::new(map),
        }
    }

    /// Directly set the attempt counter, bypassing the repo contract.
    pub fn set_otp_attempts(&self, id: Uuid, attempts: i32) {
        if let Some(account) = self.accounts.lock().unwrap().get_mut(&id) {
            account.otp_attempts = attempts;
        }
    }

    fn update<R>(&self, id: Uuid, f: impl FnOnce(&mut Account) -> R) -> AppResult<R> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts.get_mut(&id).ok_or(AppError::AccountNotFound)?;
        let result = f(account);
        account.updated_at = Some(Utc::now());
        Ok(result)
    }
}

#[async_trait]
impl AccountRepo for InMemoryAccountRepo {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        Ok(self.accounts.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn get_by_phone(&self, phone: &str) -> AppResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.phone == phone)
            .cloned())
    }

    async fn create(&self, new: NewAccount) -> AppResult<Account> {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            email: new.email,
            phone: new.phone,
            password_hash: new.password_hash,
            password_salt: new.password_salt,
            status: AccountStatus::Inactive,
            email_verified: false,
            email_verified_at: None,
            phone_verified: false,
            phone_verified_at: None,
            is_admin: new.is_admin,
            otp_code: None,
            otp_expires_at: None,
            otp_channel: None,
            otp_attempts: 0,
            access_token: None,
            password_reset_token_hash: None,
            password_reset_expires_at: None,
            session_revoked_at: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.accounts
            .lock()
            .unwrap()
            .insert(account.id, account.clone());
        Ok(account)
    }

    async fn store_otp(
        &self,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
        channel: OtpChannel,
    ) -> AppResult<()> {
        self.update(id, |a| {
            a.otp_code = Some(code.to_string());
            a.otp_expires_at = Some(expires_at);
            a.otp_channel = Some(channel);
            a.otp_attempts = 0;
        })
    }

    async fn bump_otp_attempts(&self, id: Uuid, attempts: i32) -> AppResult<()> {
        self.update(id, |a| a.otp_attempts = attempts)
    }

    async fn clear_otp(&self, id: Uuid) -> AppResult<()> {
        self.update(id, |a| {
            a.otp_code = None;
            a.otp_expires_at = None;
            a.otp_attempts = 0;
        })
    }

    async fn activate(
        &self,
        id: Uuid,
        channel: OtpChannel,
        verified_at: DateTime<Utc>,
    ) -> AppResult<Account> {
        self.update(id, |a| {
            a.status = AccountStatus::Active;
            match channel {
                OtpChannel::Email => {
                    a.email_verified = true;
                    a.email_verified_at = Some(verified_at);
                }
                OtpChannel::Sms => {
                    a.phone_verified = true;
                    a.phone_verified_at = Some(verified_at);
                }
            }
            a.clone()
        })
    }

    async fn store_access_token(&self, id: Uuid, token: &str) -> AppResult<()> {
        self.update(id, |a| a.access_token = Some(token.to_string()))
    }

    async fn revoke_sessions(&self, id: Uuid, revoked_at: DateTime<Utc>) -> AppResult<()> {
        self.update(id, |a| {
            a.access_token = None;
            a.session_revoked_at = Some(revoked_at);
        })
    }

    async fn store_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.update(id, |a| {
            a.password_reset_token_hash = Some(token_hash.to_string());
            a.password_reset_expires_at = Some(expires_at);
        })
    }

    async fn get_by_active_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| {
                a.password_reset_token_hash.as_deref() == Some(token_hash)
                    && a.password_reset_expires_at.is_some_and(|exp| exp > now)
            })
            .cloned())
    }

    async fn consume_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        password_hash: &str,
        password_salt: &str,
        revoked_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.update(id, |a| {
            if a.password_reset_token_hash.as_deref() != Some(token_hash) {
                return false;
            }
            a.password_hash = password_hash.to_string();
            a.password_salt = password_salt.to_string();
            a.password_reset_token_hash = None;
            a.password_reset_expires_at = None;
            a.session_revoked_at = Some(revoked_at);
            true
        })
    }

    async fn replace_password(
        &self,
        id: Uuid,
        password_hash: &str,
        password_salt: &str,
    ) -> AppResult<()> {
        self.update(id, |a| {
            a.password_hash = password_hash.to_string();
            a.password_salt = password_salt.to_string();
        })
    }
}

// ============================================================================
// RecordingNotifier
// ============================================================================

#[derive(Debug, Clone)]
pub enum SentKind {
    Otp { channel: OtpChannel, code: String },
    Templated {
        template: TemplateKey,
        payload: serde_json::Value,
    },
}

#[derive(Debug, Clone)]
pub struct SentNotification {
    pub recipient: String,
    pub account_id: Uuid,
    pub kind: SentKind,
}

/// Notifier that records every dispatch instead of sending anything. Tests
/// fish OTP codes and reset links back out of it, the same way a user would
/// read their inbox.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
    fail: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent dispatch fail, for exercising the best-effort
    /// delivery policy.
    pub fn fail_from_now_on(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_otp_code(&self) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|n| match &n.kind {
                SentKind::Otp { code, .. } => Some(code.clone()),
                _ => None,
            })
    }

    /// The raw token from the most recent password-reset mail, extracted from
    /// the link's `token=` query parameter.
    pub fn reset_link_token(&self) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|n| match &n.kind {
                SentKind::Templated {
                    template: TemplateKey::PasswordReset,
                    payload,
                } => payload
                    .get("reset_link")
                    .and_then(|v| v.as_str())
                    .and_then(|link| link.split("token=").nth(1))
                    .map(|t| t.to_string()),
                _ => None,
            })
    }

    fn record(&self, notification: SentNotification) -> AppResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(AppError::Internal("dispatch failure injected".to_string()));
        }
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

#[async_trait]
impl NotificationDispatch for RecordingNotifier {
    async fn send_otp(
        &self,
        channel: OtpChannel,
        recipient: &str,
        code: &str,
        account_id: Uuid,
    ) -> AppResult<()> {
        self.record(SentNotification {
            recipient: recipient.to_string(),
            account_id,
            kind: SentKind::Otp {
                channel,
                code: code.to_string(),
            },
        })
    }

    async fn send_templated(
        &self,
        template: TemplateKey,
        payload: serde_json::Value,
        recipient: &str,
        account_id: Uuid,
    ) -> AppResult<()> {
        self.record(SentNotification {
            recipient: recipient.to_string(),
            account_id,
            kind: SentKind::Templated { template, payload },
        })
    }
}

// ============================================================================
// PlainPasswordHasher
// ============================================================================

/// Transparent "hasher" for tests: fast and assertable. Production uses
/// Argon2id (`infra::password`).
pub struct PlainPasswordHasher;

impl PasswordHasher for PlainPasswordHasher {
    fn hash(&self, plaintext: &str) -> AppResult<PasswordCredential> {
        Ok(PasswordCredential {
            hash: format!("plain:{plaintext}"),
            salt: "plain-salt".to_string(),
        })
    }

    fn verify(&self, plaintext: &str, hash: &str) -> AppResult<bool> {
        Ok(hash == format!("plain:{plaintext}"))
    }
}

// ============================================================================
// FixedClock
// ============================================================================

/// Clock that only moves when told to.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        FixedClock::now(self)
    }
}

// ============================================================================
// InMemoryRateLimiter
// ============================================================================

/// In-memory rate limiter counting requests per key, ignoring windows.
pub struct InMemoryRateLimiter {
    counts: Mutex<HashMap<String, u64>>,
    max_per_ip: u64,
    max_per_identifier: u64,
}

impl InMemoryRateLimiter {
    pub fn new(max_per_ip: u64, max_per_identifier: u64) -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            max_per_ip,
            max_per_identifier,
        }
    }

    /// A limiter that never blocks (for most tests).
    pub fn permissive() -> Self {
        Self::new(u64::MAX, u64::MAX)
    }

    fn bump(&self, key: String, limit: u64) -> AppResult<()> {
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(key).or_insert(0);
        *count += 1;
        if *count > limit {
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}

#[async_trait]
impl RateLimiterTrait for InMemoryRateLimiter {
    async fn check_ip(&self, ip: &str) -> AppResult<()> {
        self.bump(format!("throttle:ip:{ip}"), self.max_per_ip)
    }

    async fn check_identifier(&self, identifier: &str) -> AppResult<()> {
        self.bump(
            format!("throttle:id:{}", identifier.trim().to_lowercase()),
            self.max_per_identifier,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_account;

    #[tokio::test]
    async fn account_repo_lookups_work() {
        let account = create_test_account(|a| {
            a.email = "alice@example.com".to_string();
            a.phone = "+22890112233".to_string();
        });
        let repo = InMemoryAccountRepo::with_accounts(vec![account.clone()]);

        assert_eq!(
            repo.get_by_email("alice@example.com").await.unwrap().unwrap().id,
            account.id
        );
        assert_eq!(
            repo.get_by_phone("+22890112233").await.unwrap().unwrap().id,
            account.id
        );
        assert!(repo.get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn consume_reset_token_is_conditional_on_hash() {
        let account = create_test_account(|a| {
            a.password_reset_token_hash = Some("stored-hash".to_string());
        });
        let id = account.id;
        let repo = InMemoryAccountRepo::with_accounts(vec![account]);
        let now = Utc::now();

        // Wrong hash: no-op.
        assert!(!repo
            .consume_reset_token(id, "other-hash", "h", "s", now)
            .await
            .unwrap());

        // Matching hash: consumed.
        assert!(repo
            .consume_reset_token(id, "stored-hash", "h", "s", now)
            .await
            .unwrap());

        // Second consumer loses.
        assert!(!repo
            .consume_reset_token(id, "stored-hash", "h", "s", now)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn recording_notifier_surfaces_codes() {
        let notifier = RecordingNotifier::new();
        notifier
            .send_otp(OtpChannel::Email, "a@x.com", "123456", Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(notifier.last_otp_code().as_deref(), Some("123456"));

        notifier.fail_from_now_on();
        assert!(
            notifier
                .send_otp(OtpChannel::Email, "a@x.com", "654321", Uuid::new_v4())
                .await
                .is_err()
        );
        // The failed dispatch is not recorded.
        assert_eq!(notifier.last_otp_code().as_deref(), Some("123456"));
    }

    #[tokio::test]
    async fn rate_limiter_blocks_past_the_limit() {
        let limiter = InMemoryRateLimiter::new(2, 1);

        assert!(limiter.check_ip("1.2.3.4").await.is_ok());
        assert!(limiter.check_ip("1.2.3.4").await.is_ok());
        assert!(matches!(
            limiter.check_ip("1.2.3.4").await,
            Err(AppError::RateLimited)
        ));

        assert!(limiter.check_identifier("A@x.com").await.is_ok());
        // Identifier keys are case-normalized.
        assert!(matches!(
            limiter.check_identifier("a@x.com").await,
            Err(AppError::RateLimited)
        ));
    }
}
