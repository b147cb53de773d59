use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::account::{Account, AccountStatus};

/// Create a test account with sensible defaults. The password hash matches
/// `PlainPasswordHasher::hash("Secret123!")`.
pub fn create_test_account(overrides: impl FnOnce(&mut Account)) -> Account {
    let now = Utc::now();
    let mut account = Account {
        id: Uuid::new_v4(),
        email: "test@example.com".to_string(),
        phone: "+10000000000".to_string(),
        password_hash: "plain:Secret123!".to_string(),
        password_salt: "plain-salt".to_string(),
        status: AccountStatus::Inactive,
        email_verified: false,
        email_verified_at: None,
        phone_verified: false,
        phone_verified_at: None,
        is_admin: false,
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
    overrides(&mut account);
    account
}
