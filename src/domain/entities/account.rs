use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Verification state of an account. Created `Inactive`; the only transition
/// owned by the auth engine is `Inactive -> Active` on OTP success.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Inactive,
    Active,
}

/// Delivery channel for one-time verification codes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OtpChannel {
    Email,
    Sms,
}

/// Tagged view of an account's OTP lifecycle. Derived from the stored fields
/// so the OTP manager can match on an explicit state instead of probing
/// individual columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpState {
    None,
    Pending {
        code: String,
        expires_at: DateTime<Utc>,
        channel: OtpChannel,
        attempts: i32,
    },
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub password_salt: String,
    pub status: AccountStatus,
    pub email_verified: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub phone_verified: bool,
    pub phone_verified_at: Option<DateTime<Utc>>,
    pub is_admin: bool,
    pub otp_code: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub otp_channel: Option<OtpChannel>,
    pub otp_attempts: i32,
    /// Reference to the most recently issued access token. Cleared on logout.
    pub access_token: Option<String>,
    /// SHA-256 of the reset token. The raw value is never persisted.
    pub password_reset_token_hash: Option<String>,
    pub password_reset_expires_at: Option<DateTime<Utc>>,
    /// Revocation watermark: tokens issued before this instant are invalid.
    pub session_revoked_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Current OTP lifecycle state. A stored code without an expiry (or the
    /// other way around) counts as no active code.
    pub fn otp(&self) -> OtpState {
        match (&self.otp_code, self.otp_expires_at) {
            (Some(code), Some(expires_at)) => OtpState::Pending {
                code: code.clone(),
                expires_at,
                channel: self.otp_channel.unwrap_or(OtpChannel::Email),
                attempts: self.otp_attempts,
            },
            _ => OtpState::None,
        }
    }
}
