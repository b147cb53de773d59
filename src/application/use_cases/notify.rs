use async_trait::async_trait;
use uuid::Uuid;

use crate::app_error::AppResult;
use crate::domain::entities::account::OtpChannel;

/// Mail template selector for non-OTP notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum TemplateKey {
    PasswordReset,
    PasswordChanged,
}

/// Outbound message dispatch (email or SMS). Fire-and-forget from the
/// engine's perspective: callers log failures and move on; nothing is rolled
/// back because a message did not go out.
#[async_trait]
pub trait NotificationDispatch: Send + Sync {
    async fn send_otp(
        &self,
        channel: OtpChannel,
        recipient: &str,
        code: &str,
        account_id: Uuid,
    ) -> AppResult<()>;

    async fn send_templated(
        &self,
        template: TemplateKey,
        payload: serde_json::Value,
        recipient: &str,
        account_id: Uuid,
    ) -> AppResult<()>;
}
