//! Outbound notification dispatch: email through the Resend API, SMS through
//! a generic HTTP gateway. Both are best-effort from the engine's point of
//! view; callers log failures and never roll back state.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::email_templates::{
    otp_email, password_changed_email, password_reset_email,
};
use crate::application::use_cases::notify::{NotificationDispatch, TemplateKey};
use crate::domain::entities::account::OtpChannel;
use crate::infra::http_client;

pub struct HttpNotifier {
    client: Client,
    resend_api_key: SecretString,
    email_from: String,
    sms_gateway_url: Url,
    sms_gateway_key: SecretString,
    otp_ttl_minutes: i64,
}

impl HttpNotifier {
    pub fn new(
        resend_api_key: SecretString,
        email_from: String,
        sms_gateway_url: Url,
        sms_gateway_key: SecretString,
        otp_ttl_minutes: i64,
    ) -> Self {
        Self {
            client: http_client::build_client(),
            resend_api_key,
            email_from,
            sms_gateway_url,
            sms_gateway_key,
            otp_ttl_minutes,
        }
    }

    async fn send_email(&self, to: &str, subject: &str, html: &str) -> AppResult<()> {
        let body = ResendReq {
            from: &self.email_from,
            to: [to],
            subject,
            html,
        };

        let resp = self
            .client
            .post("https://api.resend.com/emails")
            .bearer_auth(self.resend_api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Email send failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::Internal(format!(
                "Email send failed with status {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn send_sms(&self, to: &str, message: &str) -> AppResult<()> {
        let body = SmsReq { to, message };

        let resp = self
            .client
            .post(self.sms_gateway_url.clone())
            .bearer_auth(self.sms_gateway_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("SMS send failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::Internal(format!(
                "SMS send failed with status {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ResendReq<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Serialize)]
struct SmsReq<'a> {
    to: &'a str,
    message: &'a str,
}

#[async_trait]
impl NotificationDispatch for HttpNotifier {
    async fn send_otp(
        &self,
        channel: OtpChannel,
        recipient: &str,
        code: &str,
        account_id: Uuid,
    ) -> AppResult<()> {
        tracing::debug!(%account_id, %channel, "Dispatching verification code");
        match channel {
            OtpChannel::Email => {
                let (subject, html) = otp_email(code, self.otp_ttl_minutes);
                self.send_email(recipient, &subject, &html).await
            }
            OtpChannel::Sms => {
                let message = format!(
                    "{code} is your verification code. It expires in {} minutes.",
                    self.otp_ttl_minutes
                );
                self.send_sms(recipient, &message).await
            }
        }
    }

    async fn send_templated(
        &self,
        template: TemplateKey,
        payload: serde_json::Value,
        recipient: &str,
        account_id: Uuid,
    ) -> AppResult<()> {
        tracing::debug!(%account_id, %template, "Dispatching templated email");
        let (subject, html) = match template {
            TemplateKey::PasswordReset => {
                let reset_link = payload
                    .get("reset_link")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        AppError::Internal("password-reset payload missing reset_link".to_string())
                    })?;
                let expires_in_minutes = payload
                    .get("expires_in_minutes")
                    .and_then(|v| v.as_i64())
                    .unwrap_or(60);
                password_reset_email(reset_link, expires_in_minutes)
            }
            TemplateKey::PasswordChanged => password_changed_email(),
        };

        self.send_email(recipient, &subject, &html).await
    }
}
