//! HTML bodies for the transactional mail this service sends. Kept simple and
//! inline-styled; mail clients do not load stylesheets.

const BRAND_NAME: &str = "Sesame";

pub fn primary_button(url: &str, label: &str) -> String {
    format!(
        r#"<a href="{url}" style="display:inline-block;padding:12px 18px;background-color:#111827;color:#ffffff;text-decoration:none;border-radius:8px;font-weight:600;">{label}</a>"#
    )
}

pub fn wrap_email(headline: &str, lead: &str, body: &str, footer_note: Option<&str>) -> String {
    let footer = footer_note
        .map(|note| {
            format!(r#"<p style="margin:24px 0 0;font-size:12px;color:#9ca3af;">{note}</p>"#)
        })
        .unwrap_or_default();

    format!(
        r#"<div style="font-family:-apple-system,Segoe UI,Roboto,sans-serif;max-width:480px;margin:0 auto;padding:32px 24px;color:#111827;">
  <p style="margin:0 0 24px;font-size:14px;font-weight:700;letter-spacing:0.08em;text-transform:uppercase;color:#6b7280;">{BRAND_NAME}</p>
  <h1 style="margin:0 0 12px;font-size:22px;">{headline}</h1>
  <p style="margin:0 0 16px;font-size:15px;color:#374151;">{lead}</p>
  {body}
  {footer}
</div>"#
    )
}

pub fn otp_email(code: &str, ttl_minutes: i64) -> (String, String) {
    let subject = format!("{code} is your {BRAND_NAME} verification code");
    let headline = "Verify your account";
    let lead = format!("Enter this code to finish setting up your account. It expires in {ttl_minutes} minutes.");
    let body = format!(
        r#"<p style="margin:16px 0;font-size:32px;font-weight:700;letter-spacing:0.3em;">{code}</p>"#
    );
    let footer = "If you did not create an account, you can ignore this email.";

    let html = wrap_email(headline, &lead, &body, Some(footer));
    (subject, html)
}

pub fn password_reset_email(reset_link: &str, expires_in_minutes: i64) -> (String, String) {
    let subject = format!("Reset your {BRAND_NAME} password");
    let headline = "Reset your password";
    let lead = format!(
        "Use this link to choose a new password. It can be used once and expires in {expires_in_minutes} minutes."
    );
    let button = primary_button(reset_link, "Choose a new password");
    let body = format!(
        r#"{button}<p style="margin:12px 0 0;font-size:14px;color:#4b5563;">If the button does not work, copy and paste this URL:<br><span style="word-break:break-all;color:#111827;">{reset_link}</span></p>"#
    );
    let footer = "If you did not request a reset, your password is unchanged; delete this email.";

    let html = wrap_email(headline, &lead, &body, Some(footer));
    (subject, html)
}

pub fn password_changed_email() -> (String, String) {
    let subject = format!("Your {BRAND_NAME} password was changed");
    let headline = "Password changed";
    let lead = "The password for your account was just changed.";
    let body = r#"<p style="margin:12px 0 0;color:#374151;">If this was you, no action is needed. If not, request a password reset immediately to lock out whoever changed it.</p>"#;

    let html = wrap_email(headline, lead, body, None);
    (subject, html)
}
