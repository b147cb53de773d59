use validator::ValidateEmail;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Validates a phone number in loose E.164 form: optional leading `+`,
/// then 4-15 digits. Carrier-level validation is the SMS gateway's problem.
pub fn is_valid_phone(phone: &str) -> bool {
    let phone = phone.trim();
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (4..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// Collect password-strength violations. Empty result means the password is
/// acceptable. Enforced at registration only when PASSWORD_VALIDATION_ENABLED
/// is set.
pub fn password_strength_errors(password: &str) -> Vec<&'static str> {
    let mut errors = Vec::new();

    if password.len() < 8 {
        errors.push("must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        errors.push("must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        errors.push("must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("must contain a digit");
    }
    if !password.chars().any(|c| !c.is_alphanumeric()) {
        errors.push("must contain a special character");
    }

    errors
}
