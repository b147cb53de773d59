use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Too many requests. Please slow down.")]
    RateLimited,

    #[error("Incorrect identifier or password")]
    InvalidCredentials,

    #[error("Account must be verified before signing in")]
    AccountNotVerified,

    #[error("Account is not active")]
    AccountNotActive,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Email address is already in use")]
    EmailTaken,

    #[error("Phone number is already in use")]
    PhoneTaken,

    #[error("No active verification code for this account")]
    NoActiveOtp,

    #[error("Verification code has expired. Please request a new one")]
    OtpExpired,

    #[error("Incorrect verification code. {remaining} attempt(s) remaining")]
    OtpMismatch { remaining: u32 },

    #[error("Maximum verification attempts reached. Please request a new code")]
    TooManyAttempts,

    #[error("Please wait {wait_secs} second(s) before requesting a new code")]
    ResendTooSoon { wait_secs: i64 },

    #[error("Account is already verified")]
    AlreadyVerified,

    #[error("Token is invalid or expired")]
    TokenInvalid,

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Reset link is invalid or expired. Please request a new one")]
    ResetTokenInvalid,

    #[error("Old password is incorrect")]
    OldPasswordMismatch,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ErrorCode {
    DatabaseError,
    RateLimited,
    InvalidCredentials,
    AccountNotVerified,
    AccountNotActive,
    AccountNotFound,
    EmailTaken,
    PhoneTaken,
    NoActiveOtp,
    OtpExpired,
    OtpMismatch,
    TooManyAttempts,
    ResendTooSoon,
    AlreadyVerified,
    TokenInvalid,
    TokenRevoked,
    ResetTokenInvalid,
    OldPasswordMismatch,
    InvalidInput,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::AccountNotVerified => "ACCOUNT_NOT_VERIFIED",
            ErrorCode::AccountNotActive => "ACCOUNT_NOT_ACTIVE",
            ErrorCode::AccountNotFound => "ACCOUNT_NOT_FOUND",
            ErrorCode::EmailTaken => "EMAIL_TAKEN",
            ErrorCode::PhoneTaken => "PHONE_TAKEN",
            ErrorCode::NoActiveOtp => "NO_ACTIVE_OTP",
            ErrorCode::OtpExpired => "OTP_EXPIRED",
            ErrorCode::OtpMismatch => "OTP_MISMATCH",
            ErrorCode::TooManyAttempts => "TOO_MANY_ATTEMPTS",
            ErrorCode::ResendTooSoon => "RESEND_TOO_SOON",
            ErrorCode::AlreadyVerified => "ALREADY_VERIFIED",
            ErrorCode::TokenInvalid => "TOKEN_INVALID",
            ErrorCode::TokenRevoked => "TOKEN_REVOKED",
            ErrorCode::ResetTokenInvalid => "RESET_TOKEN_INVALID",
            ErrorCode::OldPasswordMismatch => "OLD_PASSWORD_MISMATCH",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
