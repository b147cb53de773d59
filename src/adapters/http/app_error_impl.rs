use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        let (status, code) = match &self {
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DatabaseError),
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, ErrorCode::RateLimited),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, ErrorCode::InvalidCredentials)
            }
            AppError::AccountNotVerified => (StatusCode::FORBIDDEN, ErrorCode::AccountNotVerified),
            AppError::AccountNotActive => (StatusCode::FORBIDDEN, ErrorCode::AccountNotActive),
            AppError::AccountNotFound => (StatusCode::NOT_FOUND, ErrorCode::AccountNotFound),
            AppError::EmailTaken => (StatusCode::CONFLICT, ErrorCode::EmailTaken),
            AppError::PhoneTaken => (StatusCode::CONFLICT, ErrorCode::PhoneTaken),
            AppError::NoActiveOtp => (StatusCode::BAD_REQUEST, ErrorCode::NoActiveOtp),
            AppError::OtpExpired => (StatusCode::BAD_REQUEST, ErrorCode::OtpExpired),
            AppError::OtpMismatch { .. } => (StatusCode::BAD_REQUEST, ErrorCode::OtpMismatch),
            AppError::TooManyAttempts => {
                (StatusCode::TOO_MANY_REQUESTS, ErrorCode::TooManyAttempts)
            }
            AppError::ResendTooSoon { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, ErrorCode::ResendTooSoon)
            }
            AppError::AlreadyVerified => (StatusCode::BAD_REQUEST, ErrorCode::AlreadyVerified),
            AppError::TokenInvalid => (StatusCode::UNAUTHORIZED, ErrorCode::TokenInvalid),
            AppError::TokenRevoked => (StatusCode::UNAUTHORIZED, ErrorCode::TokenRevoked),
            AppError::ResetTokenInvalid => (StatusCode::BAD_REQUEST, ErrorCode::ResetTokenInvalid),
            AppError::OldPasswordMismatch => {
                (StatusCode::UNAUTHORIZED, ErrorCode::OldPasswordMismatch)
            }
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidInput),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError),
        };

        // Server-side faults keep their detail out of the response body.
        let message = match &self {
            AppError::Database(_) | AppError::Internal(_) => None,
            other => Some(other.to_string()),
        };

        error_resp(status, code, message)
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
