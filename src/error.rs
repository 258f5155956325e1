use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for the whole service.
///
/// Everything except `Database` and `Internal` is a client-recoverable
/// error with a fixed, non-leaking message. Expired and malformed access
/// tokens are distinct variants so clients can decide whether a refresh
/// attempt is worthwhile.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Email or password is invalid")]
    InvalidCredentials,

    #[error("Access token not found")]
    MissingToken,

    #[error("Access token invalid")]
    TokenRevoked,

    #[error("Access token expired")]
    TokenExpired,

    #[error("Access token invalid")]
    TokenMalformed,

    #[error("Refresh token invalid or expired")]
    RefreshTokenInvalid,

    #[error("The provided temporary token is incorrect or expired")]
    TempTokenInvalid,

    #[error("The provided TOTP is incorrect or expired")]
    InvalidTotp,

    #[error("Insufficient role")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Machine-readable error code, stable across message wording changes.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "ValidationFailed",
            AuthError::DuplicateEmail => "DuplicateEmail",
            AuthError::InvalidCredentials => "InvalidCredentials",
            AuthError::MissingToken => "AccessTokenNotFound",
            AuthError::TokenRevoked => "AccessTokenRevoked",
            AuthError::TokenExpired => "AccessTokenExpired",
            AuthError::TokenMalformed => "AccessTokenInvalid",
            AuthError::RefreshTokenInvalid => "RefreshTokenInvalid",
            AuthError::TempTokenInvalid => "TempTokenInvalid",
            AuthError::InvalidTotp => "TotpInvalid",
            AuthError::Forbidden => "Forbidden",
            AuthError::Database(_) => "InternalError",
            AuthError::Internal(_) => "InternalError",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AuthError::DuplicateEmail => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::TokenRevoked
            | AuthError::TokenExpired
            | AuthError::TokenMalformed
            | AuthError::RefreshTokenInvalid
            | AuthError::TempTokenInvalid
            | AuthError::InvalidTotp => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Internal faults are logged server-side; the wire body carries a
        // generic message only.
        let message = match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "Internal server error".to_string()
            }
            AuthError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.code().to_string(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(
            AuthError::Validation("Please fill in all fields".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AuthError::DuplicateEmail.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Forbidden.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn expired_and_malformed_have_distinct_codes() {
        assert_eq!(AuthError::TokenExpired.code(), "AccessTokenExpired");
        assert_eq!(AuthError::TokenMalformed.code(), "AccessTokenInvalid");
        assert_ne!(AuthError::TokenExpired.code(), AuthError::TokenMalformed.code());
    }

    #[test]
    fn credential_errors_do_not_leak_which_step_failed() {
        // Unknown email and wrong password must be indistinguishable.
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Email or password is invalid"
        );
    }

    #[test]
    fn internal_errors_map_to_500() {
        assert_eq!(
            AuthError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
