// Authentication and authorization error types

use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::auth::models::Role;
use crate::auth::token::TokenError;
use crate::error::ApiError;

/// Failures raised by the role guards, token codec and password service.
/// Converted into `ApiError` so every rejection shares the `{"error": ..}` body.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization header is missing.")]
    MissingToken,

    #[error("Invalid Authorization header. Expected 'Bearer <token>'.")]
    InvalidAuthorization,

    #[error("Invalid token.")]
    InvalidToken,

    #[error("Token has expired.")]
    ExpiredToken,

    /// Valid token, wrong role for the route
    #[error("{required} access required.")]
    InsufficientRole {
        required: String,
        actual: Option<Role>,
    },

    /// Valid role, but the record belongs to someone else
    #[error("You can only access your own account.")]
    NotOwner,

    #[error("{0}")]
    InvalidCredentials(&'static str),

    #[error("Password must be at least {0} characters long.")]
    WeakPassword(usize),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Token generation error: {0}")]
    TokenGeneration(String),
}

impl AuthError {
    pub fn insufficient(required: impl Into<String>, actual: Option<Role>) -> Self {
        AuthError::InsufficientRole {
            required: required.into(),
            actual,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::RoleMismatch { expected, actual } => {
                AuthError::insufficient(expected.title(), actual)
            }
            TokenError::Malformed | TokenError::InvalidSignature => AuthError::InvalidToken,
            TokenError::Encoding(message) => AuthError::TokenGeneration(message),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::InsufficientRole { required, actual } = &self {
            tracing::warn!(
                "Authorization failed: {} required, token role {:?}",
                required,
                actual
            );
        }
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_token_errors_convert() {
        assert!(matches!(
            AuthError::from(TokenError::Expired),
            AuthError::ExpiredToken
        ));
        assert!(matches!(
            AuthError::from(TokenError::InvalidSignature),
            AuthError::InvalidToken
        ));
        assert!(matches!(
            AuthError::from(TokenError::Malformed),
            AuthError::InvalidToken
        ));

        let mismatch = AuthError::from(TokenError::RoleMismatch {
            expected: Role::Mechanic,
            actual: Some(Role::Customer),
        });
        assert_eq!(mismatch.to_string(), "Mechanic access required.");
    }

    #[test]
    fn test_response_status() {
        assert_eq!(
            AuthError::MissingToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidCredentials("Invalid email or password.")
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::NotOwner.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::TokenGeneration("boom".into())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_weak_password_message() {
        assert_eq!(
            AuthError::WeakPassword(8).to_string(),
            "Password must be at least 8 characters long."
        );
    }
}
