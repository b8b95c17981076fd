// Error handling module for the Mechanic Shop API
// Provides centralized error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::auth::error::AuthError;

/// Main error type for the API
/// All handlers return Result<T, ApiError>
///
/// Each variant maps to one HTTP status code. Every response body has the
/// shape `{"error": message}`, with `details` added for field-level
/// validation failures.
#[derive(Debug)]
pub enum ApiError {
    /// Field-level validation errors from `validator`
    /// Maps to HTTP 400 Bad Request
    ValidationError(validator::ValidationErrors),

    /// Request-level validation failure with a single message
    /// Maps to HTTP 400 Bad Request
    BadRequest(String),

    /// Missing or invalid credentials
    /// Maps to HTTP 401 Unauthorized
    Unauthenticated(String),

    /// Valid identity, insufficient rights
    /// Maps to HTTP 403 Forbidden
    Forbidden(String),

    /// Maps to HTTP 404 Not Found
    NotFound(String),

    /// Duplicate unique value (email, username, part name)
    /// Maps to HTTP 400 Bad Request
    Conflict(String),

    /// Database operation errors
    /// Maps to HTTP 500, driver details are only logged
    DatabaseError(sqlx::Error),

    /// Maps to HTTP 500, details are only logged
    InternalError(String),
}

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_error_response();
        (status, Json(body)).into_response()
    }
}

impl ApiError {
    /// `"{resource} with id {id} not found."`
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("{} with id {} not found.", resource, id))
    }

    /// Convert ApiError to status code and body
    ///
    /// Logging level follows severity: debug for expected client errors,
    /// warn for auth failures and conflicts, error for 500s.
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Request validation failed.".to_string(),
                        details: Some(
                            serde_json::to_value(errors).unwrap_or(serde_json::json!({})),
                        ),
                    },
                )
            }
            ApiError::BadRequest(message) => {
                debug!("Bad request: {}", message);
                (StatusCode::BAD_REQUEST, ErrorResponse::new(message.clone()))
            }
            ApiError::Unauthenticated(message) => {
                warn!("Unauthenticated request: {}", message);
                (StatusCode::UNAUTHORIZED, ErrorResponse::new(message.clone()))
            }
            ApiError::Forbidden(message) => {
                warn!("Forbidden request: {}", message);
                (StatusCode::FORBIDDEN, ErrorResponse::new(message.clone()))
            }
            ApiError::NotFound(message) => {
                debug!("Not found: {}", message);
                (StatusCode::NOT_FOUND, ErrorResponse::new(message.clone()))
            }
            ApiError::Conflict(message) => {
                warn!("Conflict: {}", message);
                (StatusCode::BAD_REQUEST, ErrorResponse::new(message.clone()))
            }
            ApiError::DatabaseError(db_error) => {
                error!("Database error: {:?}", db_error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("A database error occurred."),
                )
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("An internal server error occurred."),
                )
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) | ApiError::BadRequest(_) | ApiError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Client-facing message for a violated unique constraint
fn conflict_message(constraint: Option<&str>) -> String {
    match constraint {
        Some("customers_email_key") | Some("mechanics_email_key") => {
            "Email already exists.".to_string()
        }
        Some("mechanics_username_key") => "Username already exists.".to_string(),
        Some("inventory_name_key") => "The part with this name already exists.".to_string(),
        _ => "Resource already exists.".to_string(),
    }
}

/// Unique violations become `Conflict`, foreign-key violations `NotFound`,
/// everything else stays a 500
impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &error {
            if db_err.is_unique_violation() {
                return ApiError::Conflict(conflict_message(db_err.constraint()));
            }
            if db_err.is_foreign_key_violation() {
                return ApiError::NotFound("Referenced record not found.".to_string());
            }
        }
        if let sqlx::Error::RowNotFound = error {
            return ApiError::NotFound("Record not found.".to_string());
        }
        ApiError::DatabaseError(error)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        let message = error.to_string();
        match error {
            AuthError::InsufficientRole { .. } | AuthError::NotOwner => {
                ApiError::Forbidden(message)
            }
            AuthError::WeakPassword(_) => ApiError::BadRequest(message),
            AuthError::PasswordHash(_) | AuthError::TokenGeneration(_) => {
                ApiError::InternalError(message)
            }
            AuthError::MissingToken
            | AuthError::InvalidAuthorization
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::InvalidCredentials(_) => ApiError::Unauthenticated(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use axum::body::to_bytes;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_conflict_maps_to_bad_request() {
        let (status, body) = body_json(ApiError::Conflict("Email already exists.".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email already exists.");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_database_error_hides_driver_message() {
        let (status, body) =
            body_json(ApiError::DatabaseError(sqlx::Error::PoolTimedOut)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "A database error occurred.");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let (status, body) =
            body_json(ApiError::InternalError("argon2 exploded".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["error"].as_str().unwrap().contains("argon2"));
    }

    #[tokio::test]
    async fn test_validation_error_carries_details() {
        let mut errors = validator::ValidationErrors::new();
        errors.add("email", validator::ValidationError::new("email"));
        let (status, body) = body_json(ApiError::ValidationError(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"]["email"].is_array());
    }

    #[test]
    fn test_not_found_message() {
        match ApiError::not_found("Customer", 42) {
            ApiError::NotFound(message) => assert_eq!(message, "Customer with id 42 not found."),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        assert_eq!(
            ApiError::from(sqlx::Error::RowNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_conflict_messages_by_constraint() {
        assert_eq!(conflict_message(Some("customers_email_key")), "Email already exists.");
        assert_eq!(
            conflict_message(Some("mechanics_username_key")),
            "Username already exists."
        );
        assert_eq!(
            conflict_message(Some("inventory_name_key")),
            "The part with this name already exists."
        );
        assert_eq!(conflict_message(None), "Resource already exists.");
    }

    #[test]
    fn test_auth_errors_map_to_401_or_403() {
        assert_eq!(
            ApiError::from(AuthError::MissingToken).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::ExpiredToken).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InsufficientRole {
                required: "Admin".into(),
                actual: Some(Role::Customer),
            })
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(AuthError::WeakPassword(8)).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
