// Authentication data models and DTOs

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::customers::models::CustomerSummary;
use crate::mechanics::models::MechanicSummary;
use crate::validation::optional_string_or_number;

/// Id of the configuration-provided admin account
pub const ADMIN_ID: i32 = 1;

/// Caller role carried in every token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Mechanic,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Mechanic => "mechanic",
            Role::Admin => "admin",
        }
    }

    /// Capitalized name used in "... access required." messages
    pub fn title(&self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::Mechanic => "Mechanic",
            Role::Admin => "Admin",
        }
    }

    /// Token lifetime issued at login
    pub fn default_ttl(&self) -> Duration {
        match self {
            Role::Customer => Duration::days(2),
            Role::Mechanic => Duration::minutes(480),
            Role::Admin => Duration::hours(12),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims
///
/// `sub` holds the subject id as a string. Tokens minted by older clients
/// may carry `customer_id` instead and may omit `role`; the generic guard
/// still accepts those.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "optional_string_or_number")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "optional_string_or_number")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Subject id from the legacy `customer_id` claim or `sub`
    pub fn subject_id(&self) -> Option<i32> {
        self.customer_id
            .as_deref()
            .or(self.sub.as_deref())
            .and_then(parse_subject)
    }
}

/// Parses a positive integer id
pub fn parse_subject(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|id| *id > 0)
}

/// Customer and mechanic login body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdminLoginRequest {
    #[validate(length(min = 1, message = "Username is required."))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerLoginResponse {
    pub message: String,
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub customer: CustomerSummary,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MechanicLoginResponse {
    pub message: String,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub mechanic: MechanicSummary,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminSummary {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminLoginResponse {
    pub message: String,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub admin: AdminSummary,
}

/// Decoded view of the caller's own token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenInfo {
    pub subject_id: Option<i32>,
    pub role: Option<Role>,
    pub issued_at: i64,
    pub expires_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Mechanic).unwrap(), "\"mechanic\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_role_ttls() {
        assert_eq!(Role::Mechanic.default_ttl().num_minutes(), 480);
        assert_eq!(Role::Customer.default_ttl().num_days(), 2);
        assert_eq!(Role::Admin.default_ttl().num_hours(), 12);
    }

    #[test]
    fn test_legacy_claims_accept_numeric_customer_id() {
        let claims: Claims =
            serde_json::from_str(r#"{"customer_id": 17, "exp": 4102444800}"#).unwrap();
        assert_eq!(claims.role, None);
        assert_eq!(claims.subject_id(), Some(17));
    }

    #[test]
    fn test_subject_id_prefers_customer_id() {
        let claims = Claims {
            sub: Some("3".into()),
            customer_id: Some("9".into()),
            role: None,
            iat: 0,
            exp: 0,
        };
        assert_eq!(claims.subject_id(), Some(9));
    }

    #[test]
    fn test_parse_subject_rejects_non_positive() {
        assert_eq!(parse_subject("12"), Some(12));
        assert_eq!(parse_subject("0"), None);
        assert_eq!(parse_subject("-4"), None);
        assert_eq!(parse_subject("abc"), None);
    }
}
