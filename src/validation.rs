// Validation utilities module
// Custom field validators plus extractors that turn body and query
// rejections into ApiError

use std::sync::LazyLock;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use validator::{Validate, ValidationError};

use crate::error::ApiError;

static DIGITS_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));

/// Phone numbers are stored as digit strings
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if DIGITS_ONLY.is_match(phone) {
        Ok(())
    } else {
        let mut error = ValidationError::new("phone_digits_only");
        error.message = Some("Phone number must contain only digits.".into());
        Err(error)
    }
}

/// Rejects names that are empty once trimmed
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

/// Accepts a JSON string or number and keeps it as a string,
/// so `"phone": 5551234` and `"phone": "5551234"` both work
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}

pub fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}

/// JSON body that is deserialized and then validated.
/// Malformed bodies and failed rules are both 400 with a JSON error.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string extractor with a JSON 400 rejection
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("5551234567").is_ok());
        assert!(validate_phone("555-123-4567").is_err());
        assert!(validate_phone("+15551234").is_err());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Brake pad").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }

    #[derive(Debug, Deserialize)]
    struct PhoneHolder {
        #[serde(deserialize_with = "string_or_number")]
        phone: String,
        #[serde(default, deserialize_with = "optional_string_or_number")]
        alt: Option<String>,
    }

    #[test]
    fn test_phone_accepts_number_or_string() {
        let holder: PhoneHolder = serde_json::from_str(r#"{"phone": 5551234}"#).unwrap();
        assert_eq!(holder.phone, "5551234");
        assert_eq!(holder.alt, None);

        let holder: PhoneHolder =
            serde_json::from_str(r#"{"phone": "5551234", "alt": 42}"#).unwrap();
        assert_eq!(holder.phone, "5551234");
        assert_eq!(holder.alt.as_deref(), Some("42"));

        assert!(serde_json::from_str::<PhoneHolder>(r#"{"phone": true}"#).is_err());
    }
}
