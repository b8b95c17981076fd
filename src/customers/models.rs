// Customer data models and DTOs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::pagination::PageMeta;
use crate::validation::{optional_string_or_number, validate_not_blank, validate_phone};

/// Customer database model
#[derive(Debug, Clone, FromRow)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub password_hash: String,
}

impl Customer {
    /// Merges the profile fields present in `changes`; password handling
    /// is left to the caller
    pub fn apply_profile(&mut self, changes: &UpdateCustomerRequest) {
        if let Some(name) = &changes.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = &changes.email {
            self.email = normalize_email(email);
        }
        if let Some(phone) = &changes.phone {
            self.phone = Some(phone.clone());
        }
        if let Some(address) = &changes.address {
            self.address = Some(address.clone());
        }
    }
}

/// Emails are stored trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Customer response model (excludes password_hash)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
            address: customer.address,
        }
    }
}

/// Identity block returned at login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<&Customer> for CustomerSummary {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
            email: customer.email.clone(),
        }
    }
}

/// Body of `POST /customers` and `POST /customers/register`
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 128), custom = "validate_not_blank")]
    pub name: String,
    #[validate(email(message = "Invalid email format."), length(max = 128))]
    pub email: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    #[validate(length(max = 32), custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(length(max = 256))]
    pub address: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
}

/// Partial update; absent fields keep their stored value.
/// `old_password` is required when a customer changes their own password.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 128), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format."), length(max = 128))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    #[validate(length(max = 32), custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(length(max = 256))]
    pub address: Option<String>,
    pub password: Option<String>,
    pub old_password: Option<String>,
}

/// Paginated customer listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerPage {
    #[serde(flatten)]
    pub meta: PageMeta,
    pub customers: Vec<CustomerResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(phone: Option<&str>, password: &str) -> CreateCustomerRequest {
        CreateCustomerRequest {
            name: "Ada Driver".into(),
            email: "ada@example.com".into(),
            phone: phone.map(str::to_string),
            address: None,
            password: password.into(),
        }
    }

    #[test]
    fn test_create_request_validation() {
        assert!(create_request(Some("5551234"), "secret123").validate().is_ok());
        assert!(create_request(None, "secret123").validate().is_ok());
        assert!(create_request(Some("555-1234"), "secret123").validate().is_err());
        assert!(create_request(None, "short").validate().is_err());
    }

    #[test]
    fn test_invalid_email_rejected() {
        let mut request = create_request(None, "secret123");
        request.email = "not-an-email".into();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_update_request_is_partial() {
        let request: UpdateCustomerRequest =
            serde_json::from_str(r#"{"phone": 5550100}"#).unwrap();
        assert_eq!(request.phone.as_deref(), Some("5550100"));
        assert!(request.name.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_apply_profile_merges_present_fields() {
        let mut customer = Customer {
            id: 1,
            name: "Ada".into(),
            email: "a@b.com".into(),
            phone: Some("5550000".into()),
            address: Some("1 Main St".into()),
            password_hash: "hash".into(),
        };
        let changes = UpdateCustomerRequest {
            email: Some("  ADA@Example.com ".into()),
            address: Some("2 Side St".into()),
            ..Default::default()
        };

        customer.apply_profile(&changes);
        assert_eq!(customer.name, "Ada");
        assert_eq!(customer.email, "ada@example.com");
        assert_eq!(customer.phone.as_deref(), Some("5550000"));
        assert_eq!(customer.address.as_deref(), Some("2 Side St"));
        assert_eq!(customer.password_hash, "hash");
    }

    #[test]
    fn test_response_omits_password_hash() {
        let customer = Customer {
            id: 1,
            name: "Ada".into(),
            email: "a@b.com".into(),
            phone: None,
            address: None,
            password_hash: "$argon2id$secret".into(),
        };
        let json = serde_json::to_string(&CustomerResponse::from(customer)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_page_serializes_flat() {
        let page = CustomerPage {
            meta: PageMeta { total: 0, pages: 0, current_page: 1 },
            customers: vec![],
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["total"], 0);
        assert_eq!(json["current_page"], 1);
        assert!(json["customers"].is_array());
    }
}
