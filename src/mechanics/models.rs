// Mechanic data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::customers::models::normalize_email;
use crate::pagination::PageMeta;
use crate::tickets::models::TicketResponse;
use crate::validation::{
    optional_string_or_number, string_or_number, validate_not_blank, validate_phone,
};

/// Mechanic database model
#[derive(Debug, Clone, FromRow)]
pub struct Mechanic {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub hours_worked: i32,
    pub specialty: Option<String>,
    pub password_hash: String,
}

impl Mechanic {
    /// Merges the profile fields present in `changes`
    pub fn apply_profile(&mut self, changes: &UpdateMechanicRequest) {
        if let Some(name) = &changes.name {
            self.name = name.trim().to_string();
        }
        if let Some(username) = &changes.username {
            self.username = username.trim().to_string();
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
        if let Some(specialty) = &changes.specialty {
            self.specialty = Some(specialty.clone());
        }
    }
}

/// Mechanic response model (excludes password_hash)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MechanicResponse {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub hours_worked: i32,
    pub specialty: Option<String>,
}

impl From<Mechanic> for MechanicResponse {
    fn from(mechanic: Mechanic) -> Self {
        Self {
            id: mechanic.id,
            name: mechanic.name,
            username: mechanic.username,
            email: mechanic.email,
            phone: mechanic.phone,
            address: mechanic.address,
            hours_worked: mechanic.hours_worked,
            specialty: mechanic.specialty,
        }
    }
}

/// Identity block returned at login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MechanicSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<&Mechanic> for MechanicSummary {
    fn from(mechanic: &Mechanic) -> Self {
        Self {
            id: mechanic.id,
            name: mechanic.name.clone(),
            email: mechanic.email.clone(),
            phone: mechanic.phone.clone(),
        }
    }
}

/// Body of `POST /mechanics`
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMechanicRequest {
    #[validate(length(min = 1, max = 128), custom = "validate_not_blank")]
    pub name: String,
    #[validate(length(min = 1, max = 128), custom = "validate_not_blank")]
    pub username: String,
    #[validate(email(message = "Invalid email format."), length(max = 128))]
    pub email: String,
    #[serde(deserialize_with = "string_or_number")]
    #[validate(length(max = 32), custom = "validate_phone")]
    pub phone: String,
    #[validate(length(max = 256))]
    pub address: Option<String>,
    #[validate(length(max = 128))]
    pub specialty: Option<String>,
    #[validate(range(min = 0, message = "Hours worked cannot be negative."))]
    pub hours_worked: Option<i32>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub password: String,
}

/// Self-service profile update.
/// `password` and `hours_worked` are accepted by the parser only so the
/// handler can refuse them with a clear message.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateMechanicRequest {
    #[validate(length(min = 1, max = 128), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 128), custom = "validate_not_blank")]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email format."), length(max = 128))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    #[validate(length(max = 32), custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(length(max = 256))]
    pub address: Option<String>,
    #[validate(length(max = 128))]
    pub specialty: Option<String>,
    #[validate(range(min = 0, message = "Hours worked cannot be negative."))]
    pub hours_worked: Option<i32>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Paginated mechanic listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MechanicPage {
    #[serde(flatten)]
    pub meta: PageMeta,
    pub mechanics: Vec<MechanicResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardMechanic {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub hours_worked: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub assigned_tickets: i64,
    pub total_mechanics: i64,
    pub hours_worked: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub mechanic: DashboardMechanic,
    pub stats: DashboardStats,
    pub tickets: Vec<TicketResponse>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MechanicInfo {
    pub name: String,
    pub email: String,
    pub hours_worked: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SecureDataResponse {
    pub message: String,
    pub mechanic_id: i32,
    pub timestamp: DateTime<Utc>,
    pub data: String,
    pub mechanic_info: MechanicInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mechanic() -> Mechanic {
        Mechanic {
            id: 4,
            name: "Sam Wrench".into(),
            username: "samw".into(),
            email: "sam@shop.com".into(),
            phone: Some("5550101".into()),
            address: None,
            hours_worked: 12,
            specialty: Some("Brakes".into()),
            password_hash: "hash".into(),
        }
    }

    #[test]
    fn test_create_request_accepts_numeric_phone() {
        let request: CreateMechanicRequest = serde_json::from_str(
            r#"{"name": "Sam", "username": "samw", "email": "sam@shop.com",
                "phone": 5550101, "password": "secret"}"#,
        )
        .unwrap();
        assert_eq!(request.phone, "5550101");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_request_rules() {
        let request: CreateMechanicRequest = serde_json::from_str(
            r#"{"name": "Sam", "username": "samw", "email": "sam@shop.com",
                "phone": "5550101", "password": "12345", "hours_worked": -1}"#,
        )
        .unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("hours_worked"));
    }

    #[test]
    fn test_create_request_requires_phone() {
        let result = serde_json::from_str::<CreateMechanicRequest>(
            r#"{"name": "Sam", "username": "samw", "email": "sam@shop.com", "password": "secret"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_profile_keeps_hours() {
        let mut mechanic = sample_mechanic();
        let changes = UpdateMechanicRequest {
            specialty: Some("Transmissions".into()),
            email: Some("SAM@Shop.com".into()),
            ..Default::default()
        };
        mechanic.apply_profile(&changes);
        assert_eq!(mechanic.specialty.as_deref(), Some("Transmissions"));
        assert_eq!(mechanic.email, "sam@shop.com");
        assert_eq!(mechanic.hours_worked, 12);
        assert_eq!(mechanic.username, "samw");
    }

    #[test]
    fn test_response_omits_password_hash() {
        let json = serde_json::to_value(MechanicResponse::from(sample_mechanic())).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["hours_worked"], 12);
    }
}
