// Service ticket data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::inventory::models::PartResponse;
use crate::mechanics::models::MechanicResponse;

/// Lifecycle state of a service ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Completed,
        TicketStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Completed => "completed",
            TicketStatus::Cancelled => "cancelled",
        }
    }

    fn invalid_message() -> String {
        let names: Vec<&str> = Self::ALL.iter().map(TicketStatus::as_str).collect();
        format!("Invalid status. Must be one of: {}", names.join(", "))
    }
}

/// Case-insensitive; surrounding whitespace is ignored
impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(Self::invalid_message)
    }
}

impl TryFrom<String> for TicketStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service ticket database model
#[derive(Debug, Clone, FromRow)]
pub struct ServiceTicket {
    pub id: i32,
    pub customer_id: i32,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub vehicle_id: Option<String>,
    pub hours_worked: i32,
    pub repair: Option<String>,
}

impl ServiceTicket {
    pub fn apply_details(&mut self, changes: &UpdateTicketRequest) {
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
        if let Some(vehicle_id) = &changes.vehicle_id {
            self.vehicle_id = Some(vehicle_id.clone());
        }
        if let Some(hours) = changes.hours_worked {
            self.hours_worked = hours;
        }
        if let Some(repair) = &changes.repair {
            self.repair = Some(repair.clone());
        }
    }
}

/// Ticket with its assigned mechanics and parts
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketResponse {
    pub id: i32,
    pub customer_id: i32,
    pub description: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub vehicle_id: Option<String>,
    pub hours_worked: i32,
    pub repair: Option<String>,
    pub mechanics: Vec<MechanicResponse>,
    pub parts: Vec<PartResponse>,
}

impl TicketResponse {
    pub fn new(
        ticket: ServiceTicket,
        mechanics: Vec<MechanicResponse>,
        parts: Vec<PartResponse>,
    ) -> Self {
        Self {
            id: ticket.id,
            customer_id: ticket.customer_id,
            description: ticket.description,
            status: ticket.status,
            created_at: ticket.created_at,
            vehicle_id: ticket.vehicle_id,
            hours_worked: ticket.hours_worked,
            repair: ticket.repair,
            mechanics,
            parts,
        }
    }
}

/// Body of `POST /service-tickets/mechanic/create`.
/// `customer_id` and `description` are optional here so the handler can
/// report which one is missing.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTicketRequest {
    pub customer_id: Option<i32>,
    #[validate(length(min = 1, max = 1000))]
    pub description: Option<String>,
    pub status: Option<String>,
    #[validate(length(max = 200))]
    pub vehicle_id: Option<String>,
    #[validate(range(min = 0, message = "hours_worked must be a non-negative integer."))]
    pub hours_worked: Option<i32>,
    #[validate(length(max = 500))]
    pub repair: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    #[validate(range(min = 0, message = "hours_worked must be a non-negative integer."))]
    pub hours_worked: Option<i32>,
    #[validate(length(max = 500))]
    pub repair: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTicketRequest {
    #[validate(length(min = 1, max = 1000))]
    pub description: Option<String>,
    #[validate(length(max = 200))]
    pub vehicle_id: Option<String>,
    #[validate(range(min = 0, message = "hours_worked must be a non-negative integer."))]
    pub hours_worked: Option<i32>,
    #[validate(length(max = 500))]
    pub repair: Option<String>,
}

impl UpdateTicketRequest {
    /// Names of the fields present in the body
    pub fn provided_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if self.description.is_some() {
            fields.push("description".to_string());
        }
        if self.vehicle_id.is_some() {
            fields.push("vehicle_id".to_string());
        }
        if self.hours_worked.is_some() {
            fields.push("hours_worked".to_string());
        }
        if self.repair.is_some() {
            fields.push("repair".to_string());
        }
        fields
    }
}

/// Query of `GET /service-tickets/mechanic/my-tickets`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MyTicketsParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// One of open, in_progress, completed, cancelled
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketMechanicsResponse {
    pub ticket_id: i32,
    pub mechanic_count: usize,
    pub mechanics: Vec<MechanicResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MechanicTicketCount {
    pub mechanic_id: i32,
    pub mechanic_name: String,
    pub assigned_ticket_count: usize,
    pub tickets: Vec<TicketResponse>,
}

/// Paginated tickets of one customer
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerTicketPage {
    pub customer_id: i32,
    pub customer_name: String,
    pub ticket_count: i64,
    pub current_page: i64,
    pub total_pages: i64,
    pub tickets: Vec<TicketResponse>,
}

/// Paginated tickets assigned to one mechanic
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MechanicTicketPage {
    pub mechanic_id: i32,
    pub mechanic_name: String,
    pub assigned_ticket_count: i64,
    /// The applied status, or "all"
    pub status_filter: String,
    pub current_page: i64,
    pub total_pages: i64,
    pub tickets: Vec<TicketResponse>,
}

/// Outcome of an assignment or part change
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketActionResponse {
    pub message: String,
    pub ticket: TicketResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketStatusResponse {
    pub message: String,
    pub ticket: TicketResponse,
    pub old_status: TicketStatus,
    pub new_status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_updated: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketUpdateResponse {
    pub message: String,
    pub ticket: TicketResponse,
    pub updated_fields: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ticket() -> ServiceTicket {
        ServiceTicket {
            id: 9,
            customer_id: 2,
            description: "Brake noise".into(),
            status: TicketStatus::Open,
            created_at: Utc::now(),
            vehicle_id: None,
            hours_worked: 0,
            repair: None,
        }
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!("OPEN".parse::<TicketStatus>(), Ok(TicketStatus::Open));
        assert_eq!(" In_Progress ".parse::<TicketStatus>(), Ok(TicketStatus::InProgress));
        assert_eq!(
            TicketStatus::try_from("cancelled".to_string()),
            Ok(TicketStatus::Cancelled)
        );
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        let err = "done".parse::<TicketStatus>().unwrap_err();
        assert_eq!(
            err,
            "Invalid status. Must be one of: open, in_progress, completed, cancelled"
        );
        assert!("in progress".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn test_status_round_trips_through_its_name() {
        for status in TicketStatus::ALL {
            assert_eq!(status.as_str().parse::<TicketStatus>(), Ok(status));
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::json!(status.as_str())
            );
        }
        assert_eq!(TicketStatus::default(), TicketStatus::Open);
    }

    #[test]
    fn test_apply_details_merges_present_fields() {
        let mut ticket = sample_ticket();
        let changes = UpdateTicketRequest {
            hours_worked: Some(3),
            repair: Some("Replaced pads".into()),
            ..Default::default()
        };
        ticket.apply_details(&changes);
        assert_eq!(ticket.hours_worked, 3);
        assert_eq!(ticket.repair.as_deref(), Some("Replaced pads"));
        assert_eq!(ticket.description, "Brake noise");
        assert_eq!(changes.provided_fields(), vec!["hours_worked", "repair"]);
    }

    #[test]
    fn test_negative_hours_rejected() {
        let request: UpdateStatusRequest =
            serde_json::from_str(r#"{"status": "completed", "hours_worked": -2}"#).unwrap();
        assert!(request.validate().is_err());

        let request: UpdateStatusRequest =
            serde_json::from_str(r#"{"status": "completed", "hours_worked": 4}"#).unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_non_integer_hours_rejected_by_parser() {
        assert!(serde_json::from_str::<UpdateTicketRequest>(r#"{"hours_worked": 1.5}"#).is_err());
        assert!(serde_json::from_str::<UpdateTicketRequest>(r#"{"hours_worked": "2"}"#).is_err());
    }

    #[test]
    fn test_status_response_omits_hours_when_unchanged() {
        let response = TicketStatusResponse {
            message: "ok".into(),
            ticket: TicketResponse::new(sample_ticket(), vec![], vec![]),
            old_status: TicketStatus::Open,
            new_status: TicketStatus::InProgress,
            hours_updated: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("hours_updated").is_none());
        assert_eq!(json["new_status"], "in_progress");
        assert_eq!(json["ticket"]["status"], "open");
    }
}
