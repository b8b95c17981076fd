use std::collections::HashMap;

use tracing::{info, warn};

use crate::auth::middleware::Caller;
use crate::customers::CustomerRepository;
use crate::error::ApiError;
use crate::inventory::models::{Part, PartResponse};
use crate::inventory::InventoryRepository;
use crate::mechanics::models::{Mechanic, MechanicResponse};
use crate::mechanics::MechanicRepository;
use crate::pagination::Page;
use crate::tickets::models::{
    CreateTicketRequest, CustomerTicketPage, MechanicTicketCount, MechanicTicketPage,
    ServiceTicket, TicketActionResponse, TicketMechanicsResponse, TicketResponse,
    TicketStatus, TicketStatusResponse, TicketUpdateResponse, UpdateStatusRequest,
    UpdateTicketRequest,
};
use crate::tickets::repository::{NewTicket, PartLink, TicketRepository};

/// Admins may modify any ticket; mechanics only the tickets they are
/// assigned to. Customers never.
pub fn caller_may_modify_ticket(caller: &Caller, assigned_mechanic_ids: &[i32]) -> bool {
    caller.is_admin() || (caller.is_mechanic() && assigned_mechanic_ids.contains(&caller.id))
}

/// Adding or removing parts is reserved to assigned mechanics
pub fn caller_may_handle_parts(caller: &Caller, assigned_mechanic_ids: &[i32]) -> bool {
    caller.is_mechanic() && assigned_mechanic_ids.contains(&caller.id)
}

fn actor(caller: &Caller) -> String {
    format!("{} {}", caller.role.title(), caller.id)
}

/// Ticket workflows shared by the ticket, customer and mechanic routes
#[derive(Clone)]
pub struct TicketService {
    tickets: TicketRepository,
    customers: CustomerRepository,
    mechanics: MechanicRepository,
    inventory: InventoryRepository,
}

impl TicketService {
    pub fn new(
        tickets: TicketRepository,
        customers: CustomerRepository,
        mechanics: MechanicRepository,
        inventory: InventoryRepository,
    ) -> Self {
        Self {
            tickets,
            customers,
            mechanics,
            inventory,
        }
    }

    /// Attaches mechanics and parts with one query per join table
    pub async fn hydrate(&self, tickets: Vec<ServiceTicket>) -> Result<Vec<TicketResponse>, ApiError> {
        if tickets.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = tickets.iter().map(|t| t.id).collect();

        let mut mechanics: HashMap<i32, Vec<MechanicResponse>> = HashMap::new();
        for row in self.tickets.mechanics_for(&ids).await? {
            mechanics
                .entry(row.ticket_id)
                .or_default()
                .push(row.mechanic.into());
        }

        let mut parts: HashMap<i32, Vec<PartResponse>> = HashMap::new();
        for row in self.tickets.parts_for(&ids).await? {
            parts.entry(row.ticket_id).or_default().push(row.part.into());
        }

        Ok(tickets
            .into_iter()
            .map(|ticket| {
                let id = ticket.id;
                TicketResponse::new(
                    ticket,
                    mechanics.remove(&id).unwrap_or_default(),
                    parts.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn hydrate_one(&self, ticket: ServiceTicket) -> Result<TicketResponse, ApiError> {
        let id = ticket.id;
        self.hydrate(vec![ticket])
            .await?
            .pop()
            .ok_or_else(|| ApiError::not_found("Service ticket", id))
    }

    async fn load_ticket(&self, id: i32) -> Result<ServiceTicket, ApiError> {
        self.tickets
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Service ticket", id))
    }

    async fn load_mechanic(&self, id: i32) -> Result<Mechanic, ApiError> {
        self.mechanics
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Mechanic", id))
    }

    async fn load_part(&self, id: i32) -> Result<Part, ApiError> {
        self.inventory
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Part", id))
    }

    /// Refuses callers that may not modify the ticket with `message`
    async fn authorize(
        &self,
        caller: &Caller,
        ticket_id: i32,
        allowed: fn(&Caller, &[i32]) -> bool,
        message: &str,
    ) -> Result<(), ApiError> {
        let assigned = self.tickets.mechanic_ids(ticket_id).await?;
        if !allowed(caller, &assigned) {
            warn!(
                "{} refused on ticket {}: not an assigned mechanic",
                actor(caller),
                ticket_id
            );
            return Err(ApiError::Forbidden(message.to_string()));
        }
        Ok(())
    }

    pub async fn tickets_for_customer(&self, customer_id: i32) -> Result<Vec<TicketResponse>, ApiError> {
        let tickets = self.tickets.all_for_customer(customer_id).await?;
        self.hydrate(tickets).await
    }

    pub async fn tickets_for_mechanic(&self, mechanic_id: i32) -> Result<Vec<TicketResponse>, ApiError> {
        let tickets = self.tickets.all_for_mechanic(mechanic_id).await?;
        self.hydrate(tickets).await
    }

    pub async fn all_tickets(&self) -> Result<Vec<TicketResponse>, ApiError> {
        let tickets = self.tickets.list_all().await?;
        self.hydrate(tickets).await
    }

    pub async fn ticket(&self, id: i32) -> Result<TicketResponse, ApiError> {
        let ticket = self.load_ticket(id).await?;
        self.hydrate_one(ticket).await
    }

    /// Creates a ticket for an existing customer, assigned to its creator
    pub async fn create(
        &self,
        mechanic_id: i32,
        request: CreateTicketRequest,
    ) -> Result<TicketResponse, ApiError> {
        let customer_id = request
            .customer_id
            .ok_or_else(|| ApiError::BadRequest("customer_id is required.".to_string()))?;
        let description = request
            .description
            .ok_or_else(|| ApiError::BadRequest("description is required.".to_string()))?;
        let status = match request.status.as_deref() {
            Some(raw) => raw.parse::<TicketStatus>().map_err(ApiError::BadRequest)?,
            None => TicketStatus::default(),
        };

        if self.customers.find_by_id(customer_id).await?.is_none() {
            return Err(ApiError::not_found("Customer", customer_id));
        }

        let ticket = self
            .tickets
            .create(
                NewTicket {
                    customer_id,
                    description,
                    status,
                    vehicle_id: request.vehicle_id,
                    hours_worked: request.hours_worked.unwrap_or(0),
                    repair: request.repair,
                },
                mechanic_id,
            )
            .await?;

        info!(
            "Mechanic {} created ticket {} for customer {}",
            mechanic_id, ticket.id, customer_id
        );
        self.hydrate_one(ticket).await
    }

    pub async fn ticket_mechanics(&self, ticket_id: i32) -> Result<TicketMechanicsResponse, ApiError> {
        let ticket = self.ticket(ticket_id).await?;
        Ok(TicketMechanicsResponse {
            ticket_id,
            mechanic_count: ticket.mechanics.len(),
            mechanics: ticket.mechanics,
        })
    }

    pub async fn mechanic_ticket_count(&self, mechanic_id: i32) -> Result<MechanicTicketCount, ApiError> {
        let mechanic = self.load_mechanic(mechanic_id).await?;
        let tickets = self.tickets_for_mechanic(mechanic_id).await?;

        Ok(MechanicTicketCount {
            mechanic_id,
            mechanic_name: mechanic.name,
            assigned_ticket_count: tickets.len(),
            tickets,
        })
    }

    pub async fn customer_ticket_page(
        &self,
        customer_id: i32,
        page: Page,
    ) -> Result<CustomerTicketPage, ApiError> {
        let customer = self
            .customers
            .find_by_id(customer_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Customer", customer_id))?;

        let total = self.tickets.count_for_customer(customer_id).await?;
        let tickets = self.tickets.list_for_customer(customer_id, page).await?;

        Ok(CustomerTicketPage {
            customer_id,
            customer_name: customer.name,
            ticket_count: total,
            current_page: page.page,
            total_pages: page.pages(total),
            tickets: self.hydrate(tickets).await?,
        })
    }

    pub async fn mechanic_ticket_page(
        &self,
        mechanic_id: i32,
        status: Option<TicketStatus>,
        page: Page,
    ) -> Result<MechanicTicketPage, ApiError> {
        let mechanic = self.load_mechanic(mechanic_id).await?;
        let total = self.tickets.count_for_mechanic(mechanic_id, status).await?;
        let tickets = self
            .tickets
            .list_for_mechanic(mechanic_id, status, page)
            .await?;

        Ok(MechanicTicketPage {
            mechanic_id,
            mechanic_name: mechanic.name,
            assigned_ticket_count: total,
            status_filter: status.map_or_else(|| "all".to_string(), |s| s.to_string()),
            current_page: page.page,
            total_pages: page.pages(total),
            tickets: self.hydrate(tickets).await?,
        })
    }

    pub async fn assign_mechanic(
        &self,
        caller: &Caller,
        ticket_id: i32,
        mechanic_id: i32,
    ) -> Result<TicketActionResponse, ApiError> {
        let ticket = self.load_ticket(ticket_id).await?;
        let mechanic = self.load_mechanic(mechanic_id).await?;
        self.authorize(
            caller,
            ticket_id,
            caller_may_modify_ticket,
            "Only the mechanic who created this ticket or an admin can assign mechanics.",
        )
        .await?;

        let message = if self.tickets.assign_mechanic(ticket_id, mechanic_id).await? {
            info!(
                "{} assigned mechanic {} ({}) to ticket {}",
                actor(caller),
                mechanic_id,
                mechanic.name,
                ticket_id
            );
            format!(
                "Mechanic {} was successfully assigned to ticket {}.",
                mechanic.name, ticket_id
            )
        } else {
            format!(
                "Mechanic {} is already assigned to this ticket.",
                mechanic.name
            )
        };

        Ok(TicketActionResponse {
            message,
            ticket: self.hydrate_one(ticket).await?,
        })
    }

    pub async fn remove_mechanic(
        &self,
        caller: &Caller,
        ticket_id: i32,
        mechanic_id: i32,
    ) -> Result<TicketActionResponse, ApiError> {
        let ticket = self.load_ticket(ticket_id).await?;
        let mechanic = self.load_mechanic(mechanic_id).await?;
        self.authorize(
            caller,
            ticket_id,
            caller_may_modify_ticket,
            "Only mechanics assigned to this ticket or admins can remove mechanics.",
        )
        .await?;

        let message = if self.tickets.remove_mechanic(ticket_id, mechanic_id).await? {
            info!(
                "{} removed mechanic {} from ticket {}",
                actor(caller),
                mechanic_id,
                ticket_id
            );
            format!(
                "Mechanic {} was removed from ticket {}.",
                mechanic.name, ticket_id
            )
        } else {
            "Mechanic is not assigned to this ticket.".to_string()
        };

        Ok(TicketActionResponse {
            message,
            ticket: self.hydrate_one(ticket).await?,
        })
    }

    /// Links a part to the ticket. Stock is checked, not decremented.
    pub async fn add_part(
        &self,
        caller: &Caller,
        ticket_id: i32,
        part_id: i32,
    ) -> Result<TicketActionResponse, ApiError> {
        let ticket = self.load_ticket(ticket_id).await?;
        let part = self.load_part(part_id).await?;
        self.authorize(
            caller,
            ticket_id,
            caller_may_handle_parts,
            "Only mechanics assigned to this ticket can add parts.",
        )
        .await?;

        let message = match self.tickets.add_part(ticket_id, part_id).await? {
            PartLink::Added { quantity } => {
                info!(
                    "{} added part {} ({}, {} in stock) to ticket {}",
                    actor(caller),
                    part_id,
                    part.name,
                    quantity,
                    ticket_id
                );
                format!(
                    "Part {} was successfully added to ticket {}.",
                    part.name, ticket_id
                )
            }
            PartLink::AlreadyAdded => {
                format!("Part {} is already added to this ticket.", part.name)
            }
            PartLink::OutOfStock(quantity) => {
                return Err(ApiError::BadRequest(format!(
                    "Part {} is out of stock (quantity: {}).",
                    part.name, quantity
                )))
            }
            PartLink::PartMissing => return Err(ApiError::not_found("Part", part_id)),
        };

        Ok(TicketActionResponse {
            message,
            ticket: self.hydrate_one(ticket).await?,
        })
    }

    pub async fn remove_part(
        &self,
        caller: &Caller,
        ticket_id: i32,
        part_id: i32,
    ) -> Result<TicketActionResponse, ApiError> {
        let ticket = self.load_ticket(ticket_id).await?;
        let part = self.load_part(part_id).await?;
        self.authorize(
            caller,
            ticket_id,
            caller_may_handle_parts,
            "Only mechanics assigned to this ticket can remove parts.",
        )
        .await?;

        let message = if self.tickets.remove_part(ticket_id, part_id).await? {
            info!(
                "{} removed part {} ({}) from ticket {}",
                actor(caller),
                part_id,
                part.name,
                ticket_id
            );
            format!(
                "Part {} successfully removed from ticket {}",
                part.name, ticket_id
            )
        } else {
            format!("Part {} is not assigned to this ticket.", part.name)
        };

        Ok(TicketActionResponse {
            message,
            ticket: self.hydrate_one(ticket).await?,
        })
    }

    pub async fn update_status(
        &self,
        caller: &Caller,
        ticket_id: i32,
        request: UpdateStatusRequest,
    ) -> Result<TicketStatusResponse, ApiError> {
        let raw = request
            .status
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("Status is required.".to_string()))?;
        let new_status = raw.parse::<TicketStatus>().map_err(ApiError::BadRequest)?;

        let mut ticket = self.load_ticket(ticket_id).await?;
        self.authorize(
            caller,
            ticket_id,
            caller_may_modify_ticket,
            "Only mechanics assigned to this ticket or admins can update status.",
        )
        .await?;

        let old_status = ticket.status;
        let old_hours = ticket.hours_worked;
        ticket.status = new_status;
        if let Some(hours) = request.hours_worked {
            ticket.hours_worked = hours;
        }
        if let Some(repair) = request.repair {
            ticket.repair = Some(repair);
        }
        let ticket = self.tickets.update(&ticket).await?;

        info!(
            "{} moved ticket {} from '{}' to '{}'",
            actor(caller),
            ticket_id,
            old_status,
            new_status
        );

        Ok(TicketStatusResponse {
            message: format!(
                "Ticket {} status updated from \"{}\" to \"{}\"",
                ticket_id, old_status, new_status
            ),
            hours_updated: request
                .hours_worked
                .map(|hours| format!("Hours worked: {} -> {}.", old_hours, hours)),
            ticket: self.hydrate_one(ticket).await?,
            old_status,
            new_status,
        })
    }

    pub async fn update_details(
        &self,
        caller: &Caller,
        ticket_id: i32,
        changes: UpdateTicketRequest,
    ) -> Result<TicketUpdateResponse, ApiError> {
        let updated_fields = changes.provided_fields();
        if updated_fields.is_empty() {
            return Err(ApiError::BadRequest("No data provided.".to_string()));
        }

        let mut ticket = self.load_ticket(ticket_id).await?;
        self.authorize(
            caller,
            ticket_id,
            caller_may_modify_ticket,
            "Only mechanics assigned to this ticket or admins can update the details.",
        )
        .await?;

        ticket.apply_details(&changes);
        let ticket = self.tickets.update(&ticket).await?;

        info!(
            "{} updated ticket {} ({})",
            actor(caller),
            ticket_id,
            updated_fields.join(", ")
        );

        Ok(TicketUpdateResponse {
            message: format!("Ticket {} details updated successfully.", ticket_id),
            ticket: self.hydrate_one(ticket).await?,
            updated_fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use proptest::prelude::*;

    fn caller(id: i32, role: Role) -> Caller {
        Caller { id, role }
    }

    #[test]
    fn test_admin_may_modify_any_ticket() {
        let admin = caller(1, Role::Admin);
        assert!(caller_may_modify_ticket(&admin, &[]));
        assert!(caller_may_modify_ticket(&admin, &[4, 7]));
    }

    #[test]
    fn test_mechanic_must_be_assigned() {
        let mechanic = caller(4, Role::Mechanic);
        assert!(caller_may_modify_ticket(&mechanic, &[4, 7]));
        assert!(!caller_may_modify_ticket(&mechanic, &[7]));
        assert!(!caller_may_modify_ticket(&mechanic, &[]));
    }

    #[test]
    fn test_customer_never_modifies() {
        let customer = caller(4, Role::Customer);
        assert!(!caller_may_modify_ticket(&customer, &[4]));
        assert!(!caller_may_handle_parts(&customer, &[4]));
    }

    #[test]
    fn test_parts_reserved_to_assigned_mechanics() {
        assert!(caller_may_handle_parts(&caller(4, Role::Mechanic), &[4]));
        assert!(!caller_may_handle_parts(&caller(4, Role::Mechanic), &[5]));
        assert!(!caller_may_handle_parts(&caller(1, Role::Admin), &[1]));
    }

    proptest! {
        #[test]
        fn prop_mechanic_access_matches_assignment(
            id in 1i32..50,
            assigned in proptest::collection::vec(1i32..50, 0..6),
        ) {
            let mechanic = caller(id, Role::Mechanic);
            prop_assert_eq!(
                caller_may_modify_ticket(&mechanic, &assigned),
                assigned.contains(&id)
            );
            prop_assert!(caller_may_modify_ticket(&caller(id, Role::Admin), &assigned));
        }
    }
}
