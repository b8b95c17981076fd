// Service tickets: creation, assignment, parts and status workflow

pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::AppState;
pub use handlers::*;
pub use models::{ServiceTicket, TicketResponse, TicketStatus};
pub use repository::TicketRepository;
pub use service::{caller_may_modify_ticket, TicketService};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/service-tickets", get(list_tickets_handler))
        .route("/service-tickets/", get(list_tickets_handler))
        .route("/service-tickets/mechanic/create", post(create_ticket_handler))
        .route("/service-tickets/mechanic/my-tickets", get(mechanic_ticket_page_handler))
        .route(
            "/service-tickets/mechanic/:mechanic_id/count",
            get(mechanic_ticket_count_handler),
        )
        .route("/service-tickets/customer/my-tickets", get(customer_ticket_page_handler))
        .route(
            "/service-tickets/customer/:customer_id/count",
            get(customer_ticket_count_handler),
        )
        .route("/service-tickets/:id", get(get_ticket_handler))
        .route("/service-tickets/:id/mechanics", get(ticket_mechanics_handler))
        .route(
            "/service-tickets/:id/assign-mechanic/:mechanic_id",
            put(assign_mechanic_handler),
        )
        .route(
            "/service-tickets/:id/remove-mechanic/:mechanic_id",
            put(remove_mechanic_handler),
        )
        .route("/service-tickets/:id/add-part/:part_id", put(add_part_handler))
        .route("/service-tickets/:id/remove-part/:part_id", put(remove_part_handler))
        .route("/service-tickets/:id/status", put(update_status_handler))
        .route("/service-tickets/:id/update", put(update_ticket_handler))
}
