// HTTP handlers for service ticket endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::middleware::{AdminAuth, CustomerAuth, MechanicAuth, StaffCaller};
use crate::error::ApiError;
use crate::pagination::{normalize_string, PageParams, TICKET_PER_PAGE_CAP};
use crate::tickets::models::{
    CreateTicketRequest, CustomerTicketPage, MechanicTicketCount, MechanicTicketPage,
    MyTicketsParams, TicketActionResponse, TicketMechanicsResponse, TicketResponse,
    TicketStatus, TicketStatusResponse, TicketUpdateResponse, UpdateStatusRequest,
    UpdateTicketRequest,
};
use crate::validation::{ApiQuery, ValidJson};
use crate::AppState;

const DEFAULT_PER_PAGE: i64 = 10;

/// Handler for POST /service-tickets/mechanic/create
#[utoipa::path(
    post,
    path = "/service-tickets/mechanic/create",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created and assigned to its creator", body = TicketResponse),
        (status = 400, description = "Missing customer_id or description, invalid status"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Mechanic access required"),
        (status = 404, description = "Customer not found", body = String, example = json!({"error": "Customer with id 42 not found."}))
    ),
    tag = "service-tickets"
)]
pub async fn create_ticket_handler(
    State(state): State<AppState>,
    caller: MechanicAuth,
    ValidJson(request): ValidJson<CreateTicketRequest>,
) -> Result<(StatusCode, Json<TicketResponse>), ApiError> {
    let ticket = state.ticket_service.create(caller.id, request).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// Handler for GET /service-tickets
#[utoipa::path(
    get,
    path = "/service-tickets",
    responses(
        (status = 200, description = "All tickets with mechanics and parts", body = Vec<TicketResponse>),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Admin access required")
    ),
    tag = "service-tickets"
)]
pub async fn list_tickets_handler(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<Vec<TicketResponse>>, ApiError> {
    Ok(Json(state.ticket_service.all_tickets().await?))
}

/// Handler for GET /service-tickets/{id}
pub async fn get_ticket_handler(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<i32>,
) -> Result<Json<TicketResponse>, ApiError> {
    Ok(Json(state.ticket_service.ticket(id).await?))
}

/// Handler for GET /service-tickets/{id}/mechanics
pub async fn ticket_mechanics_handler(
    State(state): State<AppState>,
    _caller: MechanicAuth,
    Path(id): Path<i32>,
) -> Result<Json<TicketMechanicsResponse>, ApiError> {
    Ok(Json(state.ticket_service.ticket_mechanics(id).await?))
}

/// Handler for GET /service-tickets/mechanic/{mechanic_id}/count
pub async fn mechanic_ticket_count_handler(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(mechanic_id): Path<i32>,
) -> Result<Json<MechanicTicketCount>, ApiError> {
    Ok(Json(
        state.ticket_service.mechanic_ticket_count(mechanic_id).await?,
    ))
}

/// Handler for GET /service-tickets/customer/{customer_id}/count
pub async fn customer_ticket_count_handler(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(customer_id): Path<i32>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<CustomerTicketPage>, ApiError> {
    let page = params.capped(DEFAULT_PER_PAGE, TICKET_PER_PAGE_CAP);
    Ok(Json(
        state
            .ticket_service
            .customer_ticket_page(customer_id, page)
            .await?,
    ))
}

/// Handler for GET /service-tickets/customer/my-tickets
pub async fn customer_ticket_page_handler(
    State(state): State<AppState>,
    caller: CustomerAuth,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<CustomerTicketPage>, ApiError> {
    let page = params.capped(DEFAULT_PER_PAGE, TICKET_PER_PAGE_CAP);
    Ok(Json(
        state
            .ticket_service
            .customer_ticket_page(caller.id, page)
            .await?,
    ))
}

/// Handler for GET /service-tickets/mechanic/my-tickets
#[utoipa::path(
    get,
    path = "/service-tickets/mechanic/my-tickets",
    params(MyTicketsParams),
    responses(
        (status = 200, description = "Assigned tickets, optionally filtered by status", body = MechanicTicketPage),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Mechanic access required")
    ),
    tag = "service-tickets"
)]
pub async fn mechanic_ticket_page_handler(
    State(state): State<AppState>,
    caller: MechanicAuth,
    ApiQuery(params): ApiQuery<MyTicketsParams>,
) -> Result<Json<MechanicTicketPage>, ApiError> {
    let status = normalize_string(params.status)
        .map(|raw| raw.parse::<TicketStatus>())
        .transpose()
        .map_err(ApiError::BadRequest)?;
    let page = PageParams {
        page: params.page,
        per_page: params.per_page,
    }
    .capped(DEFAULT_PER_PAGE, TICKET_PER_PAGE_CAP);

    Ok(Json(
        state
            .ticket_service
            .mechanic_ticket_page(caller.id, status, page)
            .await?,
    ))
}

/// Handler for PUT /service-tickets/{id}/assign-mechanic/{mechanic_id}
#[utoipa::path(
    put,
    path = "/service-tickets/{id}/assign-mechanic/{mechanic_id}",
    params(
        ("id" = i32, Path, description = "Ticket ID"),
        ("mechanic_id" = i32, Path, description = "Mechanic to assign")
    ),
    responses(
        (status = 200, description = "Mechanic assigned, or already assigned", body = TicketActionResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is neither admin nor an assigned mechanic"),
        (status = 404, description = "Ticket or mechanic not found")
    ),
    tag = "service-tickets"
)]
pub async fn assign_mechanic_handler(
    State(state): State<AppState>,
    StaffCaller(caller): StaffCaller,
    Path((id, mechanic_id)): Path<(i32, i32)>,
) -> Result<Json<TicketActionResponse>, ApiError> {
    Ok(Json(
        state
            .ticket_service
            .assign_mechanic(&caller, id, mechanic_id)
            .await?,
    ))
}

/// Handler for PUT /service-tickets/{id}/remove-mechanic/{mechanic_id}
pub async fn remove_mechanic_handler(
    State(state): State<AppState>,
    StaffCaller(caller): StaffCaller,
    Path((id, mechanic_id)): Path<(i32, i32)>,
) -> Result<Json<TicketActionResponse>, ApiError> {
    Ok(Json(
        state
            .ticket_service
            .remove_mechanic(&caller, id, mechanic_id)
            .await?,
    ))
}

/// Handler for PUT /service-tickets/{id}/add-part/{part_id}
#[utoipa::path(
    put,
    path = "/service-tickets/{id}/add-part/{part_id}",
    params(
        ("id" = i32, Path, description = "Ticket ID"),
        ("part_id" = i32, Path, description = "Inventory part ID")
    ),
    responses(
        (status = 200, description = "Part added, or already on the ticket", body = TicketActionResponse),
        (status = 400, description = "Part out of stock", body = String, example = json!({"error": "Part Brake Pad is out of stock (quantity: 0)."})),
        (status = 403, description = "Caller is not an assigned mechanic"),
        (status = 404, description = "Ticket or part not found")
    ),
    tag = "service-tickets"
)]
pub async fn add_part_handler(
    State(state): State<AppState>,
    StaffCaller(caller): StaffCaller,
    Path((id, part_id)): Path<(i32, i32)>,
) -> Result<Json<TicketActionResponse>, ApiError> {
    Ok(Json(
        state.ticket_service.add_part(&caller, id, part_id).await?,
    ))
}

/// Handler for PUT /service-tickets/{id}/remove-part/{part_id}
pub async fn remove_part_handler(
    State(state): State<AppState>,
    StaffCaller(caller): StaffCaller,
    Path((id, part_id)): Path<(i32, i32)>,
) -> Result<Json<TicketActionResponse>, ApiError> {
    Ok(Json(
        state.ticket_service.remove_part(&caller, id, part_id).await?,
    ))
}

/// Handler for PUT /service-tickets/{id}/status
#[utoipa::path(
    put,
    path = "/service-tickets/{id}/status",
    params(("id" = i32, Path, description = "Ticket ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = TicketStatusResponse),
        (status = 400, description = "Missing or unknown status", body = String, example = json!({"error": "Invalid status. Must be one of: open, in_progress, completed, cancelled"})),
        (status = 403, description = "Caller is neither admin nor an assigned mechanic"),
        (status = 404, description = "Ticket not found")
    ),
    tag = "service-tickets"
)]
pub async fn update_status_handler(
    State(state): State<AppState>,
    StaffCaller(caller): StaffCaller,
    Path(id): Path<i32>,
    ValidJson(request): ValidJson<UpdateStatusRequest>,
) -> Result<Json<TicketStatusResponse>, ApiError> {
    Ok(Json(
        state.ticket_service.update_status(&caller, id, request).await?,
    ))
}

/// Handler for PUT /service-tickets/{id}/update
pub async fn update_ticket_handler(
    State(state): State<AppState>,
    StaffCaller(caller): StaffCaller,
    Path(id): Path<i32>,
    ValidJson(changes): ValidJson<UpdateTicketRequest>,
) -> Result<Json<TicketUpdateResponse>, ApiError> {
    Ok(Json(
        state.ticket_service.update_details(&caller, id, changes).await?,
    ))
}
