// HTTP handlers for customer endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::auth::error::AuthError;
use crate::auth::middleware::{AdminAuth, CustomerAuth};
use crate::auth::password::{PasswordService, MIN_PASSWORD_LEN};
use crate::customers::models::{
    normalize_email, CreateCustomerRequest, Customer, CustomerPage, CustomerResponse,
    MessageResponse, UpdateCustomerRequest,
};
use crate::customers::repository::NewCustomer;
use crate::error::ApiError;
use crate::pagination::PageParams;
use crate::tickets::models::TicketResponse;
use crate::validation::{ApiQuery, ValidJson};
use crate::AppState;

const DEFAULT_PER_PAGE: i64 = 5;

async fn insert_customer(
    state: &AppState,
    request: CreateCustomerRequest,
) -> Result<Customer, ApiError> {
    let email = normalize_email(&request.email);
    if state.customers.email_taken(&email, None).await? {
        return Err(ApiError::Conflict("Email already exists.".to_string()));
    }

    let password_hash = PasswordService::hash_password(&request.password)?;
    let customer = state
        .customers
        .create(NewCustomer {
            name: request.name.trim().to_string(),
            email,
            phone: request.phone,
            address: request.address,
            password_hash,
        })
        .await?;

    Ok(customer)
}

async fn load_customer(state: &AppState, id: i32) -> Result<Customer, ApiError> {
    state
        .customers
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", id))
}

async fn ensure_email_available(
    state: &AppState,
    changes: &UpdateCustomerRequest,
    customer_id: i32,
) -> Result<(), ApiError> {
    if let Some(email) = &changes.email {
        if state
            .customers
            .email_taken(&normalize_email(email), Some(customer_id))
            .await?
        {
            return Err(ApiError::Conflict("Email already exists.".to_string()));
        }
    }
    Ok(())
}

/// Handler for POST /customers (admin)
pub async fn create_customer_handler(
    State(state): State<AppState>,
    admin: AdminAuth,
    ValidJson(request): ValidJson<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    let customer = insert_customer(&state, request).await?;
    info!("Admin {} created customer {}", admin.id, customer.id);
    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// Handler for POST /customers/register
#[utoipa::path(
    post,
    path = "/customers/register",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer registered", body = CustomerResponse),
        (status = 400, description = "Invalid input or email already registered")
    ),
    tag = "customers"
)]
pub async fn register_customer_handler(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    let customer = insert_customer(&state, request).await?;
    info!("Customer {} registered", customer.id);
    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// Handler for GET /customers (admin)
#[utoipa::path(
    get,
    path = "/customers",
    params(PageParams),
    responses(
        (status = 200, description = "Paginated customers", body = CustomerPage),
        (status = 400, description = "Invalid pagination"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Admin access required")
    ),
    tag = "customers"
)]
pub async fn list_customers_handler(
    State(state): State<AppState>,
    _admin: AdminAuth,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<CustomerPage>, ApiError> {
    let page = params.validate(DEFAULT_PER_PAGE)?;
    let total = state.customers.count().await?;
    let customers = state.customers.list(page).await?;

    Ok(Json(CustomerPage {
        meta: page.meta(total),
        customers: customers.into_iter().map(Into::into).collect(),
    }))
}

/// Handler for GET /customers/{id} (self only)
#[utoipa::path(
    get,
    path = "/customers/{id}",
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Own profile", body = CustomerResponse),
        (status = 403, description = "Not the caller's profile", body = String, example = json!({"error": "You can only view your own profile."})),
        (status = 404, description = "Customer not found")
    ),
    tag = "customers"
)]
pub async fn get_customer_handler(
    State(state): State<AppState>,
    caller: CustomerAuth,
    Path(id): Path<i32>,
) -> Result<Json<CustomerResponse>, ApiError> {
    if caller.id != id {
        return Err(ApiError::Forbidden(
            "You can only view your own profile.".to_string(),
        ));
    }
    let customer = load_customer(&state, id).await?;
    Ok(Json(customer.into()))
}

/// Handler for PUT /customers/{id} (self only)
pub async fn update_customer_handler(
    State(state): State<AppState>,
    caller: CustomerAuth,
    Path(id): Path<i32>,
    ValidJson(changes): ValidJson<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    if caller.id != id {
        return Err(ApiError::Forbidden(
            "You can only update your own profile.".to_string(),
        ));
    }

    let mut customer = load_customer(&state, id).await?;

    if let Some(new_password) = &changes.password {
        let old_password = changes.old_password.as_deref().unwrap_or_default();
        if old_password.is_empty() {
            return Err(ApiError::BadRequest(
                "Old password required when changing password.".to_string(),
            ));
        }
        if !PasswordService::verify_password(old_password, &customer.password_hash)? {
            return Err(ApiError::Unauthenticated(
                "Current password is incorrect.".to_string(),
            ));
        }
        if old_password == new_password {
            return Err(ApiError::BadRequest(
                "New password must be different than current password.".to_string(),
            ));
        }
        PasswordService::validate_password_strength(new_password, MIN_PASSWORD_LEN)?;
        customer.password_hash = PasswordService::hash_password(new_password)?;
    }

    ensure_email_available(&state, &changes, id).await?;
    customer.apply_profile(&changes);
    let customer = state.customers.update(&customer).await?;

    info!("Customer {} updated profile", id);
    Ok(Json(customer.into()))
}

/// Handler for GET /customers/admin/{id}
pub async fn admin_get_customer_handler(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<i32>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer = load_customer(&state, id).await?;
    Ok(Json(customer.into()))
}

/// Handler for PUT /customers/admin/update/{id}
pub async fn admin_update_customer_handler(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(id): Path<i32>,
    ValidJson(changes): ValidJson<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let mut customer = load_customer(&state, id).await?;

    if let Some(password) = changes.password.as_deref().filter(|p| !p.is_empty()) {
        PasswordService::validate_password_strength(password, MIN_PASSWORD_LEN)
            .map_err(|_: AuthError| {
                ApiError::BadRequest("Password must be at least 8 characters.".to_string())
            })?;
        customer.password_hash = PasswordService::hash_password(password)?;
    }

    ensure_email_available(&state, &changes, id).await?;
    customer.apply_profile(&changes);
    let customer = state.customers.update(&customer).await?;

    info!("Admin {} updated customer {}", admin.id, id);
    Ok(Json(customer.into()))
}

/// Handler for DELETE /customers/admin/delete/{id}
pub async fn admin_delete_customer_handler(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let customer = load_customer(&state, id).await?;
    state.customers.delete(id).await?;

    info!(
        "Admin {} deleted customer {} ({})",
        admin.id, id, customer.email
    );
    Ok(Json(MessageResponse::new(format!(
        "Customer {} has been deleted successfully.",
        customer.name
    ))))
}

/// Handler for GET /customers/my-tickets
pub async fn customer_my_tickets_handler(
    State(state): State<AppState>,
    caller: CustomerAuth,
) -> Result<Json<Vec<TicketResponse>>, ApiError> {
    let tickets = state.ticket_service.tickets_for_customer(caller.id).await?;
    Ok(Json(tickets))
}
