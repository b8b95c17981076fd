// HTTP handlers for mechanic endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;

use crate::auth::middleware::{AdminAuth, MechanicAuth};
use crate::auth::password::{PasswordService, MECHANIC_MIN_PASSWORD_LEN, MIN_PASSWORD_LEN};
use crate::customers::models::{normalize_email, MessageResponse};
use crate::error::ApiError;
use crate::mechanics::models::{
    ChangePasswordRequest, CreateMechanicRequest, DashboardMechanic, DashboardResponse,
    DashboardStats, Mechanic, MechanicInfo, MechanicPage, MechanicResponse, SecureDataResponse,
    UpdateMechanicRequest,
};
use crate::mechanics::repository::NewMechanic;
use crate::pagination::PageParams;
use crate::tickets::models::TicketResponse;
use crate::validation::{ApiQuery, ValidJson};
use crate::AppState;

const DEFAULT_PER_PAGE: i64 = 5;

async fn load_mechanic(state: &AppState, id: i32) -> Result<Mechanic, ApiError> {
    state
        .mechanics
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Mechanic", id))
}

/// Email and username must stay unique across mechanics
async fn ensure_unique(
    state: &AppState,
    email: Option<&str>,
    username: Option<&str>,
    exclude_id: Option<i32>,
) -> Result<(), ApiError> {
    if let Some(email) = email {
        if state
            .mechanics
            .email_taken(&normalize_email(email), exclude_id)
            .await?
        {
            return Err(ApiError::Conflict("Email already exists.".to_string()));
        }
    }
    if let Some(username) = username {
        if state.mechanics.username_taken(username, exclude_id).await? {
            return Err(ApiError::Conflict("Username already exists.".to_string()));
        }
    }
    Ok(())
}

/// Handler for POST /mechanics
#[utoipa::path(
    post,
    path = "/mechanics",
    request_body = CreateMechanicRequest,
    responses(
        (status = 201, description = "Mechanic created", body = MechanicResponse),
        (status = 400, description = "Invalid input, duplicate email or username")
    ),
    tag = "mechanics"
)]
pub async fn create_mechanic_handler(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateMechanicRequest>,
) -> Result<(StatusCode, Json<MechanicResponse>), ApiError> {
    ensure_unique(&state, Some(&request.email), Some(&request.username), None).await?;

    let password_hash = PasswordService::hash_password(&request.password)?;
    let mechanic = state
        .mechanics
        .create(NewMechanic {
            name: request.name.trim().to_string(),
            username: request.username.trim().to_string(),
            email: normalize_email(&request.email),
            phone: request.phone,
            address: request.address,
            specialty: request.specialty,
            hours_worked: request.hours_worked.unwrap_or(0),
            password_hash,
        })
        .await?;

    info!("Mechanic {} created ({})", mechanic.id, mechanic.username);
    Ok((StatusCode::CREATED, Json(mechanic.into())))
}

/// Handler for GET /mechanics
#[utoipa::path(
    get,
    path = "/mechanics",
    params(PageParams),
    responses(
        (status = 200, description = "Paginated mechanics", body = MechanicPage),
        (status = 400, description = "Invalid pagination")
    ),
    tag = "mechanics"
)]
pub async fn list_mechanics_handler(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<MechanicPage>, ApiError> {
    let page = params.validate(DEFAULT_PER_PAGE)?;
    let total = state.mechanics.count().await?;
    let mechanics = state.mechanics.list(page).await?;

    Ok(Json(MechanicPage {
        meta: page.meta(total),
        mechanics: mechanics.into_iter().map(Into::into).collect(),
    }))
}

/// Handler for GET /mechanics/{id}
pub async fn get_mechanic_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MechanicResponse>, ApiError> {
    let mechanic = load_mechanic(&state, id).await?;
    Ok(Json(mechanic.into()))
}

/// Handler for GET /mechanics/profile
pub async fn mechanic_profile_handler(
    State(state): State<AppState>,
    caller: MechanicAuth,
) -> Result<Json<MechanicResponse>, ApiError> {
    let mechanic = load_mechanic(&state, caller.id).await?;
    Ok(Json(mechanic.into()))
}

/// Handler for GET /mechanics/dashboard
pub async fn mechanic_dashboard_handler(
    State(state): State<AppState>,
    caller: MechanicAuth,
) -> Result<Json<DashboardResponse>, ApiError> {
    let mechanic = load_mechanic(&state, caller.id).await?;
    let tickets = state.ticket_service.tickets_for_mechanic(caller.id).await?;
    let total_mechanics = state.mechanics.count().await?;

    Ok(Json(DashboardResponse {
        message: format!("Welcome back, {}!", mechanic.name),
        stats: DashboardStats {
            assigned_tickets: tickets.len() as i64,
            total_mechanics,
            hours_worked: mechanic.hours_worked,
        },
        mechanic: DashboardMechanic {
            id: mechanic.id,
            name: mechanic.name,
            email: mechanic.email,
            hours_worked: mechanic.hours_worked,
        },
        tickets,
    }))
}

/// Handler for GET /mechanics/secure-data
pub async fn mechanic_secure_data_handler(
    State(state): State<AppState>,
    caller: MechanicAuth,
) -> Result<Json<SecureDataResponse>, ApiError> {
    let mechanic = load_mechanic(&state, caller.id).await?;

    Ok(Json(SecureDataResponse {
        message: format!("Hello {}! This is your secure data.", mechanic.name),
        mechanic_id: mechanic.id,
        timestamp: Utc::now(),
        data: "This is protected data for authenticated mechanics.".to_string(),
        mechanic_info: MechanicInfo {
            name: mechanic.name,
            email: mechanic.email,
            hours_worked: mechanic.hours_worked,
        },
    }))
}

/// Handler for GET /mechanics/my-tickets
pub async fn mechanic_my_tickets_handler(
    State(state): State<AppState>,
    caller: MechanicAuth,
) -> Result<Json<Vec<TicketResponse>>, ApiError> {
    let tickets = state.ticket_service.tickets_for_mechanic(caller.id).await?;
    Ok(Json(tickets))
}

/// Handler for PUT /mechanics/{id} (self only)
pub async fn update_mechanic_handler(
    State(state): State<AppState>,
    caller: MechanicAuth,
    Path(id): Path<i32>,
    ValidJson(changes): ValidJson<UpdateMechanicRequest>,
) -> Result<Json<MechanicResponse>, ApiError> {
    if caller.id != id {
        return Err(ApiError::Forbidden(
            "You can only update your own profile.".to_string(),
        ));
    }
    if changes.password.is_some() {
        return Err(ApiError::BadRequest(
            "Use /change-password to update password.".to_string(),
        ));
    }
    if changes.hours_worked.is_some() {
        return Err(ApiError::BadRequest(
            "Hours worked can only be updated by administrators.".to_string(),
        ));
    }

    let mut mechanic = load_mechanic(&state, id).await?;
    ensure_unique(
        &state,
        changes.email.as_deref(),
        changes.username.as_deref(),
        Some(id),
    )
    .await?;
    mechanic.apply_profile(&changes);
    let mechanic = state.mechanics.update(&mechanic).await?;

    info!("Mechanic {} updated profile", id);
    Ok(Json(mechanic.into()))
}

/// Handler for PUT /mechanics/change-password
pub async fn change_password_handler(
    State(state): State<AppState>,
    caller: MechanicAuth,
    ValidJson(request): ValidJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if request.old_password.is_empty() || request.new_password.is_empty() {
        return Err(ApiError::BadRequest(
            "Old password and new password required.".to_string(),
        ));
    }
    if request.old_password == request.new_password {
        return Err(ApiError::BadRequest(
            "New password must be different than current password.".to_string(),
        ));
    }
    PasswordService::validate_password_strength(&request.new_password, MIN_PASSWORD_LEN)?;

    let mut mechanic = load_mechanic(&state, caller.id).await?;
    if !PasswordService::verify_password(&request.old_password, &mechanic.password_hash)? {
        return Err(ApiError::Unauthenticated(
            "Current password is incorrect.".to_string(),
        ));
    }

    mechanic.password_hash = PasswordService::hash_password(&request.new_password)?;
    state.mechanics.update(&mechanic).await?;

    info!("Mechanic {} changed password", caller.id);
    Ok(Json(MessageResponse::new("Password changed successfully.")))
}

/// Handler for PUT /mechanics/admin/update/{id}
pub async fn admin_update_mechanic_handler(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(id): Path<i32>,
    ValidJson(changes): ValidJson<UpdateMechanicRequest>,
) -> Result<Json<MechanicResponse>, ApiError> {
    let mut mechanic = load_mechanic(&state, id).await?;
    ensure_unique(
        &state,
        changes.email.as_deref(),
        changes.username.as_deref(),
        Some(id),
    )
    .await?;

    if let Some(password) = changes.password.as_deref().filter(|p| !p.is_empty()) {
        PasswordService::validate_password_strength(password, MECHANIC_MIN_PASSWORD_LEN)?;
        mechanic.password_hash = PasswordService::hash_password(password)?;
    }
    if let Some(hours) = changes.hours_worked {
        mechanic.hours_worked = hours;
    }
    mechanic.apply_profile(&changes);
    let mechanic = state.mechanics.update(&mechanic).await?;

    info!("Admin {} updated mechanic {}", admin.id, id);
    Ok(Json(mechanic.into()))
}

/// Handler for DELETE /mechanics/admin/delete/{id}
pub async fn admin_delete_mechanic_handler(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mechanic = load_mechanic(&state, id).await?;
    state.mechanics.delete(id).await?;

    info!(
        "Admin {} deleted mechanic {} ({})",
        admin.id, id, mechanic.email
    );
    Ok(Json(MessageResponse::new(format!(
        "Mechanic {} has been deleted successfully.",
        mechanic.name
    ))))
}
