// HTTP handlers for login and token introspection

use axum::{extract::State, Json};

use crate::auth::{
    error::AuthError,
    middleware::AnyCaller,
    models::{
        AdminLoginRequest, AdminLoginResponse, CustomerLoginResponse, LoginRequest,
        MechanicLoginResponse, TokenInfo,
    },
};
use crate::error::ApiError;
use crate::validation::ValidJson;
use crate::AppState;

/// Customer login
/// POST /customers/login
#[utoipa::path(
    post,
    path = "/customers/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = CustomerLoginResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Invalid credentials", body = String, example = json!({"error": "Invalid email or password."}))
    ),
    tag = "auth"
)]
pub async fn customer_login_handler(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> Result<Json<CustomerLoginResponse>, ApiError> {
    let response = state
        .auth
        .login_customer(&request.email, &request.password)
        .await?;
    Ok(Json(response))
}

/// Mechanic login
/// POST /mechanics/login
#[utoipa::path(
    post,
    path = "/mechanics/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = MechanicLoginResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Invalid credentials", body = String, example = json!({"error": "Invalid email or password."}))
    ),
    tag = "auth"
)]
pub async fn mechanic_login_handler(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> Result<Json<MechanicLoginResponse>, ApiError> {
    let response = state
        .auth
        .login_mechanic(&request.email, &request.password)
        .await?;
    Ok(Json(response))
}

/// Admin login against the configured credentials
/// POST /mechanics/admin/login
#[utoipa::path(
    post,
    path = "/mechanics/admin/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AdminLoginResponse),
        (status = 401, description = "Invalid credentials", body = String, example = json!({"error": "Invalid admin credentials."}))
    ),
    tag = "auth"
)]
pub async fn admin_login_handler(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, AuthError> {
    let response = state.auth.login_admin(&request.username, &request.password)?;
    Ok(Json(response))
}

/// Decoded claims of the presented token, any role
/// GET /auth/token-info
pub async fn token_info_handler(caller: AnyCaller) -> Json<TokenInfo> {
    Json(TokenInfo {
        subject_id: caller.subject_id,
        role: caller.claims.role,
        issued_at: caller.claims.iat,
        expires_at: caller.claims.exp,
    })
}
