// Mechanic accounts, self-service views and admin management

pub mod handlers;
pub mod models;
pub mod repository;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::AppState;
pub use handlers::*;
pub use models::{Mechanic, MechanicResponse};
pub use repository::MechanicRepository;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/mechanics", post(create_mechanic_handler).get(list_mechanics_handler))
        .route("/mechanics/", post(create_mechanic_handler).get(list_mechanics_handler))
        .route("/mechanics/profile", get(mechanic_profile_handler))
        .route("/mechanics/dashboard", get(mechanic_dashboard_handler))
        .route("/mechanics/secure-data", get(mechanic_secure_data_handler))
        .route("/mechanics/my-tickets", get(mechanic_my_tickets_handler))
        .route("/mechanics/change-password", put(change_password_handler))
        .route("/mechanics/:id", get(get_mechanic_handler).put(update_mechanic_handler))
        .route("/mechanics/admin/update/:id", put(admin_update_mechanic_handler))
        .route("/mechanics/admin/delete/:id", delete(admin_delete_mechanic_handler))
}

/// Login routes subject to rate limiting
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/mechanics/login", post(crate::auth::handlers::mechanic_login_handler))
        .route("/mechanics/admin/login", post(crate::auth::handlers::admin_login_handler))
}
