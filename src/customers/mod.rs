// Customer accounts: registration, profiles and admin management

pub mod handlers;
pub mod models;
pub mod repository;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::AppState;
pub use handlers::*;
pub use models::{Customer, CustomerResponse};
pub use repository::CustomerRepository;

/// Customer routes except login and register, which are mounted
/// behind the rate limiter
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", post(create_customer_handler).get(list_customers_handler))
        .route("/customers/", post(create_customer_handler).get(list_customers_handler))
        .route("/customers/my-tickets", get(customer_my_tickets_handler))
        .route("/customers/:id", get(get_customer_handler).put(update_customer_handler))
        .route("/customers/admin/:id", get(admin_get_customer_handler))
        .route("/customers/admin/update/:id", put(admin_update_customer_handler))
        .route("/customers/admin/delete/:id", delete(admin_delete_customer_handler))
}

/// Public account routes subject to rate limiting
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/customers/register", post(register_customer_handler))
        .route("/customers/login", post(crate::auth::handlers::customer_login_handler))
}
