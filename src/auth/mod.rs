// Authentication module
// HS256 tokens for customers, mechanics and the configured admin, with
// role guards used as axum extractors

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod token;

pub use error::AuthError;
pub use handlers::{admin_login_handler, customer_login_handler, mechanic_login_handler, token_info_handler};
pub use middleware::{AdminAuth, AnyCaller, Caller, CustomerAuth, MechanicAuth, StaffCaller};
pub use models::{Claims, Role};
pub use service::AuthService;
pub use token::{TokenCodec, TokenError};
