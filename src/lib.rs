pub mod auth;
pub mod config;
pub mod customers;
pub mod db;
pub mod error;
pub mod inventory;
pub mod mechanics;
pub mod pagination;
pub mod tickets;
pub mod validation;

use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use auth::{AuthError, AuthService, TokenCodec};
use config::AppConfig;
use customers::CustomerRepository;
use db::DbPool;
use inventory::InventoryRepository;
use mechanics::MechanicRepository;
use tickets::{TicketRepository, TicketService};

/// Login and registration: one token every 12 seconds, bursts of 5
const RATE_LIMIT_PERIOD_SECS: u64 = 12;
const RATE_LIMIT_BURST: u32 = 5;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::customer_login_handler,
        auth::handlers::mechanic_login_handler,
        auth::handlers::admin_login_handler,
        customers::handlers::register_customer_handler,
        customers::handlers::list_customers_handler,
        customers::handlers::get_customer_handler,
        mechanics::handlers::create_mechanic_handler,
        mechanics::handlers::list_mechanics_handler,
        inventory::handlers::list_parts_handler,
        inventory::handlers::search_parts_handler,
        inventory::handlers::create_part_handler,
        tickets::handlers::create_ticket_handler,
        tickets::handlers::list_tickets_handler,
        tickets::handlers::mechanic_ticket_page_handler,
        tickets::handlers::assign_mechanic_handler,
        tickets::handlers::add_part_handler,
        tickets::handlers::update_status_handler,
    ),
    components(
        schemas(
            auth::Role,
            auth::models::LoginRequest,
            auth::models::AdminLoginRequest,
            auth::models::CustomerLoginResponse,
            auth::models::MechanicLoginResponse,
            auth::models::AdminLoginResponse,
            auth::models::AdminSummary,
            auth::models::TokenInfo,
            pagination::PageMeta,
            customers::models::CustomerResponse,
            customers::models::CustomerSummary,
            customers::models::CreateCustomerRequest,
            customers::models::UpdateCustomerRequest,
            customers::models::CustomerPage,
            customers::models::MessageResponse,
            mechanics::models::MechanicResponse,
            mechanics::models::MechanicSummary,
            mechanics::models::CreateMechanicRequest,
            mechanics::models::UpdateMechanicRequest,
            mechanics::models::ChangePasswordRequest,
            mechanics::models::MechanicPage,
            mechanics::models::DashboardResponse,
            mechanics::models::DashboardMechanic,
            mechanics::models::DashboardStats,
            inventory::models::PartResponse,
            inventory::models::PublicPart,
            inventory::models::CreatePartRequest,
            inventory::models::UpdatePartRequest,
            inventory::models::PartPage,
            inventory::models::PublicPartPage,
            tickets::models::TicketStatus,
            tickets::models::TicketResponse,
            tickets::models::CreateTicketRequest,
            tickets::models::UpdateStatusRequest,
            tickets::models::UpdateTicketRequest,
            tickets::models::TicketActionResponse,
            tickets::models::TicketStatusResponse,
            tickets::models::TicketUpdateResponse,
            tickets::models::CustomerTicketPage,
            tickets::models::MechanicTicketPage,
            tickets::models::MechanicTicketCount,
            tickets::models::TicketMechanicsResponse,
        )
    ),
    tags(
        (name = "auth", description = "Customer, mechanic and admin login"),
        (name = "customers", description = "Customer accounts"),
        (name = "mechanics", description = "Mechanic accounts"),
        (name = "inventory", description = "Parts inventory"),
        (name = "service-tickets", description = "Service ticket workflow")
    ),
    info(
        title = "Mechanic Shop API",
        version = "1.0.0",
        description = "RESTful API for customers, mechanics, inventory and service tickets"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub tokens: Arc<TokenCodec>,
    pub auth: Arc<AuthService>,
    pub customers: CustomerRepository,
    pub mechanics: MechanicRepository,
    pub inventory: InventoryRepository,
    pub ticket_service: TicketService,
}

impl AppState {
    /// Builds the repositories and services over one pool. Fails only if
    /// the admin password cannot be hashed.
    pub fn new(db: DbPool, config: &AppConfig) -> Result<Self, AuthError> {
        let tokens = Arc::new(TokenCodec::new(&config.secret_key));
        let customers = CustomerRepository::new(db.clone());
        let mechanics = MechanicRepository::new(db.clone());
        let inventory = InventoryRepository::new(db.clone());

        let auth = AuthService::new(
            customers.clone(),
            mechanics.clone(),
            tokens.clone(),
            &config.admin,
        )?;
        let ticket_service = TicketService::new(
            TicketRepository::new(db.clone()),
            customers.clone(),
            mechanics.clone(),
            inventory.clone(),
        );

        Ok(Self {
            db,
            tokens,
            auth: Arc::new(auth),
            customers,
            mechanics,
            inventory,
            ticket_service,
        })
    }
}

impl FromRef<AppState> for Arc<TokenCodec> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

/// Handler for GET /
async fn index() -> Json<Value> {
    Json(json!({
        "service": "Mechanic Shop API",
        "version": env!("CARGO_PKG_VERSION"),
        "documentation": "/swagger-ui",
        "endpoints": {
            "customers": "/customers",
            "mechanics": "/mechanics",
            "inventory": "/inventory",
            "service_tickets": "/service-tickets",
            "health": "/health"
        }
    }))
}

/// Handler for GET /health
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match db::health_check(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"status": "healthy", "database": "connected"})),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unhealthy", "database": "unreachable"})),
            )
        }
    }
}

/// Login and registration routes, throttled per peer IP when enabled.
/// The limiter needs `ConnectInfo<SocketAddr>`, see `main`.
fn public_auth_routes(config: &AppConfig) -> Router<AppState> {
    let routes = Router::new()
        .merge(customers::auth_routes())
        .merge(mechanics::auth_routes());

    if !config.rate_limit_enabled {
        return routes;
    }

    match GovernorConfigBuilder::default()
        .per_second(RATE_LIMIT_PERIOD_SECS)
        .burst_size(RATE_LIMIT_BURST)
        .finish()
    {
        Some(governor) => routes.layer(GovernorLayer {
            config: Box::leak(Box::new(governor)),
        }),
        None => {
            tracing::warn!("Invalid rate limit settings, login routes are not throttled");
            routes
        }
    }
}

/// Creates and configures the application router
pub fn create_router(state: AppState, config: &AppConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(index))
        .route("/health", get(health))
        .route("/auth/token-info", get(auth::token_info_handler))
        .merge(customers::routes())
        .merge(mechanics::routes())
        .merge(inventory::routes())
        .merge(tickets::routes())
        .merge(public_auth_routes(config))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
