// Parts inventory: public catalogue and mechanic management

pub mod handlers;
pub mod models;
pub mod repository;

use axum::{routing::get, Router};

use crate::AppState;
pub use handlers::*;
pub use models::{Part, PartResponse, PublicPart};
pub use repository::InventoryRepository;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_parts_handler).post(create_part_handler))
        .route("/inventory/", get(list_parts_handler).post(create_part_handler))
        .route("/inventory/search", get(search_parts_handler))
        .route("/inventory/low-stock", get(low_stock_handler))
        .route("/inventory/mechanic", get(mechanic_list_parts_handler))
        .route("/inventory/mechanic/", get(mechanic_list_parts_handler))
        .route("/inventory/mechanic/search", get(mechanic_search_part_handler))
        .route("/inventory/mechanic/:id", get(mechanic_get_part_handler))
        .route(
            "/inventory/:id",
            get(get_part_handler)
                .put(update_part_handler)
                .delete(delete_part_handler),
        )
}
