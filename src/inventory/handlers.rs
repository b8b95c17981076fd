// HTTP handlers for inventory endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::auth::middleware::MechanicAuth;
use crate::customers::models::MessageResponse;
use crate::error::ApiError;
use crate::inventory::models::{
    ensure_price, normalize_price, CreatePartRequest, LowStockParams, Part, PartPage,
    PartResponse, PublicPart, PublicPartPage, SearchParams, UpdatePartRequest,
};
use crate::inventory::repository::NewPart;
use crate::pagination::{normalize_string, PageParams, MAX_PER_PAGE};
use crate::validation::{ApiQuery, ValidJson};
use crate::AppState;

const DEFAULT_PER_PAGE: i64 = 20;
const DEFAULT_SEARCH_LIMIT: i64 = 50;
const MIN_QUERY_LEN: usize = 2;
const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

async fn load_part(state: &AppState, id: i32) -> Result<Part, ApiError> {
    state
        .inventory
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Part", id))
}

async fn ensure_name_available(
    state: &AppState,
    name: &str,
    exclude_id: Option<i32>,
) -> Result<(), ApiError> {
    if state.inventory.name_taken(name, exclude_id).await? {
        return Err(ApiError::Conflict(
            "The part with this name already exists.".to_string(),
        ));
    }
    Ok(())
}

/// Checks `q` and `limit` of the public search
fn search_terms(params: SearchParams) -> Result<(String, i64), ApiError> {
    let query = normalize_string(params.q)
        .ok_or_else(|| ApiError::BadRequest("Search query required.".to_string()))?;
    if query.chars().count() < MIN_QUERY_LEN {
        return Err(ApiError::BadRequest(
            "Search query must be at least 2 characters long.".to_string(),
        ));
    }

    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    if !(1..=MAX_PER_PAGE).contains(&limit) {
        return Err(ApiError::BadRequest(
            "Limit must be between 1 and 100.".to_string(),
        ));
    }

    Ok((query, limit))
}

fn low_stock_threshold(params: &LowStockParams) -> Result<i64, ApiError> {
    match params.threshold {
        Some(t) if t < 0 => Err(ApiError::BadRequest(
            "Threshold must be a positive number.".to_string(),
        )),
        Some(t) => Ok(t),
        None => Ok(DEFAULT_LOW_STOCK_THRESHOLD),
    }
}

/// Handler for GET /inventory
#[utoipa::path(
    get,
    path = "/inventory",
    params(PageParams),
    responses(
        (status = 200, description = "Paginated parts, public view", body = PublicPartPage),
        (status = 400, description = "Invalid pagination")
    ),
    tag = "inventory"
)]
pub async fn list_parts_handler(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<PublicPartPage>, ApiError> {
    let page = params.validate(DEFAULT_PER_PAGE)?;
    let total = state.inventory.count().await?;
    let parts = state.inventory.list(page).await?;

    Ok(Json(PublicPartPage {
        meta: page.meta(total),
        parts: parts.into_iter().map(Into::into).collect(),
    }))
}

/// Handler for GET /inventory/{id}
pub async fn get_part_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PublicPart>, ApiError> {
    let part = load_part(&state, id).await?;
    Ok(Json(part.into()))
}

/// Handler for GET /inventory/search
#[utoipa::path(
    get,
    path = "/inventory/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Parts whose name contains the query", body = Vec<PublicPart>),
        (status = 400, description = "Missing or short query, bad limit", body = String, example = json!({"error": "Search query must be at least 2 characters long."}))
    ),
    tag = "inventory"
)]
pub async fn search_parts_handler(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<Vec<PublicPart>>, ApiError> {
    let (query, limit) = search_terms(params)?;
    let parts = state.inventory.search(&query, limit).await?;
    Ok(Json(parts.into_iter().map(Into::into).collect()))
}

/// Handler for GET /inventory/mechanic
pub async fn mechanic_list_parts_handler(
    State(state): State<AppState>,
    _caller: MechanicAuth,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<PartPage>, ApiError> {
    let page = params.validate(DEFAULT_PER_PAGE)?;
    let total = state.inventory.count().await?;
    let parts = state.inventory.list(page).await?;

    Ok(Json(PartPage {
        meta: page.meta(total),
        parts: parts.into_iter().map(Into::into).collect(),
    }))
}

/// Handler for GET /inventory/mechanic/{id}
pub async fn mechanic_get_part_handler(
    State(state): State<AppState>,
    _caller: MechanicAuth,
    Path(id): Path<i32>,
) -> Result<Json<PartResponse>, ApiError> {
    let part = load_part(&state, id).await?;
    Ok(Json(part.into()))
}

/// Handler for GET /inventory/mechanic/search (exact name)
pub async fn mechanic_search_part_handler(
    State(state): State<AppState>,
    _caller: MechanicAuth,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<PartResponse>, ApiError> {
    let query = normalize_string(params.q)
        .ok_or_else(|| ApiError::BadRequest("Search query required.".to_string()))?;

    match state.inventory.find_by_name(&query).await? {
        Some(part) => Ok(Json(part.into())),
        None => Err(ApiError::NotFound(format!(
            "No part found with name of '{}'",
            query
        ))),
    }
}

/// Handler for GET /inventory/low-stock
pub async fn low_stock_handler(
    State(state): State<AppState>,
    _caller: MechanicAuth,
    ApiQuery(params): ApiQuery<LowStockParams>,
) -> Result<Json<Vec<PartResponse>>, ApiError> {
    let threshold = low_stock_threshold(&params)?;
    let parts = state.inventory.low_stock(threshold).await?;
    Ok(Json(parts.into_iter().map(Into::into).collect()))
}

/// Handler for POST /inventory
#[utoipa::path(
    post,
    path = "/inventory",
    request_body = CreatePartRequest,
    responses(
        (status = 201, description = "Part created", body = PartResponse),
        (status = 400, description = "Invalid input or duplicate name", body = String, example = json!({"error": "The part with this name already exists."})),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Mechanic access required")
    ),
    tag = "inventory"
)]
pub async fn create_part_handler(
    State(state): State<AppState>,
    caller: MechanicAuth,
    ValidJson(request): ValidJson<CreatePartRequest>,
) -> Result<(StatusCode, Json<PartResponse>), ApiError> {
    ensure_price(request.price)?;
    let name = request.name.trim().to_string();
    ensure_name_available(&state, &name, None).await?;

    let part = state
        .inventory
        .create(NewPart {
            name,
            description: request.description,
            price: normalize_price(request.price),
            quantity: request.quantity.unwrap_or(0),
        })
        .await?;

    info!("Mechanic {} added part {} ({})", caller.id, part.id, part.name);
    Ok((StatusCode::CREATED, Json(part.into())))
}

/// Handler for PUT /inventory/{id}
pub async fn update_part_handler(
    State(state): State<AppState>,
    caller: MechanicAuth,
    Path(id): Path<i32>,
    ValidJson(changes): ValidJson<UpdatePartRequest>,
) -> Result<Json<PartResponse>, ApiError> {
    if let Some(price) = changes.price {
        ensure_price(price)?;
    }

    let mut part = load_part(&state, id).await?;
    if let Some(name) = &changes.name {
        ensure_name_available(&state, name, Some(id)).await?;
    }
    part.apply_changes(&changes);
    let part = state.inventory.update(&part).await?;

    info!("Mechanic {} updated part {}", caller.id, id);
    Ok(Json(part.into()))
}

/// Handler for DELETE /inventory/{id}
pub async fn delete_part_handler(
    State(state): State<AppState>,
    caller: MechanicAuth,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    let part = load_part(&state, id).await?;
    state.inventory.delete(id).await?;

    info!("Mechanic {} deleted part {} ({})", caller.id, id, part.name);
    Ok(Json(MessageResponse::new(format!(
        "Part '{}' has been deleted successfully.",
        part.name
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(q: Option<&str>, limit: Option<i64>) -> SearchParams {
        SearchParams {
            q: q.map(str::to_string),
            limit,
        }
    }

    fn message(err: ApiError) -> String {
        match err {
            ApiError::BadRequest(msg) => msg,
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_search_terms_defaults() {
        let (query, limit) = search_terms(search(Some("  brake "), None)).unwrap();
        assert_eq!(query, "brake");
        assert_eq!(limit, DEFAULT_SEARCH_LIMIT);
    }

    #[test]
    fn test_search_terms_rejections() {
        assert_eq!(
            message(search_terms(search(None, None)).unwrap_err()),
            "Search query required."
        );
        assert_eq!(
            message(search_terms(search(Some("   "), None)).unwrap_err()),
            "Search query required."
        );
        assert_eq!(
            message(search_terms(search(Some("b"), None)).unwrap_err()),
            "Search query must be at least 2 characters long."
        );
        assert_eq!(
            message(search_terms(search(Some("brake"), Some(0))).unwrap_err()),
            "Limit must be between 1 and 100."
        );
        assert!(search_terms(search(Some("brake"), Some(101))).is_err());
        assert!(search_terms(search(Some("brake"), Some(100))).is_ok());
    }

    #[test]
    fn test_low_stock_threshold() {
        assert_eq!(
            low_stock_threshold(&LowStockParams::default()).unwrap(),
            DEFAULT_LOW_STOCK_THRESHOLD
        );
        assert_eq!(
            low_stock_threshold(&LowStockParams { threshold: Some(0) }).unwrap(),
            0
        );
        assert_eq!(
            message(low_stock_threshold(&LowStockParams { threshold: Some(-1) }).unwrap_err()),
            "Threshold must be a positive number."
        );
    }
}
