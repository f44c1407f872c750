use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::controllers::query::{page, parse_ids};
use crate::error::{ApiResponse, AppError};
use crate::middleware::AuthUser;
use crate::models::{Cart, CartFilter, CartInput, Paginate};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/carts", get(list_carts).post(create_cart))
        .route("/carts/{id}", get(get_cart).put(update_cart).delete(delete_cart))
}

#[derive(Debug, Deserialize)]
pub struct CartsQuery {
    pub ids: Option<String>,
    pub showtime_ids: Option<String>,
    pub seat_ids: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

async fn list_carts(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<CartsQuery>,
) -> Result<Json<ApiResponse<Paginate<Cart>>>, AppError> {
    let filter = CartFilter {
        ids: parse_ids(params.ids.as_deref(), "ids")?,
        user_ids: vec![user.user_id],
        showtime_ids: parse_ids(params.showtime_ids.as_deref(), "showtime_ids")?,
        seat_ids: parse_ids(params.seat_ids.as_deref(), "seat_ids")?,
    };
    let carts = state.carts.pagination(filter, page(params.page, params.page_size)).await?;
    Ok(ApiResponse::ok(carts))
}

async fn create_cart(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(input): Json<CartInput>,
) -> Result<Json<ApiResponse<Cart>>, AppError> {
    let cart = state.carts.create(user.user_id, input).await?;
    Ok(ApiResponse::ok(cart))
}

async fn get_cart(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Cart>>, AppError> {
    let cart = state.carts.get_by_id(user.user_id, id).await?;
    Ok(ApiResponse::ok(cart))
}

async fn update_cart(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(input): Json<CartInput>,
) -> Result<Json<ApiResponse<Cart>>, AppError> {
    let cart = state.carts.update_by_id(user.user_id, id, input).await?;
    Ok(ApiResponse::ok(cart))
}

async fn delete_cart(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    state.carts.delete_by_id(user.user_id, id).await?;
    Ok(ApiResponse::ok(json!({ "id": id })))
}
