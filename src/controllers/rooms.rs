use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::controllers::query::{page, parse_ids, parse_names};
use crate::error::{ApiResponse, AppError};
use crate::middleware::AdminUser;
use crate::models::{Paginate, Room, RoomFilter, RoomInput, Seat, SeatInput};
use crate::AppState;

pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/{id}", get(get_room).put(update_room).delete(delete_room))
        .route("/rooms/{id}/seats", get(list_seats).put(set_seats))
}

#[derive(Debug, Deserialize)]
pub struct RoomsQuery {
    pub ids: Option<String>,
    pub names: Option<String>,
    pub is_usable: Option<bool>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SetSeatsRequest {
    pub seats: Vec<SeatInput>,
}

async fn list_rooms(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<RoomsQuery>,
) -> Result<Json<ApiResponse<Paginate<Room>>>, AppError> {
    let filter = RoomFilter {
        ids: parse_ids(params.ids.as_deref(), "ids")?,
        names: parse_names(params.names.as_deref()),
        is_usable: params.is_usable,
    };
    let rooms = state.rooms.pagination(filter, page(params.page, params.page_size)).await?;
    Ok(ApiResponse::ok(rooms))
}

async fn create_room(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(input): Json<RoomInput>,
) -> Result<Json<ApiResponse<Room>>, AppError> {
    let room = state.rooms.create(input).await?;
    Ok(ApiResponse::ok(room))
}

async fn get_room(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Room>>, AppError> {
    let room = state.rooms.get_by_id(id).await?;
    Ok(ApiResponse::ok(room))
}

async fn update_room(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(input): Json<RoomInput>,
) -> Result<Json<ApiResponse<Room>>, AppError> {
    let room = state.rooms.update_by_id(id, input).await?;
    Ok(ApiResponse::ok(room))
}

async fn delete_room(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    state.rooms.delete_by_id(id).await?;
    Ok(ApiResponse::ok(json!({ "id": id })))
}

async fn list_seats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Seat>>>, AppError> {
    let seats = state.rooms.list_seats(id).await?;
    Ok(ApiResponse::ok(seats))
}

// PUT /api/admin/rooms/{id}/seats replaces the whole roster
async fn set_seats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<SetSeatsRequest>,
) -> Result<Json<ApiResponse<Vec<Seat>>>, AppError> {
    let seats = state.rooms.set_seats(id, req.seats).await?;
    Ok(ApiResponse::ok(seats))
}
