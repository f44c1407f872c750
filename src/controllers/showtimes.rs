use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::controllers::query::{page, parse_ids};
use crate::error::{ApiResponse, AppError};
use crate::middleware::{AdminUser, AuthUser};
use crate::models::{Paginate, Showtime, ShowtimeFilter, ShowtimeInput, ShowtimeSeat};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/showtimes", get(list_showtimes))
        .route("/showtimes/{id}", get(get_showtime))
        .route("/showtimes/{id}/seats", get(showtime_seats))
}

pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/showtimes", get(admin_list_showtimes).post(create_showtime))
        .route(
            "/showtimes/{id}",
            get(admin_get_showtime).put(update_showtime).delete(delete_showtime),
        )
}

#[derive(Debug, Deserialize)]
pub struct ShowtimesQuery {
    pub ids: Option<String>,
    pub movie_ids: Option<String>,
    pub room_ids: Option<String>,
    pub after: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl ShowtimesQuery {
    fn filter(&self) -> Result<ShowtimeFilter, AppError> {
        Ok(ShowtimeFilter {
            ids: parse_ids(self.ids.as_deref(), "ids")?,
            movie_ids: parse_ids(self.movie_ids.as_deref(), "movie_ids")?,
            room_ids: parse_ids(self.room_ids.as_deref(), "room_ids")?,
            after: self.after,
        })
    }
}

async fn paginate(state: &AppState, params: ShowtimesQuery) -> Result<Paginate<Showtime>, AppError> {
    let filter = params.filter()?;
    state.showtimes.pagination(filter, page(params.page, params.page_size)).await
}

/* ---------- user ---------- */

async fn list_showtimes(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<ShowtimesQuery>,
) -> Result<Json<ApiResponse<Paginate<Showtime>>>, AppError> {
    Ok(ApiResponse::ok(paginate(&state, params).await?))
}

async fn get_showtime(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Showtime>>, AppError> {
    let showtime = state.showtimes.get_by_id(id).await?;
    Ok(ApiResponse::ok(showtime))
}

async fn showtime_seats(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<ShowtimeSeat>>>, AppError> {
    let seats = state.showtimes.get_showtime_seats(id).await?;
    Ok(ApiResponse::ok(seats))
}

/* ---------- admin ---------- */

async fn admin_list_showtimes(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<ShowtimesQuery>,
) -> Result<Json<ApiResponse<Paginate<Showtime>>>, AppError> {
    Ok(ApiResponse::ok(paginate(&state, params).await?))
}

async fn admin_get_showtime(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Showtime>>, AppError> {
    let showtime = state.showtimes.get_by_id(id).await?;
    Ok(ApiResponse::ok(showtime))
}

async fn create_showtime(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(input): Json<ShowtimeInput>,
) -> Result<Json<ApiResponse<Showtime>>, AppError> {
    let showtime = state.showtimes.create(input).await?;
    Ok(ApiResponse::ok(showtime))
}

async fn update_showtime(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(input): Json<ShowtimeInput>,
) -> Result<Json<ApiResponse<Showtime>>, AppError> {
    let showtime = state.showtimes.update_by_id(id, input).await?;
    Ok(ApiResponse::ok(showtime))
}

async fn delete_showtime(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    state.showtimes.delete_by_id(id).await?;
    Ok(ApiResponse::ok(json!({ "id": id })))
}
