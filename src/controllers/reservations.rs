use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::controllers::query::{page, parse_ids, split_list};
use crate::error::{ApiResponse, AppError};
use crate::middleware::AuthUser;
use crate::models::reservation::parse_statuses;
use crate::models::{Paginate, Reservation, ReservationFilter, ReservationInput};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reservations", get(list_reservations).post(create_reservation))
        .route("/reservations/{id}", get(get_reservation).delete(delete_reservation))
        .route("/reservations/{id}/pay", post(pay_reservation))
        .route("/reservations/{id}/cancel", post(cancel_reservation))
}

#[derive(Debug, Deserialize)]
pub struct ReservationsQuery {
    pub ids: Option<String>,
    pub statuses: Option<String>,
    #[serde(default)]
    pub with_items: bool,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

async fn list_reservations(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<ReservationsQuery>,
) -> Result<Json<ApiResponse<Paginate<Reservation>>>, AppError> {
    let filter = ReservationFilter {
        ids: parse_ids(params.ids.as_deref(), "ids")?,
        user_ids: vec![user.user_id],
        statuses: parse_statuses(&split_list(params.statuses.as_deref()))?,
        with_items: params.with_items,
    };
    let reservations = state
        .reservations
        .pagination(filter, page(params.page, params.page_size))
        .await?;
    Ok(ApiResponse::ok(reservations))
}

async fn create_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(input): Json<ReservationInput>,
) -> Result<Json<ApiResponse<Reservation>>, AppError> {
    let reservation = state.reservations.create(user.user_id, input).await?;
    Ok(ApiResponse::ok(reservation))
}

async fn get_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Reservation>>, AppError> {
    let reservation = state.reservations.get_by_id(user.user_id, id).await?;
    Ok(ApiResponse::ok(reservation))
}

async fn delete_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    state.reservations.user_delete_by_id(user.user_id, id).await?;
    Ok(ApiResponse::ok(json!({ "id": id })))
}

// POST /api/reservations/{id}/pay marks the reservation paid, no gateway involved
async fn pay_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Reservation>>, AppError> {
    let reservation = state.reservations.pay(user.user_id, id).await?;
    Ok(ApiResponse::ok(reservation))
}

async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Reservation>>, AppError> {
    let reservation = state.reservations.cancel(user.user_id, id).await?;
    Ok(ApiResponse::ok(reservation))
}
