use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;

/// A user's pending claim on one seat of one showtime, joined with the
/// display fields of the showtime, movie, room and seat.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
    pub showtime_id: i64,
    pub seat_id: i64,
    /// Showtime price plus seat surcharge, captured when the cart was written.
    pub price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub movie: String,
    pub showtime_start: DateTime<Utc>,
    pub showtime_end: DateTime<Utc>,
    pub room: String,
    pub seat: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct CartInput {
    #[serde(default)]
    #[validate(range(min = 1, message = "is invalid"))]
    pub user_id: i64,
    #[validate(range(min = 1, message = "is invalid"))]
    pub showtime_id: i64,
    #[validate(range(min = 1, message = "is invalid"))]
    pub seat_id: i64,
}

impl CartInput {
    /// Binds the input to the calling user and validates every id.
    pub fn for_user(mut self, user_id: i64) -> Result<Self, AppError> {
        self.user_id = user_id;
        self.validate()?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartFilter {
    #[serde(default)]
    pub ids: Vec<i64>,
    #[serde(default)]
    pub user_ids: Vec<i64>,
    #[serde(default)]
    pub showtime_ids: Vec<i64>,
    #[serde(default)]
    pub seat_ids: Vec<i64>,
}

impl CartFilter {
    pub fn owned(user_id: i64, ids: Vec<i64>) -> Self {
        CartFilter { ids, user_ids: vec![user_id], ..Default::default() }
    }
}
