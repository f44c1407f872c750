use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use validator::Validate;

use crate::error::AppError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of seats in the roster.
    pub capacity: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RoomInput {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
}

impl RoomInput {
    pub fn normalized(mut self) -> Result<Self, AppError> {
        self.name = self.name.trim().to_string();
        self.validate()?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomFilter {
    #[serde(default)]
    pub ids: Vec<i64>,
    #[serde(default)]
    pub names: Vec<String>,
    /// `Some(true)`: rooms with at least one seat, `Some(false)`: empty rooms.
    #[serde(default)]
    pub is_usable: Option<bool>,
}

impl RoomFilter {
    pub fn by_id(id: i64) -> Self {
        RoomFilter { ids: vec![id], ..Default::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub room_id: i64,
    pub name: String,
    pub additional_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Desired state of one seat when a roster is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct SeatInput {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "minimum is 0"))]
    pub additional_price: i64,
}

impl SeatInput {
    pub fn new(name: impl Into<String>, additional_price: i64) -> Self {
        SeatInput { name: name.into(), additional_price }
    }
}

/// Trims and validates a full roster submission. Seat names must be unique
/// within one submission.
pub fn normalize_roster(input: Vec<SeatInput>) -> Result<Vec<SeatInput>, AppError> {
    let mut seen = HashSet::with_capacity(input.len());
    let mut roster = Vec::with_capacity(input.len());

    for (idx, mut seat) in input.into_iter().enumerate() {
        seat.name = seat.name.trim().to_string();
        seat.validate()
            .map_err(|e| AppError::input(format!("seat index {}: {}", idx, AppError::from(e))))?;
        if !seen.insert(seat.name.clone()) {
            return Err(AppError::input(format!("duplicate seat name '{}'", seat.name)));
        }
        roster.push(seat);
    }

    Ok(roster)
}

/// A room seat as seen from one showtime.
#[derive(Debug, Clone, Serialize)]
pub struct ShowtimeSeat {
    #[serde(flatten)]
    pub seat: Seat,
    pub is_available: bool,
}
