use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;
use crate::models::cart::Cart;

/// How long a fresh unpaid reservation keeps its seats off the market.
pub const HOLD_WINDOW_MINUTES: i64 = 30;
/// Reservations can no longer be cancelled this close to the earliest show.
pub const CANCEL_CUTOFF_HOURS: i64 = 6;

pub fn hold_window() -> Duration {
    Duration::minutes(HOLD_WINDOW_MINUTES)
}

pub fn cancel_cutoff() -> Duration {
    Duration::hours(CANCEL_CUTOFF_HOURS)
}

/// Unpaid reservations created after this instant still hold their seats.
pub fn hold_since(now: DateTime<Utc>) -> DateTime<Utc> {
    now - hold_window()
}

/// Reservation lifecycle: `Unpaid -> Paid` or `Unpaid -> Cancelled`.
/// `Paid` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reservation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Unpaid,
    Paid,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Unpaid => "unpaid",
            ReservationStatus::Paid => "paid",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Unpaid)
    }

    pub fn pay(self) -> Result<Self, AppError> {
        match self {
            ReservationStatus::Unpaid => Ok(ReservationStatus::Paid),
            other => Err(AppError::input(format!("reservation is already {}", other))),
        }
    }

    pub fn cancel(self) -> Result<Self, AppError> {
        match self {
            ReservationStatus::Unpaid => Ok(ReservationStatus::Cancelled),
            other => Err(AppError::input(format!("reservation is already {}", other))),
        }
    }

    /// Whether a reservation in this state, created at `created_at`, keeps its
    /// seats unavailable at `now`. Unpaid holds lapse after the hold window.
    pub fn blocks_seat(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            ReservationStatus::Paid => true,
            ReservationStatus::Unpaid => created_at > hold_since(now),
            ReservationStatus::Cancelled => false,
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "unpaid" => Ok(ReservationStatus::Unpaid),
            "paid" => Ok(ReservationStatus::Paid),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            other => Err(AppError::input(format!("status '{}' invalid", other))),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub user_id: i64,
    pub total_price: i64,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ReservationItem>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReservationItem {
    pub id: i64,
    pub reservation_id: i64,
    pub showtime_id: i64,
    pub seat_id: i64,
    pub price: i64,
    pub movie_title: String,
    pub room_name: String,
    pub seat_name: String,
    pub showtime_start: DateTime<Utc>,
    pub showtime_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationInput {
    #[serde(default)]
    pub cart_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ReservationFilter {
    pub ids: Vec<i64>,
    pub user_ids: Vec<i64>,
    pub statuses: Vec<ReservationStatus>,
    pub with_items: bool,
}

impl ReservationFilter {
    pub fn owned(user_id: i64, id: i64) -> Self {
        ReservationFilter {
            ids: vec![id],
            user_ids: vec![user_id],
            ..Default::default()
        }
    }

    pub fn with_items(mut self) -> Self {
        self.with_items = true;
        self
    }

    pub fn status_names(&self) -> Vec<String> {
        self.statuses.iter().map(|s| s.as_str().to_string()).collect()
    }
}

/// Parses a list of status names, reporting the first invalid index.
pub fn parse_statuses<S: AsRef<str>>(raw: &[S]) -> Result<Vec<ReservationStatus>, AppError> {
    raw.iter()
        .enumerate()
        .map(|(i, s)| {
            s.as_ref()
                .parse()
                .map_err(|_| AppError::input(format!("status with index {} invalid", i)))
        })
        .collect()
}

/// One line of a reservation about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftItem {
    pub showtime_id: i64,
    pub seat_id: i64,
    pub price: i64,
    pub movie_title: String,
    pub room_name: String,
    pub seat_name: String,
    pub showtime_start: DateTime<Utc>,
    pub showtime_end: DateTime<Utc>,
}

/// Result of consuming a user's carts. Writing it creates the reservation
/// and its items and deletes exactly `cart_ids`.
#[derive(Debug, Clone)]
pub struct ReservationDraft {
    pub user_id: i64,
    pub showtime_id: i64,
    pub total_price: i64,
    pub items: Vec<DraftItem>,
    pub cart_ids: Vec<i64>,
}

impl ReservationDraft {
    pub fn from_carts(user_id: i64, carts: Vec<Cart>) -> Result<Self, AppError> {
        if carts.is_empty() || carts.iter().any(|c| c.user_id != user_id) {
            return Err(AppError::input("cart not found"));
        }

        let showtime_id = carts[0].showtime_id;
        if carts.iter().any(|c| c.showtime_id != showtime_id) {
            return Err(AppError::input(
                "all carts in a reservation must be for the same showtime",
            ));
        }

        let total_price = carts
            .iter()
            .try_fold(0i64, |acc, c| acc.checked_add(c.price))
            .ok_or_else(|| AppError::input("total price is out of range"))?;

        let cart_ids = carts.iter().map(|c| c.id).collect();
        let items = carts
            .into_iter()
            .map(|c| DraftItem {
                showtime_id: c.showtime_id,
                seat_id: c.seat_id,
                price: c.price,
                movie_title: c.movie,
                room_name: c.room,
                seat_name: c.seat,
                showtime_start: c.showtime_start,
                showtime_end: c.showtime_end,
            })
            .collect();

        Ok(ReservationDraft {
            user_id,
            showtime_id,
            total_price,
            items,
            cart_ids,
        })
    }
}

/// Cancellation is allowed while the earliest show in the reservation is at
/// least the cutoff away. Exactly at the cutoff is still allowed. `earliest`
/// must come from the live showtimes, not the item snapshots.
pub fn ensure_cancellable(earliest: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<(), AppError> {
    if let Some(start) = earliest {
        if start - now < cancel_cutoff() {
            return Err(AppError::input(format!(
                "cannot cancel reservation less than {} hours before the showtime",
                CANCEL_CUTOFF_HOURS
            )));
        }
    }
    Ok(())
}
