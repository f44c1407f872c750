use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;

/// Screening interval of a showtime. `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AppError> {
        if start >= end {
            return Err(AppError::input("time invalid, start must be before end"));
        }
        Ok(TimeWindow { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// Two screenings in the same room conflict when an endpoint of either
    /// one equals or lies inside the other. Touching boundaries conflict too,
    /// so back-to-back screenings need at least one instant between them.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Showtime {
    pub id: i64,
    pub movie_id: i64,
    pub room_id: i64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub movie_title: String,
    pub room_name: String,
    pub total_seats: i64,
    pub available_seats: i64,
}

/// Minimal row used by the overlap check.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct ScheduledSlot {
    pub id: i64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl ScheduledSlot {
    pub fn window(&self) -> TimeWindow {
        // rows satisfy the table's start_at < end_at check
        TimeWindow { start: self.start_at, end: self.end_at }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ShowtimeInput {
    #[validate(range(min = 1, message = "is invalid"))]
    pub movie_id: i64,
    #[validate(range(min = 1, message = "is invalid"))]
    pub room_id: i64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[validate(range(min = 1, message = "must be greater than 0"))]
    pub price: i64,
}

impl ShowtimeInput {
    /// Truncates both instants to microseconds, the precision of a stored
    /// timestamptz, so checks see the values that will be written.
    pub fn at_storage_precision(self) -> Self {
        ShowtimeInput {
            start_at: self.start_at.trunc_subsecs(6),
            end_at: self.end_at.trunc_subsecs(6),
            ..self
        }
    }

    pub fn checked_window(&self) -> Result<TimeWindow, AppError> {
        self.validate()?;
        TimeWindow::new(self.start_at, self.end_at)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShowtimeFilter {
    #[serde(default)]
    pub ids: Vec<i64>,
    #[serde(default)]
    pub movie_ids: Vec<i64>,
    #[serde(default)]
    pub room_ids: Vec<i64>,
    /// Only showtimes starting at or after this instant.
    #[serde(default)]
    pub after: Option<DateTime<Utc>>,
}

/// Rejects `window` if it conflicts with any other showtime of the room.
/// `exclude` is the showtime being updated, which never conflicts with itself.
pub fn ensure_no_overlap(
    window: &TimeWindow,
    scheduled: &[ScheduledSlot],
    exclude: Option<i64>,
) -> Result<(), AppError> {
    let clash = scheduled
        .iter()
        .filter(|slot| Some(slot.id) != exclude)
        .any(|slot| slot.window().overlaps(window));

    if clash {
        return Err(AppError::input(
            "showtime room overlapping with other showtime",
        ));
    }
    Ok(())
}
