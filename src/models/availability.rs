use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::collections::HashSet;

use crate::models::reservation::ReservationStatus;
use crate::models::room::{Seat, ShowtimeSeat};

/// A reservation item of one showtime together with its parent's state.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct SeatHold {
    pub seat_id: i64,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

impl SeatHold {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status.blocks_seat(self.created_at, now)
    }
}

/// Seat ids that are taken at `now`. Carts never appear here: only
/// reservations hold seats.
pub fn blocked_seats(holds: &[SeatHold], now: DateTime<Utc>) -> HashSet<i64> {
    holds
        .iter()
        .filter(|h| h.is_active(now))
        .map(|h| h.seat_id)
        .collect()
}

pub fn annotate_seats(seats: Vec<Seat>, holds: &[SeatHold], now: DateTime<Utc>) -> Vec<ShowtimeSeat> {
    let blocked = blocked_seats(holds, now);
    seats
        .into_iter()
        .map(|seat| {
            let is_available = !blocked.contains(&seat.id);
            ShowtimeSeat { seat, is_available }
        })
        .collect()
}
