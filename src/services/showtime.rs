use chrono::Utc;
use tracing::info;

use crate::database::{Database, Tx};
use crate::error::AppError;
use crate::models::availability::annotate_seats;
use crate::models::reservation::hold_since;
use crate::models::showtime::ensure_no_overlap;
use crate::models::{PageInput, Paginate, Showtime, ShowtimeFilter, ShowtimeInput, ShowtimeSeat};
use crate::repository::{movie, reservation, room, showtime};

#[derive(Clone)]
pub struct ShowtimeService {
    db: Database,
}

impl ShowtimeService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create(&self, input: ShowtimeInput) -> Result<Showtime, AppError> {
        let input = input.at_storage_precision();
        let mut tx = self.db.begin().await?;
        check_schedule(&mut tx, &input, None).await?;

        let id = showtime::insert(&mut tx, &input).await?;
        let created = load_showtime(&mut tx, id).await?;
        tx.commit().await?;

        info!(showtime_id = id, room_id = input.room_id, movie_id = input.movie_id, "showtime created");
        Ok(created)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_by_id(&self, id: i64, input: ShowtimeInput) -> Result<Showtime, AppError> {
        let input = input.at_storage_precision();
        let mut tx = self.db.begin().await?;
        if !showtime::exists(&mut tx, id).await? {
            return Err(AppError::not_found("showtime not found"));
        }
        check_schedule(&mut tx, &input, Some(id)).await?;

        showtime::update(&mut tx, id, &input).await?;
        let updated = load_showtime(&mut tx, id).await?;
        tx.commit().await?;

        info!(showtime_id = id, room_id = input.room_id, "showtime updated");
        Ok(updated)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Showtime, AppError> {
        let mut tx = self.db.begin().await?;
        let found = load_showtime(&mut tx, id).await?;
        tx.commit().await?;
        Ok(found)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_by_id(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        if !showtime::delete(&mut tx, id).await? {
            return Err(AppError::not_found("showtime not found"));
        }
        tx.commit().await?;

        info!(showtime_id = id, "showtime deleted");
        Ok(())
    }

    pub async fn pagination(&self, filter: ShowtimeFilter, page: PageInput) -> Result<Paginate<Showtime>, AppError> {
        let mut tx = self.db.begin().await?;
        let total = showtime::count(&mut tx, &filter).await?;
        let paged = Paginate::empty(total, page);
        let page = paged.clamp(page);
        let showtimes = showtime::find(&mut tx, &filter, hold_since(Utc::now()), Some(page)).await?;
        tx.commit().await?;
        Ok(paged.with_items(page, showtimes))
    }

    /// Every seat of the showtime's room with its availability right now.
    /// Only reservations block seats, carts never do.
    pub async fn get_showtime_seats(&self, id: i64) -> Result<Vec<ShowtimeSeat>, AppError> {
        let mut tx = self.db.begin().await?;
        let room_id = showtime::room_of(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("showtime not found"))?;
        let seats = room::list_seats(&mut tx, room_id).await?;
        let holds = reservation::holds_for_showtime(&mut tx, id).await?;
        tx.commit().await?;

        Ok(annotate_seats(seats, &holds, Utc::now()))
    }
}

/// Validates a showtime against its movie and the other showtimes of its
/// room. Touches the room row first so concurrent schedulers of one room
/// conflict instead of both passing the overlap check.
async fn check_schedule(tx: &mut Tx, input: &ShowtimeInput, exclude: Option<i64>) -> Result<(), AppError> {
    let window = input.checked_window()?;

    if !room::touch(tx, input.room_id).await? {
        return Err(AppError::not_found("room not found"));
    }
    let screened = movie::find_one(tx, input.movie_id)
        .await?
        .ok_or_else(|| AppError::not_found("movie not found"))?;
    screened.ensure_fits(&window)?;

    let scheduled = showtime::slots_near(tx, input.room_id, &window).await?;
    ensure_no_overlap(&window, &scheduled, exclude)
}

async fn load_showtime(tx: &mut Tx, id: i64) -> Result<Showtime, AppError> {
    showtime::find_one(tx, id, hold_since(Utc::now()))
        .await?
        .ok_or_else(|| AppError::not_found("showtime not found"))
}
