use tracing::info;

use crate::database::Database;
use crate::error::AppError;
use crate::models::room::normalize_roster;
use crate::models::{PageInput, Paginate, Room, RoomFilter, RoomInput, Seat, SeatInput};
use crate::repository::room;
use crate::services::roster::diff_roster;

#[derive(Clone)]
pub struct RoomService {
    db: Database,
}

impl RoomService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn create(&self, input: RoomInput) -> Result<Room, AppError> {
        let input = input.normalized()?;

        let mut tx = self.db.begin().await?;
        let id = room::insert(&mut tx, &input).await?;
        let created = room::find_one(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("room not found"))?;
        tx.commit().await?;

        info!(room_id = id, name = %created.name, "room created");
        Ok(created)
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn update_by_id(&self, id: i64, input: RoomInput) -> Result<Room, AppError> {
        let input = input.normalized()?;

        let mut tx = self.db.begin().await?;
        if !room::update(&mut tx, id, &input).await? {
            return Err(AppError::not_found("room not found"));
        }
        let updated = room::find_one(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("room not found"))?;
        tx.commit().await?;

        info!(room_id = id, "room updated");
        Ok(updated)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Room, AppError> {
        let mut tx = self.db.begin().await?;
        let found = room::find_one(&mut tx, id).await?;
        tx.commit().await?;
        found.ok_or_else(|| AppError::not_found("room not found"))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_by_id(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        if !room::delete(&mut tx, id).await? {
            return Err(AppError::not_found("room not found"));
        }
        tx.commit().await?;

        info!(room_id = id, "room deleted");
        Ok(())
    }

    pub async fn pagination(&self, filter: RoomFilter, page: PageInput) -> Result<Paginate<Room>, AppError> {
        let mut tx = self.db.begin().await?;
        let total = room::count(&mut tx, &filter).await?;
        let paged = Paginate::empty(total, page);
        let page = paged.clamp(page);
        let rooms = room::find(&mut tx, &filter, Some(page)).await?;
        tx.commit().await?;
        Ok(paged.with_items(page, rooms))
    }

    pub async fn list_seats(&self, room_id: i64) -> Result<Vec<Seat>, AppError> {
        let mut tx = self.db.begin().await?;
        if room::find_one(&mut tx, room_id).await?.is_none() {
            return Err(AppError::not_found("room not found"));
        }
        let seats = room::list_seats(&mut tx, room_id).await?;
        tx.commit().await?;
        Ok(seats)
    }

    /// Replaces the room's roster with `desired`. Seats whose name survives
    /// keep their id; deletes run first, then updates, then inserts.
    #[tracing::instrument(skip(self, desired), fields(desired = desired.len()))]
    pub async fn set_seats(&self, room_id: i64, desired: Vec<SeatInput>) -> Result<Vec<Seat>, AppError> {
        let desired = normalize_roster(desired)?;

        let mut tx = self.db.begin().await?;
        if !room::touch(&mut tx, room_id).await? {
            return Err(AppError::not_found("room not found"));
        }

        let existing = room::list_seats(&mut tx, room_id).await?;
        let diff = diff_roster(&existing, &desired);

        let mut deleted = 0;
        let mut updated = 0;
        let mut inserted = 0;
        if !diff.to_delete.is_empty() {
            deleted = room::delete_seats(&mut tx, room_id, &diff.to_delete).await?;
        }
        if !diff.to_update.is_empty() {
            updated = room::update_seat_prices(&mut tx, &diff.to_update).await?;
        }
        if !diff.to_insert.is_empty() {
            inserted = room::insert_seats(&mut tx, room_id, &diff.to_insert).await?;
        }

        let seats = room::list_seats(&mut tx, room_id).await?;
        tx.commit().await?;

        info!(room_id, inserted, updated, deleted, total = seats.len(), "seat roster replaced");
        Ok(seats)
    }
}
