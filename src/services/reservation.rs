use chrono::Utc;
use tracing::info;

use crate::database::{Database, Tx};
use crate::error::AppError;
use crate::models::reservation::{ensure_cancellable, ReservationDraft};
use crate::models::{
    CartFilter, PageInput, Paginate, Reservation, ReservationFilter, ReservationInput,
    ReservationStatus,
};
use crate::repository::{cart, reservation};

#[derive(Clone)]
pub struct ReservationService {
    db: Database,
}

impl ReservationService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Converts the caller's carts into one unpaid reservation. The carts are
    /// consumed: reservation, items and cart deletion commit together.
    #[tracing::instrument(skip(self, input), fields(carts = input.cart_ids.len()))]
    pub async fn create(&self, user_id: i64, input: ReservationInput) -> Result<Reservation, AppError> {
        if input.cart_ids.is_empty() {
            return Err(AppError::input("cart_ids is required"));
        }

        let mut tx = self.db.begin().await?;
        let carts = cart::find(&mut tx, &CartFilter::owned(user_id, input.cart_ids), None).await?;
        let draft = ReservationDraft::from_carts(user_id, carts)?;

        let id = reservation::insert(&mut tx, &draft).await?;
        let consumed = cart::delete_many(&mut tx, user_id, &draft.cart_ids).await?;
        if consumed != draft.cart_ids.len() as u64 {
            return Err(AppError::Conflict(
                "carts changed while the reservation was created, please retry".to_string(),
            ));
        }
        let created = load_reservation(&mut tx, user_id, id).await?;
        tx.commit().await?;

        info!(
            reservation_id = id,
            user_id,
            showtime_id = draft.showtime_id,
            items = draft.items.len(),
            total_price = draft.total_price,
            "reservation created"
        );
        Ok(created)
    }

    #[tracing::instrument(skip(self))]
    pub async fn pay(&self, user_id: i64, id: i64) -> Result<Reservation, AppError> {
        let mut tx = self.db.begin().await?;
        let current = find_for_transition(&mut tx, user_id, id).await?;
        let next = current.status.pay()?;

        apply_transition(&mut tx, id, next).await?;
        let paid = load_reservation(&mut tx, user_id, id).await?;
        tx.commit().await?;

        info!(reservation_id = id, user_id, total_price = paid.total_price, "reservation paid");
        Ok(paid)
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, user_id: i64, id: i64) -> Result<Reservation, AppError> {
        let mut tx = self.db.begin().await?;
        let current = find_for_transition(&mut tx, user_id, id).await?;
        let next = current.status.cancel()?;
        let earliest = reservation::earliest_showtime_start(&mut tx, id).await?;
        ensure_cancellable(earliest, Utc::now())?;

        apply_transition(&mut tx, id, next).await?;
        let cancelled = load_reservation(&mut tx, user_id, id).await?;
        tx.commit().await?;

        info!(reservation_id = id, user_id, "reservation cancelled");
        Ok(cancelled)
    }

    /// Removes the reservation whatever its status.
    #[tracing::instrument(skip(self))]
    pub async fn user_delete_by_id(&self, user_id: i64, id: i64) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        if !reservation::delete(&mut tx, user_id, id).await? {
            return Err(AppError::not_found("reservation not found"));
        }
        tx.commit().await?;

        info!(reservation_id = id, user_id, "reservation deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, user_id: i64, id: i64) -> Result<Reservation, AppError> {
        let mut tx = self.db.begin().await?;
        let found = load_reservation(&mut tx, user_id, id).await?;
        tx.commit().await?;
        Ok(found)
    }

    pub async fn pagination(
        &self,
        filter: ReservationFilter,
        page: PageInput,
    ) -> Result<Paginate<Reservation>, AppError> {
        let mut tx = self.db.begin().await?;
        let total = reservation::count(&mut tx, &filter).await?;
        let paged = Paginate::empty(total, page);
        let page = paged.clamp(page);
        let reservations = reservation::find(&mut tx, &filter, Some(page)).await?;
        tx.commit().await?;
        Ok(paged.with_items(page, reservations))
    }
}

/// Pay and cancel only see the caller's own reservation. A missing or
/// foreign one is an input error.
async fn find_for_transition(tx: &mut Tx, user_id: i64, id: i64) -> Result<Reservation, AppError> {
    reservation::find_one(tx, &ReservationFilter::owned(user_id, id))
        .await?
        .ok_or_else(|| AppError::input("reservation not found"))
}

async fn apply_transition(tx: &mut Tx, id: i64, next: ReservationStatus) -> Result<(), AppError> {
    if !reservation::transition(tx, id, next).await? {
        return Err(AppError::Conflict(
            "reservation status changed concurrently, please retry".to_string(),
        ));
    }
    Ok(())
}

async fn load_reservation(tx: &mut Tx, user_id: i64, id: i64) -> Result<Reservation, AppError> {
    reservation::find_one(tx, &ReservationFilter::owned(user_id, id).with_items())
        .await?
        .ok_or_else(|| AppError::not_found("reservation not found"))
}
