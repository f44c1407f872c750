use tracing::info;

use crate::database::{Database, Tx};
use crate::error::AppError;
use crate::models::{Cart, CartFilter, CartInput, PageInput, Paginate};
use crate::repository::cart;

const SEAT_NOT_IN_ROOM: &str = "seat or showtime invalid, the seat must belong to the showtime room";

/// Carts are always scoped to their owner: another user's cart behaves
/// exactly like a missing one.
#[derive(Clone)]
pub struct CartService {
    db: Database,
}

impl CartService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create(&self, user_id: i64, input: CartInput) -> Result<Cart, AppError> {
        let input = input.for_user(user_id)?;

        let mut tx = self.db.begin().await?;
        let id = cart::insert(&mut tx, &input)
            .await?
            .ok_or_else(|| AppError::input(SEAT_NOT_IN_ROOM))?;
        let created = load_cart(&mut tx, user_id, id).await?;
        tx.commit().await?;

        info!(cart_id = id, user_id, price = created.price, "cart created");
        Ok(created)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_by_id(&self, user_id: i64, id: i64, input: CartInput) -> Result<Cart, AppError> {
        let input = input.for_user(user_id)?;

        let mut tx = self.db.begin().await?;
        load_cart(&mut tx, user_id, id).await?;
        if !cart::update(&mut tx, id, &input).await? {
            return Err(AppError::input(SEAT_NOT_IN_ROOM));
        }
        let updated = load_cart(&mut tx, user_id, id).await?;
        tx.commit().await?;

        info!(cart_id = id, user_id, price = updated.price, "cart updated");
        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_by_id(&self, user_id: i64, id: i64) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        if !cart::delete(&mut tx, user_id, id).await? {
            return Err(AppError::not_found("cart not found"));
        }
        tx.commit().await?;

        info!(cart_id = id, user_id, "cart deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, user_id: i64, id: i64) -> Result<Cart, AppError> {
        let mut tx = self.db.begin().await?;
        let found = load_cart(&mut tx, user_id, id).await?;
        tx.commit().await?;
        Ok(found)
    }

    pub async fn pagination(&self, filter: CartFilter, page: PageInput) -> Result<Paginate<Cart>, AppError> {
        let mut tx = self.db.begin().await?;
        let total = cart::count(&mut tx, &filter).await?;
        let paged = Paginate::empty(total, page);
        let page = paged.clamp(page);
        let carts = cart::find(&mut tx, &filter, Some(page)).await?;
        tx.commit().await?;
        Ok(paged.with_items(page, carts))
    }
}

async fn load_cart(tx: &mut Tx, user_id: i64, id: i64) -> Result<Cart, AppError> {
    cart::find_owned(tx, user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("cart not found"))
}
