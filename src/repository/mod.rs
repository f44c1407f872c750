//! SQL access, one module per aggregate.
//!
//! Every function takes a `&mut PgConnection` so the caller decides the unit
//! of work: pass `&mut *tx` inside a transaction.
//!
//! Optional list filters are bound as arrays and an empty array disables the
//! condition (`cardinality($n) = 0 OR col = ANY($n)`). Paged reads bind
//! `LIMIT`/`OFFSET` as nullable values; `NULL` means "everything".

pub mod cart;
pub mod movie;
pub mod reservation;
pub mod room;
pub mod showtime;

use sqlx::error::ErrorKind;

use crate::error::AppError;
use crate::models::PageInput;

/// `LIMIT` and `OFFSET` bind values for an optional page.
pub(crate) fn limit_offset(page: Option<PageInput>) -> (Option<i64>, Option<i64>) {
    match page {
        Some(p) => (Some(p.size), Some(p.offset())),
        None => (None, None),
    }
}

/// Reservation items keep their showtime and seat rows alive. A delete that
/// trips one of those references becomes an input error with `message`.
pub(crate) fn still_referenced(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if matches!(db_err.kind(), ErrorKind::ForeignKeyViolation) => {
            tracing::debug!(constraint = ?db_err.constraint(), "delete blocked by reservation history");
            AppError::input(message)
        }
        _ => err.into(),
    }
}
