use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::error::AppError;
use crate::models::showtime::ScheduledSlot;
use crate::models::{PageInput, Showtime, ShowtimeFilter, ShowtimeInput, TimeWindow};

use super::{limit_offset, still_referenced};

const SHOWTIME_WHERE: &str = r#"
    WHERE (cardinality($1::bigint[]) = 0 OR st.id = ANY($1))
      AND (cardinality($2::bigint[]) = 0 OR st.movie_id = ANY($2))
      AND (cardinality($3::bigint[]) = 0 OR st.room_id = ANY($3))
      AND ($4::timestamptz IS NULL OR st.start_at >= $4)
"#;

pub async fn insert(conn: &mut PgConnection, input: &ShowtimeInput) -> Result<i64, AppError> {
    let id = sqlx::query_scalar(
        r#"
        INSERT INTO showtimes (movie_id, room_id, start_at, end_at, price)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(input.movie_id)
    .bind(input.room_id)
    .bind(input.start_at)
    .bind(input.end_at)
    .bind(input.price)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn update(conn: &mut PgConnection, id: i64, input: &ShowtimeInput) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE showtimes
        SET movie_id = $2, room_id = $3, start_at = $4, end_at = $5, price = $6, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(input.movie_id)
    .bind(input.room_id)
    .bind(input.start_at)
    .bind(input.end_at)
    .bind(input.price)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(conn: &mut PgConnection, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM showtimes WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| still_referenced(e, "showtime has reservations and cannot be deleted"))?;
    Ok(result.rows_affected() > 0)
}

pub async fn exists(conn: &mut PgConnection, id: i64) -> Result<bool, AppError> {
    let found = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM showtimes WHERE id = $1)")
        .bind(id)
        .fetch_one(conn)
        .await?;
    Ok(found)
}

pub async fn room_of(conn: &mut PgConnection, id: i64) -> Result<Option<i64>, AppError> {
    let room_id = sqlx::query_scalar("SELECT room_id FROM showtimes WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(room_id)
}

/// Showtimes of the room whose closed interval meets `window`. The caller
/// still runs the overlap rule on the result, this only narrows the scan.
pub async fn slots_near(
    conn: &mut PgConnection,
    room_id: i64,
    window: &TimeWindow,
) -> Result<Vec<ScheduledSlot>, AppError> {
    let slots = sqlx::query_as::<_, ScheduledSlot>(
        r#"
        SELECT id, start_at, end_at
        FROM showtimes
        WHERE room_id = $1 AND start_at <= $3 AND end_at >= $2
        ORDER BY start_at
        "#,
    )
    .bind(room_id)
    .bind(window.start())
    .bind(window.end())
    .fetch_all(conn)
    .await?;
    Ok(slots)
}

/// `hold_since`: unpaid reservations created after this instant still hold
/// their seats.
pub async fn find(
    conn: &mut PgConnection,
    filter: &ShowtimeFilter,
    hold_since: DateTime<Utc>,
    page: Option<PageInput>,
) -> Result<Vec<Showtime>, AppError> {
    let (limit, offset) = limit_offset(page);
    let sql = format!(
        r#"
        SELECT st.id, st.movie_id, st.room_id, st.start_at, st.end_at, st.price,
               st.created_at, st.updated_at,
               m.title AS movie_title,
               r.name AS room_name,
               (SELECT COUNT(*) FROM seats s WHERE s.room_id = st.room_id) AS total_seats,
               (SELECT COUNT(*) FROM seats s
                WHERE s.room_id = st.room_id
                  AND NOT EXISTS (
                      SELECT 1
                      FROM reservation_items ri
                      JOIN reservations rv ON rv.id = ri.reservation_id
                      WHERE ri.showtime_id = st.id
                        AND ri.seat_id = s.id
                        AND (rv.status = 'paid' OR (rv.status = 'unpaid' AND rv.created_at > $5))
                  )) AS available_seats
        FROM showtimes st
        JOIN movies m ON m.id = st.movie_id
        JOIN rooms r ON r.id = st.room_id
        {SHOWTIME_WHERE}
        ORDER BY st.start_at, st.id
        LIMIT $6 OFFSET $7
        "#
    );

    let showtimes = sqlx::query_as::<_, Showtime>(&sql)
        .bind(&filter.ids)
        .bind(&filter.movie_ids)
        .bind(&filter.room_ids)
        .bind(filter.after)
        .bind(hold_since)
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await?;
    Ok(showtimes)
}

pub async fn find_one(
    conn: &mut PgConnection,
    id: i64,
    hold_since: DateTime<Utc>,
) -> Result<Option<Showtime>, AppError> {
    let filter = ShowtimeFilter { ids: vec![id], ..Default::default() };
    let mut showtimes = find(conn, &filter, hold_since, None).await?;
    Ok(showtimes.pop())
}

pub async fn count(conn: &mut PgConnection, filter: &ShowtimeFilter) -> Result<i64, AppError> {
    let sql = format!("SELECT COUNT(*) FROM showtimes st {SHOWTIME_WHERE}");
    let total = sqlx::query_scalar(&sql)
        .bind(&filter.ids)
        .bind(&filter.movie_ids)
        .bind(&filter.room_ids)
        .bind(filter.after)
        .fetch_one(conn)
        .await?;
    Ok(total)
}
