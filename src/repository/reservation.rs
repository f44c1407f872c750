use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::error::AppError;
use crate::models::availability::SeatHold;
use crate::models::reservation::ReservationDraft;
use crate::models::{PageInput, Reservation, ReservationFilter, ReservationItem, ReservationStatus};

use super::limit_offset;

const RESERVATION_WHERE: &str = r#"
    WHERE (cardinality($1::bigint[]) = 0 OR r.id = ANY($1))
      AND (cardinality($2::bigint[]) = 0 OR r.user_id = ANY($2))
      AND (cardinality($3::text[]) = 0 OR r.status::text = ANY($3))
"#;

/// Writes the reservation row and one item per drafted cart line.
pub async fn insert(conn: &mut PgConnection, draft: &ReservationDraft) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO reservations (user_id, total_price, status) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(draft.user_id)
    .bind(draft.total_price)
    .bind(ReservationStatus::Unpaid)
    .fetch_one(&mut *conn)
    .await?;

    let items = &draft.items;
    let showtime_ids: Vec<i64> = items.iter().map(|i| i.showtime_id).collect();
    let seat_ids: Vec<i64> = items.iter().map(|i| i.seat_id).collect();
    let prices: Vec<i64> = items.iter().map(|i| i.price).collect();
    let movie_titles: Vec<&str> = items.iter().map(|i| i.movie_title.as_str()).collect();
    let room_names: Vec<&str> = items.iter().map(|i| i.room_name.as_str()).collect();
    let seat_names: Vec<&str> = items.iter().map(|i| i.seat_name.as_str()).collect();
    let starts: Vec<DateTime<Utc>> = items.iter().map(|i| i.showtime_start).collect();
    let ends: Vec<DateTime<Utc>> = items.iter().map(|i| i.showtime_end).collect();

    sqlx::query(
        r#"
        INSERT INTO reservation_items
            (reservation_id, showtime_id, seat_id, price, movie_title, room_name,
             seat_name, showtime_start, showtime_end)
        SELECT $1, u.*
        FROM UNNEST($2::bigint[], $3::bigint[], $4::bigint[], $5::text[], $6::text[],
                    $7::text[], $8::timestamptz[], $9::timestamptz[])
             AS u(showtime_id, seat_id, price, movie_title, room_name,
                  seat_name, showtime_start, showtime_end)
        "#,
    )
    .bind(id)
    .bind(&showtime_ids)
    .bind(&seat_ids)
    .bind(&prices)
    .bind(&movie_titles)
    .bind(&room_names)
    .bind(&seat_names)
    .bind(&starts)
    .bind(&ends)
    .execute(conn)
    .await?;

    Ok(id)
}

/// Moves an unpaid reservation to `status`. Returns `false` if it was no
/// longer unpaid.
pub async fn transition(
    conn: &mut PgConnection,
    id: i64,
    status: ReservationStatus,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE reservations
        SET status = $2, updated_at = NOW()
        WHERE id = $1 AND status = 'unpaid'
        "#,
    )
    .bind(id)
    .bind(status)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(conn: &mut PgConnection, user_id: i64, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM reservations WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find(
    conn: &mut PgConnection,
    filter: &ReservationFilter,
    page: Option<PageInput>,
) -> Result<Vec<Reservation>, AppError> {
    let (limit, offset) = limit_offset(page);
    let sql = format!(
        r#"
        SELECT r.id, r.user_id, r.total_price, r.status, r.created_at, r.updated_at
        FROM reservations r
        {RESERVATION_WHERE}
        ORDER BY r.id DESC
        LIMIT $4 OFFSET $5
        "#
    );

    let mut reservations = sqlx::query_as::<_, Reservation>(&sql)
        .bind(&filter.ids)
        .bind(&filter.user_ids)
        .bind(filter.status_names())
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

    if filter.with_items && !reservations.is_empty() {
        let ids: Vec<i64> = reservations.iter().map(|r| r.id).collect();
        let mut items = items_for(conn, &ids).await?;
        for reservation in reservations.iter_mut() {
            let (mine, rest): (Vec<_>, Vec<_>) =
                items.into_iter().partition(|i| i.reservation_id == reservation.id);
            reservation.items = Some(mine);
            items = rest;
        }
    }

    Ok(reservations)
}

pub async fn find_one(
    conn: &mut PgConnection,
    filter: &ReservationFilter,
) -> Result<Option<Reservation>, AppError> {
    let mut reservations = find(conn, filter, Some(PageInput::new(1, 1))).await?;
    Ok(reservations.pop())
}

pub async fn count(conn: &mut PgConnection, filter: &ReservationFilter) -> Result<i64, AppError> {
    let sql = format!("SELECT COUNT(*) FROM reservations r {RESERVATION_WHERE}");
    let total = sqlx::query_scalar(&sql)
        .bind(&filter.ids)
        .bind(&filter.user_ids)
        .bind(filter.status_names())
        .fetch_one(conn)
        .await?;
    Ok(total)
}

pub async fn items_for(conn: &mut PgConnection, reservation_ids: &[i64]) -> Result<Vec<ReservationItem>, AppError> {
    let items = sqlx::query_as::<_, ReservationItem>(
        r#"
        SELECT id, reservation_id, showtime_id, seat_id, price, movie_title, room_name,
               seat_name, showtime_start, showtime_end, created_at
        FROM reservation_items
        WHERE reservation_id = ANY($1)
        ORDER BY reservation_id, id
        "#,
    )
    .bind(reservation_ids)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Earliest current start among the showtimes the reservation covers. Reads
/// the showtimes table, so a rescheduled show is seen at its new time.
pub async fn earliest_showtime_start(
    conn: &mut PgConnection,
    reservation_id: i64,
) -> Result<Option<DateTime<Utc>>, AppError> {
    let start = sqlx::query_scalar(
        r#"
        SELECT MIN(st.start_at)
        FROM reservation_items ri
        JOIN showtimes st ON st.id = ri.showtime_id
        WHERE ri.reservation_id = $1
        "#,
    )
    .bind(reservation_id)
    .fetch_one(conn)
    .await?;
    Ok(start)
}

/// Every reservation item of the showtime with its parent's status and age.
pub async fn holds_for_showtime(conn: &mut PgConnection, showtime_id: i64) -> Result<Vec<SeatHold>, AppError> {
    let holds = sqlx::query_as::<_, SeatHold>(
        r#"
        SELECT ri.seat_id, r.status, r.created_at
        FROM reservation_items ri
        JOIN reservations r ON r.id = ri.reservation_id
        WHERE ri.showtime_id = $1
        "#,
    )
    .bind(showtime_id)
    .fetch_all(conn)
    .await?;
    Ok(holds)
}

/// Cancels unpaid reservations created at or before `created_before`.
pub async fn cancel_stale(conn: &mut PgConnection, created_before: DateTime<Utc>) -> Result<Vec<i64>, AppError> {
    let ids = sqlx::query_scalar(
        r#"
        UPDATE reservations
        SET status = 'cancelled', updated_at = NOW()
        WHERE status = 'unpaid' AND created_at <= $1
        RETURNING id
        "#,
    )
    .bind(created_before)
    .fetch_all(conn)
    .await?;
    Ok(ids)
}
