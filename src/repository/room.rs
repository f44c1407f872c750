use sqlx::PgConnection;

use crate::error::AppError;
use crate::models::{PageInput, Room, RoomFilter, RoomInput, Seat, SeatInput};

use super::{limit_offset, still_referenced};

const ROOM_WHERE: &str = r#"
    WHERE (cardinality($1::bigint[]) = 0 OR r.id = ANY($1))
      AND (cardinality($2::text[]) = 0 OR r.name = ANY($2))
      AND ($3::boolean IS NULL OR EXISTS (SELECT 1 FROM seats s WHERE s.room_id = r.id) = $3)
"#;

pub async fn insert(conn: &mut PgConnection, input: &RoomInput) -> Result<i64, AppError> {
    let id = sqlx::query_scalar("INSERT INTO rooms (name) VALUES ($1) RETURNING id")
        .bind(&input.name)
        .fetch_one(conn)
        .await?;
    Ok(id)
}

pub async fn update(conn: &mut PgConnection, id: i64, input: &RoomInput) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE rooms SET name = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(&input.name)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(conn: &mut PgConnection, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| still_referenced(e, "room has reservations and cannot be deleted"))?;
    Ok(result.rows_affected() > 0)
}

/// Writes the room row without changing it. Concurrent writers of the same
/// room collide here, and the statement doubles as an existence check.
pub async fn touch(conn: &mut PgConnection, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE rooms SET updated_at = updated_at WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find(
    conn: &mut PgConnection,
    filter: &RoomFilter,
    page: Option<PageInput>,
) -> Result<Vec<Room>, AppError> {
    let (limit, offset) = limit_offset(page);
    let sql = format!(
        r#"
        SELECT r.id, r.name, r.created_at, r.updated_at,
               (SELECT COUNT(*) FROM seats s WHERE s.room_id = r.id) AS capacity
        FROM rooms r
        {ROOM_WHERE}
        ORDER BY r.id
        LIMIT $4 OFFSET $5
        "#
    );

    let rooms = sqlx::query_as::<_, Room>(&sql)
        .bind(&filter.ids)
        .bind(&filter.names)
        .bind(filter.is_usable)
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await?;
    Ok(rooms)
}

pub async fn find_one(conn: &mut PgConnection, id: i64) -> Result<Option<Room>, AppError> {
    let mut rooms = find(conn, &RoomFilter::by_id(id), None).await?;
    Ok(rooms.pop())
}

pub async fn count(conn: &mut PgConnection, filter: &RoomFilter) -> Result<i64, AppError> {
    let sql = format!("SELECT COUNT(*) FROM rooms r {ROOM_WHERE}");
    let total = sqlx::query_scalar(&sql)
        .bind(&filter.ids)
        .bind(&filter.names)
        .bind(filter.is_usable)
        .fetch_one(conn)
        .await?;
    Ok(total)
}

pub async fn list_seats(conn: &mut PgConnection, room_id: i64) -> Result<Vec<Seat>, AppError> {
    let seats = sqlx::query_as::<_, Seat>(
        r#"
        SELECT id, room_id, name, additional_price, created_at, updated_at
        FROM seats
        WHERE room_id = $1
        ORDER BY name, id
        "#,
    )
    .bind(room_id)
    .fetch_all(conn)
    .await?;
    Ok(seats)
}

pub async fn delete_seats(conn: &mut PgConnection, room_id: i64, ids: &[i64]) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM seats WHERE room_id = $1 AND id = ANY($2)")
        .bind(room_id)
        .bind(ids)
        .execute(conn)
        .await
        .map_err(|e| still_referenced(e, "reserved seats cannot be removed from the room"))?;
    Ok(result.rows_affected())
}

pub async fn update_seat_prices(conn: &mut PgConnection, seats: &[Seat]) -> Result<u64, AppError> {
    let ids: Vec<i64> = seats.iter().map(|s| s.id).collect();
    let prices: Vec<i64> = seats.iter().map(|s| s.additional_price).collect();

    let result = sqlx::query(
        r#"
        UPDATE seats s
        SET additional_price = u.additional_price, updated_at = NOW()
        FROM UNNEST($1::bigint[], $2::bigint[]) AS u(id, additional_price)
        WHERE s.id = u.id
        "#,
    )
    .bind(&ids)
    .bind(&prices)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn insert_seats(
    conn: &mut PgConnection,
    room_id: i64,
    seats: &[SeatInput],
) -> Result<u64, AppError> {
    let names: Vec<&str> = seats.iter().map(|s| s.name.as_str()).collect();
    let prices: Vec<i64> = seats.iter().map(|s| s.additional_price).collect();

    let result = sqlx::query(
        r#"
        INSERT INTO seats (room_id, name, additional_price)
        SELECT $1, u.name, u.additional_price
        FROM UNNEST($2::text[], $3::bigint[]) AS u(name, additional_price)
        "#,
    )
    .bind(room_id)
    .bind(&names)
    .bind(&prices)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
