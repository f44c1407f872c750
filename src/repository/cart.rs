use sqlx::PgConnection;

use crate::error::AppError;
use crate::models::{Cart, CartFilter, CartInput, PageInput};

use super::limit_offset;

const CART_WHERE: &str = r#"
    WHERE (cardinality($1::bigint[]) = 0 OR c.id = ANY($1))
      AND (cardinality($2::bigint[]) = 0 OR c.user_id = ANY($2))
      AND (cardinality($3::bigint[]) = 0 OR c.showtime_id = ANY($3))
      AND (cardinality($4::bigint[]) = 0 OR c.seat_id = ANY($4))
"#;

/// Inserts the cart priced at showtime price plus seat surcharge. Returns
/// `None` when the seat does not belong to the showtime's room or either id
/// is unknown.
pub async fn insert(conn: &mut PgConnection, input: &CartInput) -> Result<Option<i64>, AppError> {
    let id = sqlx::query_scalar(
        r#"
        INSERT INTO carts (user_id, showtime_id, seat_id, price)
        SELECT $1, st.id, s.id, st.price + s.additional_price
        FROM showtimes st
        JOIN seats s ON s.room_id = st.room_id
        WHERE st.id = $2 AND s.id = $3
        RETURNING id
        "#,
    )
    .bind(input.user_id)
    .bind(input.showtime_id)
    .bind(input.seat_id)
    .fetch_optional(conn)
    .await?;
    Ok(id)
}

/// Moves an owned cart and reprices it. Returns `false` when the target seat
/// is not in the target showtime's room.
pub async fn update(conn: &mut PgConnection, id: i64, input: &CartInput) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE carts c
        SET showtime_id = st.id,
            seat_id = s.id,
            price = st.price + s.additional_price,
            updated_at = NOW()
        FROM showtimes st
        JOIN seats s ON s.room_id = st.room_id
        WHERE c.id = $1 AND c.user_id = $2 AND st.id = $3 AND s.id = $4
        "#,
    )
    .bind(id)
    .bind(input.user_id)
    .bind(input.showtime_id)
    .bind(input.seat_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(conn: &mut PgConnection, user_id: i64, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM carts WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_many(conn: &mut PgConnection, user_id: i64, ids: &[i64]) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM carts WHERE user_id = $1 AND id = ANY($2)")
        .bind(user_id)
        .bind(ids)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn find(
    conn: &mut PgConnection,
    filter: &CartFilter,
    page: Option<PageInput>,
) -> Result<Vec<Cart>, AppError> {
    let (limit, offset) = limit_offset(page);
    let sql = format!(
        r#"
        SELECT c.id, c.user_id, c.showtime_id, c.seat_id, c.price, c.created_at, c.updated_at,
               m.title AS movie,
               st.start_at AS showtime_start,
               st.end_at AS showtime_end,
               r.name AS room,
               s.name AS seat
        FROM carts c
        JOIN showtimes st ON st.id = c.showtime_id
        JOIN movies m ON m.id = st.movie_id
        JOIN rooms r ON r.id = st.room_id
        JOIN seats s ON s.id = c.seat_id
        {CART_WHERE}
        ORDER BY c.id
        LIMIT $5 OFFSET $6
        "#
    );

    let carts = sqlx::query_as::<_, Cart>(&sql)
        .bind(&filter.ids)
        .bind(&filter.user_ids)
        .bind(&filter.showtime_ids)
        .bind(&filter.seat_ids)
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await?;
    Ok(carts)
}

pub async fn find_owned(conn: &mut PgConnection, user_id: i64, id: i64) -> Result<Option<Cart>, AppError> {
    let mut carts = find(conn, &CartFilter::owned(user_id, vec![id]), None).await?;
    Ok(carts.pop())
}

pub async fn count(conn: &mut PgConnection, filter: &CartFilter) -> Result<i64, AppError> {
    let sql = format!("SELECT COUNT(*) FROM carts c {CART_WHERE}");
    let total = sqlx::query_scalar(&sql)
        .bind(&filter.ids)
        .bind(&filter.user_ids)
        .bind(&filter.showtime_ids)
        .bind(&filter.seat_ids)
        .fetch_one(conn)
        .await?;
    Ok(total)
}
