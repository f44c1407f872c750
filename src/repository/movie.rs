use sqlx::PgConnection;

use crate::error::AppError;
use crate::models::{Genre, GenreFilter, GenreInput, Movie, MovieFilter, MovieInput, PageInput};

use super::limit_offset;

/* ---------- genres ---------- */

pub async fn insert_genre(conn: &mut PgConnection, input: &GenreInput) -> Result<Genre, AppError> {
    let genre = sqlx::query_as::<_, Genre>(
        "INSERT INTO genres (name) VALUES ($1) RETURNING id, name, created_at, updated_at",
    )
    .bind(&input.name)
    .fetch_one(conn)
    .await?;
    Ok(genre)
}

pub async fn update_genre(
    conn: &mut PgConnection,
    id: i64,
    input: &GenreInput,
) -> Result<Option<Genre>, AppError> {
    let genre = sqlx::query_as::<_, Genre>(
        r#"
        UPDATE genres SET name = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, name, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&input.name)
    .fetch_optional(conn)
    .await?;
    Ok(genre)
}

pub async fn delete_genre(conn: &mut PgConnection, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM genres WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find_genres(conn: &mut PgConnection, filter: &GenreFilter) -> Result<Vec<Genre>, AppError> {
    let genres = sqlx::query_as::<_, Genre>(
        r#"
        SELECT id, name, created_at, updated_at
        FROM genres
        WHERE (cardinality($1::bigint[]) = 0 OR id = ANY($1))
          AND (cardinality($2::text[]) = 0 OR name = ANY($2))
        ORDER BY name
        "#,
    )
    .bind(&filter.ids)
    .bind(&filter.names)
    .fetch_all(conn)
    .await?;
    Ok(genres)
}

/* ---------- movies ---------- */

const MOVIE_WHERE: &str = r#"
    WHERE (cardinality($1::bigint[]) = 0 OR m.id = ANY($1))
      AND ($2::text IS NULL OR m.title ILIKE $2)
      AND (cardinality($3::bigint[]) = 0 OR EXISTS (
            SELECT 1 FROM movie_genres mg
            WHERE mg.movie_id = m.id AND mg.genre_id = ANY($3)))
      AND ($4::timestamptz IS NULL OR EXISTS (
            SELECT 1 FROM showtimes st
            WHERE st.movie_id = m.id AND st.start_at >= $4))
"#;

pub async fn insert(conn: &mut PgConnection, input: &MovieInput) -> Result<i64, AppError> {
    let id = sqlx::query_scalar(
        r#"
        INSERT INTO movies (title, release_date, director, duration, poster_url, description)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(&input.title)
    .bind(input.release_date)
    .bind(&input.director)
    .bind(input.duration)
    .bind(&input.poster_url)
    .bind(&input.description)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn update(conn: &mut PgConnection, id: i64, input: &MovieInput) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE movies
        SET title = $2, release_date = $3, director = $4, duration = $5,
            poster_url = $6, description = $7, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&input.title)
    .bind(input.release_date)
    .bind(&input.director)
    .bind(input.duration)
    .bind(&input.poster_url)
    .bind(&input.description)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Replaces the movie's genre links. Unknown genre ids fail the foreign key.
pub async fn replace_genres(conn: &mut PgConnection, movie_id: i64, genre_ids: &[i64]) -> Result<(), AppError> {
    sqlx::query("DELETE FROM movie_genres WHERE movie_id = $1")
        .bind(movie_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        "INSERT INTO movie_genres (movie_id, genre_id) SELECT $1, UNNEST($2::bigint[])",
    )
    .bind(movie_id)
    .bind(genre_ids)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut PgConnection, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM movies WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find(
    conn: &mut PgConnection,
    filter: &MovieFilter,
    page: Option<PageInput>,
) -> Result<Vec<Movie>, AppError> {
    let (limit, offset) = limit_offset(page);
    let sql = format!(
        r#"
        SELECT m.id, m.title, m.release_date, m.director, m.duration, m.poster_url,
               m.description, m.created_at, m.updated_at,
               ARRAY(SELECT mg.genre_id FROM movie_genres mg
                     WHERE mg.movie_id = m.id ORDER BY mg.genre_id) AS genre_ids,
               ARRAY(SELECT g.name FROM movie_genres mg JOIN genres g ON g.id = mg.genre_id
                     WHERE mg.movie_id = m.id ORDER BY g.name) AS genres
        FROM movies m
        {MOVIE_WHERE}
        ORDER BY m.id
        LIMIT $5 OFFSET $6
        "#
    );

    let movies = sqlx::query_as::<_, Movie>(&sql)
        .bind(&filter.ids)
        .bind(filter.search_pattern())
        .bind(&filter.genre_ids)
        .bind(filter.showtime_after)
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await?;
    Ok(movies)
}

pub async fn find_one(conn: &mut PgConnection, id: i64) -> Result<Option<Movie>, AppError> {
    let filter = MovieFilter { ids: vec![id], ..Default::default() };
    let mut movies = find(conn, &filter, None).await?;
    Ok(movies.pop())
}

pub async fn count(conn: &mut PgConnection, filter: &MovieFilter) -> Result<i64, AppError> {
    let sql = format!("SELECT COUNT(*) FROM movies m {MOVIE_WHERE}");
    let total = sqlx::query_scalar(&sql)
        .bind(&filter.ids)
        .bind(filter.search_pattern())
        .bind(&filter.genre_ids)
        .bind(filter.showtime_after)
        .fetch_one(conn)
        .await?;
    Ok(total)
}
