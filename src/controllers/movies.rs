use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::controllers::query::{page, parse_ids, parse_names};
use crate::error::{ApiResponse, AppError};
use crate::middleware::AdminUser;
use crate::models::{Genre, GenreFilter, GenreInput, Movie, MovieFilter, MovieInput, Paginate};
use crate::AppState;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/movies", get(list_movies))
}

pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/genres", get(list_genres).post(create_genre))
        .route("/genres/{id}", put(update_genre).delete(delete_genre))
        .route("/movies", get(admin_list_movies).post(create_movie))
        .route("/movies/{id}", get(get_movie).put(update_movie).delete(delete_movie))
}

#[derive(Debug, Deserialize)]
pub struct MoviesQuery {
    pub ids: Option<String>,
    pub genre_ids: Option<String>,
    pub search: Option<String>,
    pub showtime_after: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct GenresQuery {
    pub ids: Option<String>,
    pub names: Option<String>,
}

/* ---------- movies ---------- */

async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MoviesQuery>,
) -> Result<Json<ApiResponse<Paginate<Movie>>>, AppError> {
    let filter = MovieFilter {
        ids: parse_ids(params.ids.as_deref(), "ids")?,
        genre_ids: parse_ids(params.genre_ids.as_deref(), "genre_ids")?,
        search: params.search,
        showtime_after: params.showtime_after,
    };
    let movies = state
        .catalog
        .movie_pagination(filter, page(params.page, params.page_size))
        .await?;
    Ok(ApiResponse::ok(movies))
}

async fn admin_list_movies(
    state: State<Arc<AppState>>,
    _admin: AdminUser,
    params: Query<MoviesQuery>,
) -> Result<Json<ApiResponse<Paginate<Movie>>>, AppError> {
    list_movies(state, params).await
}

async fn create_movie(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(input): Json<MovieInput>,
) -> Result<Json<ApiResponse<Movie>>, AppError> {
    let movie = state.catalog.create_movie(input).await?;
    Ok(ApiResponse::ok(movie))
}

async fn get_movie(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Movie>>, AppError> {
    let movie = state.catalog.get_movie(id).await?;
    Ok(ApiResponse::ok(movie))
}

async fn update_movie(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(input): Json<MovieInput>,
) -> Result<Json<ApiResponse<Movie>>, AppError> {
    let movie = state.catalog.update_movie(id, input).await?;
    Ok(ApiResponse::ok(movie))
}

async fn delete_movie(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    state.catalog.delete_movie(id).await?;
    Ok(ApiResponse::ok(json!({ "id": id })))
}

/* ---------- genres ---------- */

async fn list_genres(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<GenresQuery>,
) -> Result<Json<ApiResponse<Vec<Genre>>>, AppError> {
    let filter = GenreFilter {
        ids: parse_ids(params.ids.as_deref(), "ids")?,
        names: parse_names(params.names.as_deref())
            .into_iter()
            .map(|n| n.to_lowercase())
            .collect(),
    };
    let genres = state.catalog.list_genres(filter).await?;
    Ok(ApiResponse::ok(genres))
}

async fn create_genre(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(input): Json<GenreInput>,
) -> Result<Json<ApiResponse<Genre>>, AppError> {
    let genre = state.catalog.create_genre(input).await?;
    Ok(ApiResponse::ok(genre))
}

async fn update_genre(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(input): Json<GenreInput>,
) -> Result<Json<ApiResponse<Genre>>, AppError> {
    let genre = state.catalog.update_genre(id, input).await?;
    Ok(ApiResponse::ok(genre))
}

async fn delete_genre(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    state.catalog.delete_genre(id).await?;
    Ok(ApiResponse::ok(json!({ "id": id })))
}
