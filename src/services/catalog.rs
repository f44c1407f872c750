//! Genres and movies.

use tracing::info;

use crate::database::{Database, Tx};
use crate::error::AppError;
use crate::models::{Genre, GenreFilter, GenreInput, Movie, MovieFilter, MovieInput, PageInput, Paginate};
use crate::repository::movie;

#[derive(Clone)]
pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /* ---------- genres ---------- */

    #[tracing::instrument(skip(self, input))]
    pub async fn create_genre(&self, input: GenreInput) -> Result<Genre, AppError> {
        let input = input.normalized()?;

        let mut tx = self.db.begin().await?;
        let genre = movie::insert_genre(&mut tx, &input).await?;
        tx.commit().await?;

        info!(genre_id = genre.id, name = %genre.name, "genre created");
        Ok(genre)
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn update_genre(&self, id: i64, input: GenreInput) -> Result<Genre, AppError> {
        let input = input.normalized()?;

        let mut tx = self.db.begin().await?;
        let genre = movie::update_genre(&mut tx, id, &input)
            .await?
            .ok_or_else(|| AppError::not_found("genre not found"))?;
        tx.commit().await?;

        info!(genre_id = id, "genre updated");
        Ok(genre)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_genre(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        if !movie::delete_genre(&mut tx, id).await? {
            return Err(AppError::not_found("genre not found"));
        }
        tx.commit().await?;

        info!(genre_id = id, "genre deleted");
        Ok(())
    }

    pub async fn list_genres(&self, filter: GenreFilter) -> Result<Vec<Genre>, AppError> {
        let mut tx = self.db.begin().await?;
        let genres = movie::find_genres(&mut tx, &filter).await?;
        tx.commit().await?;
        Ok(genres)
    }

    /* ---------- movies ---------- */

    #[tracing::instrument(skip(self, input))]
    pub async fn create_movie(&self, input: MovieInput) -> Result<Movie, AppError> {
        let input = input.normalized()?;

        let mut tx = self.db.begin().await?;
        let id = movie::insert(&mut tx, &input).await?;
        movie::replace_genres(&mut tx, id, &input.genre_ids).await?;
        let created = load_movie(&mut tx, id).await?;
        tx.commit().await?;

        info!(movie_id = id, title = %created.title, "movie created");
        Ok(created)
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn update_movie(&self, id: i64, input: MovieInput) -> Result<Movie, AppError> {
        let input = input.normalized()?;

        let mut tx = self.db.begin().await?;
        if !movie::update(&mut tx, id, &input).await? {
            return Err(AppError::not_found("movie not found"));
        }
        movie::replace_genres(&mut tx, id, &input.genre_ids).await?;
        let updated = load_movie(&mut tx, id).await?;
        tx.commit().await?;

        info!(movie_id = id, "movie updated");
        Ok(updated)
    }

    pub async fn get_movie(&self, id: i64) -> Result<Movie, AppError> {
        let mut tx = self.db.begin().await?;
        let found = load_movie(&mut tx, id).await?;
        tx.commit().await?;
        Ok(found)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_movie(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        if !movie::delete(&mut tx, id).await? {
            return Err(AppError::not_found("movie not found"));
        }
        tx.commit().await?;

        info!(movie_id = id, "movie deleted");
        Ok(())
    }

    pub async fn movie_pagination(&self, filter: MovieFilter, page: PageInput) -> Result<Paginate<Movie>, AppError> {
        filter.validate()?;

        let mut tx = self.db.begin().await?;
        let total = movie::count(&mut tx, &filter).await?;
        let paged = Paginate::empty(total, page);
        let page = paged.clamp(page);
        let movies = movie::find(&mut tx, &filter, Some(page)).await?;
        tx.commit().await?;
        Ok(paged.with_items(page, movies))
    }
}

async fn load_movie(tx: &mut Tx, id: i64) -> Result<Movie, AppError> {
    movie::find_one(tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("movie not found"))
}
