use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;
use crate::models::showtime::TimeWindow;

pub const MIN_SEARCH_CHARS: usize = 3;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GenreInput {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
}

impl GenreInput {
    /// Genre names are stored trimmed and lower-cased.
    pub fn normalized(mut self) -> Result<Self, AppError> {
        self.name = self.name.trim().to_lowercase();
        self.validate()?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenreFilter {
    #[serde(default)]
    pub ids: Vec<i64>,
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub release_date: DateTime<Utc>,
    pub director: String,
    /// Running time in minutes.
    pub duration: i32,
    pub poster_url: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub genre_ids: Vec<i64>,
    pub genres: Vec<String>,
}

impl Movie {
    pub fn running_time(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.duration))
    }

    /// A showtime must be at least as long as the movie it screens.
    pub fn ensure_fits(&self, window: &TimeWindow) -> Result<(), AppError> {
        if window.length() < self.running_time() {
            return Err(AppError::input("showtime duration less than movie duration"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MovieInput {
    #[validate(length(min = 1, message = "is required"))]
    pub title: String,
    pub release_date: DateTime<Utc>,
    #[validate(length(min = 1, message = "is required"))]
    pub director: String,
    #[validate(range(min = 1, message = "(minutes) is required"))]
    pub duration: i32,
    #[validate(url(message = "is not a valid url"))]
    pub poster_url: String,
    #[validate(length(min = 1, message = "is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "is required"))]
    pub genre_ids: Vec<i64>,
}

impl MovieInput {
    pub fn normalized(mut self) -> Result<Self, AppError> {
        self.title = self.title.trim().to_string();
        self.director = self.director.trim().to_string();
        self.poster_url = self.poster_url.trim().to_string();
        self.description = self.description.trim().to_string();
        self.genre_ids.sort_unstable();
        self.genre_ids.dedup();
        self.validate()?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieFilter {
    #[serde(default)]
    pub ids: Vec<i64>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    /// Only movies with a showtime starting at or after this instant.
    #[serde(default)]
    pub showtime_after: Option<DateTime<Utc>>,
}

impl MovieFilter {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(search) = self.search.as_deref() {
            let len = search.trim().chars().count();
            if len > 0 && len < MIN_SEARCH_CHARS {
                return Err(AppError::input(format!(
                    "minimum search character is {}",
                    MIN_SEARCH_CHARS
                )));
            }
        }
        Ok(())
    }

    /// `ILIKE` pattern for the title search, `None` when not searching.
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.replace('%', "\\%").replace('_', "\\_")))
    }
}
