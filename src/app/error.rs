use thiserror::Error;

use crate::client::NewsError;
use crate::config::ConfigError;
use crate::fetcher::FetchError;

#[derive(Error, Debug)]
pub enum HeadlinerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("HTTP client error: {0}")]
    Fetch(#[from] FetchError),

    #[error("News API error: {0}")]
    News(#[from] NewsError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Favorite not found: {0}")]
    FavoriteNotFound(String),

    #[error("Article index {index} out of range (page has {len})")]
    ArticleIndex { index: usize, len: usize },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, HeadlinerError>;
