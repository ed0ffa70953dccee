use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::Result;
use crate::client::{NewsClient, RetryPolicy};
use crate::config::{Config, ConfigError};
use crate::favorites::FavoritesStore;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::reconciler::FeedReconciler;
use crate::store::SqliteStore;

pub struct AppContext {
    pub config: Config,
    pub client: Arc<NewsClient>,
    pub favorites: Arc<FavoritesStore>,
    pub reconciler: FeedReconciler,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = match &config.favorites.db_path {
            Some(p) => p.clone(),
            None => Self::default_db_path()?,
        };
        let storage = Arc::new(SqliteStore::new(&db_path)?);
        tracing::debug!(path = %db_path.display(), "opened favorites database");

        let fetcher = Self::http_fetcher(&config)?;
        Self::assemble(config, fetcher, storage)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let storage = Arc::new(SqliteStore::in_memory()?);
        let fetcher = Self::http_fetcher(&config)?;
        Self::assemble(config, fetcher, storage)
    }

    /// Wire the components around an arbitrary fetcher, e.g. a test double.
    pub fn with_fetcher(
        config: Config,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
    ) -> Result<Self> {
        let storage = Arc::new(SqliteStore::in_memory()?);
        Self::assemble(config, fetcher, storage)
    }

    fn assemble(
        config: Config,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        storage: Arc<SqliteStore>,
    ) -> Result<Self> {
        let retry = RetryPolicy::from(config.retry.clone());
        let client = Arc::new(NewsClient::new(fetcher, &config.api, retry)?);
        let favorites = Arc::new(FavoritesStore::new(storage, config.favorites.identity));
        let reconciler = FeedReconciler::new(favorites.clone());

        Ok(Self {
            config,
            client,
            favorites,
            reconciler,
        })
    }

    fn http_fetcher(config: &Config) -> Result<Arc<dyn Fetcher + Send + Sync>> {
        let fetcher = HttpFetcher::with_timeout(config.api.timeout())?;
        Ok(Arc::new(fetcher))
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
        let headliner_dir = data_dir.join("headliner");
        std::fs::create_dir_all(&headliner_dir)?;
        Ok(headliner_dir.join("favorites.db"))
    }
}
