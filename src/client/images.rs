use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::client::{NewsClient, NewsError};
use crate::domain::{Article, ImageBytes};

pub const DEFAULT_IMAGE_WORKERS: usize = 4;

/// Fetches article thumbnails concurrently, bounded by a semaphore.
///
/// Image fetches share no guard with pagination; each one completes
/// independently and results come back in completion order. The
/// downloads are owned by the `fetch_all` future: dropping it (for
/// example when its scope is cancelled) aborts the ones still running.
pub struct ImagePrefetcher {
    client: Arc<NewsClient>,
    semaphore: Arc<Semaphore>,
}

impl ImagePrefetcher {
    pub fn new(client: Arc<NewsClient>) -> Self {
        Self::with_workers(client, DEFAULT_IMAGE_WORKERS)
    }

    pub fn with_workers(client: Arc<NewsClient>, workers: usize) -> Self {
        Self {
            client,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Returns `(index into articles, result)` for every article with an image URL.
    pub async fn fetch_all(
        &self,
        articles: &[Article],
    ) -> Vec<(usize, Result<ImageBytes, NewsError>)> {
        let mut tasks = JoinSet::new();

        for (index, article) in articles.iter().enumerate() {
            let Some(url) = article.image_url.clone() else {
                continue;
            };
            let client = self.client.clone();
            let semaphore = self.semaphore.clone();

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (index, Err(NewsError::UnknownError)),
                };
                (index, client.fetch_image(&url).await)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!("Task join error: {}", e);
                }
            }
        }

        results
    }
}
