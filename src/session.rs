//! Accumulates the pages of one feed query as the user scrolls.

use std::sync::Arc;

use crate::client::{NewsClient, NewsError, PageFetch, PageRequest};
use crate::domain::{Article, ArticlePage};

pub struct FeedSession {
    client: Arc<NewsClient>,
    query: Option<String>,
    pages: Vec<ArticlePage>,
}

impl FeedSession {
    pub fn new(client: Arc<NewsClient>, query: Option<String>) -> Self {
        Self {
            client,
            query: query.filter(|q| !q.is_empty()),
            pages: Vec::new(),
        }
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn pages(&self) -> &[ArticlePage] {
        &self.pages
    }

    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.pages.iter().flat_map(|p| p.articles.iter())
    }

    pub fn total_results(&self) -> Option<i64> {
        self.pages.last().map(|p| p.total_results)
    }

    /// Cursor for the next page, if the last fetched page advertised one.
    pub fn next_cursor(&self) -> Option<&str> {
        self.pages
            .last()
            .and_then(|p| p.next_page.as_deref())
            .filter(|c| !c.is_empty())
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor().is_some()
    }

    /// Start over with a new query, dropping everything loaded so far.
    pub fn reset(&mut self, query: Option<String>) {
        self.query = query.filter(|q| !q.is_empty());
        self.pages.clear();
    }

    /// Fetch the first page, replacing any pages already loaded.
    pub async fn load_first(&mut self) -> Result<&ArticlePage, NewsError> {
        let request = PageRequest::first(self.query.clone());
        match self.client.fetch_page(&request).await? {
            PageFetch::Page(page) => {
                self.pages.clear();
                self.pages.push(page);
                Ok(&self.pages[0])
            }
            // Unreachable for cursor-less requests.
            PageFetch::Skipped => Err(NewsError::UnknownError),
        }
    }

    /// Fetch and append the next page. Returns `Ok(None)` when there are no
    /// more pages or the client dropped the request.
    pub async fn load_next(&mut self) -> Result<Option<&ArticlePage>, NewsError> {
        let Some(cursor) = self.next_cursor().map(String::from) else {
            tracing::debug!("no further pages");
            return Ok(None);
        };

        let request = PageRequest::next(self.query.clone(), cursor);
        match self.client.fetch_page(&request).await? {
            PageFetch::Page(page) => {
                self.pages.push(page);
                Ok(self.pages.last())
            }
            PageFetch::Skipped => Ok(None),
        }
    }
}
