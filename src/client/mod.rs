//! News API client with a single-flight guard on paginated fetches.

pub mod error;
pub mod images;
pub mod retry;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use url::Url;

use crate::app::Result;
use crate::codec::ArticleCodec;
use crate::config::{ApiConfig, ConfigError};
use crate::domain::{ArticlePage, ImageBytes};
use crate::fetcher::{FetchError, Fetcher, HttpResponse};

pub use error::NewsError;
pub use retry::RetryPolicy;

/// Which page to load. A request carrying a cursor continues pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub query: Option<String>,
    pub cursor: Option<String>,
}

impl PageRequest {
    pub fn first(query: Option<String>) -> Self {
        Self {
            query,
            cursor: None,
        }
    }

    pub fn next(query: Option<String>, cursor: impl Into<String>) -> Self {
        Self {
            query,
            cursor: Some(cursor.into()),
        }
    }

    pub fn is_paginated(&self) -> bool {
        self.cursor.as_deref().is_some_and(|c| !c.is_empty())
    }
}

#[derive(Debug)]
pub enum PageFetch {
    /// The page was fetched and decoded
    Page(ArticlePage),
    /// Dropped because another paginated fetch was in flight
    Skipped,
}

impl PageFetch {
    pub fn into_page(self) -> Option<ArticlePage> {
        match self {
            PageFetch::Page(page) => Some(page),
            PageFetch::Skipped => None,
        }
    }
}

pub struct NewsClient {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    codec: ArticleCodec,
    base_url: Url,
    api_key: String,
    language: String,
    retry: RetryPolicy,
    fetching: AtomicBool,
}

impl NewsClient {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        config: &ApiConfig,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|source| ConfigError::BaseUrl {
            url: config.base_url.clone(),
            source,
        })?;

        Ok(Self {
            fetcher,
            codec: ArticleCodec::new(),
            base_url,
            api_key: config.api_key.clone(),
            language: config.languages.join(","),
            retry,
            fetching: AtomicBool::new(false),
        })
    }

    /// True while a paginated fetch is outstanding.
    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::Acquire)
    }

    pub fn page_url(&self, query: Option<&str>, cursor: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("apikey", &self.api_key);
            if !self.language.is_empty() {
                pairs.append_pair("language", &self.language);
            }
            if let Some(q) = query.filter(|q| !q.is_empty()) {
                pairs.append_pair("q", q);
            }
            if let Some(page) = cursor.filter(|p| !p.is_empty()) {
                pairs.append_pair("page", page);
            }
        }
        url
    }

    /// Fetch one page of articles.
    ///
    /// A paginated request issued while another paginated request is in
    /// flight is dropped and reported as [`PageFetch::Skipped`] without
    /// touching the network. Initial (cursor-less) requests are never gated.
    pub async fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> std::result::Result<PageFetch, NewsError> {
        let url = self.page_url(request.query.as_deref(), request.cursor.as_deref());

        let _in_flight = if request.is_paginated() {
            match InFlight::acquire(&self.fetching) {
                Some(guard) => Some(guard),
                None => {
                    tracing::debug!(
                        cursor = ?request.cursor,
                        "pagination in flight, dropping request"
                    );
                    return Ok(PageFetch::Skipped);
                }
            }
        } else {
            None
        };

        tracing::debug!(query = ?request.query, cursor = ?request.cursor, "fetching page");
        let body = self.get_with_retry(url.as_str()).await?;

        match self.codec.decode(&body) {
            Ok(page) => {
                tracing::debug!(
                    articles = page.articles.len(),
                    total = page.total_results,
                    "decoded page"
                );
                Ok(PageFetch::Page(page))
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to decode page");
                Err(NewsError::UnknownError)
            }
        }
    }

    /// Fetch a thumbnail. A 200 response that is not a recognizable image
    /// is reported as [`NewsError::UnknownError`].
    pub async fn fetch_image(&self, url: &str) -> std::result::Result<ImageBytes, NewsError> {
        if let Err(e) = Url::parse(url) {
            tracing::warn!(url, error = %e, "invalid image URL");
            return Err(NewsError::UnknownError);
        }

        let body = self.get_with_retry(url).await?;

        if ArticleCodec::sniff_image(&body).is_none() {
            tracing::warn!(url, bytes = body.len(), "response is not an image");
            return Err(NewsError::UnknownError);
        }

        Ok(ImageBytes(body))
    }

    async fn get_with_retry(&self, url: &str) -> std::result::Result<Vec<u8>, NewsError> {
        let mut attempt = 0;
        loop {
            let failure = match Failure::check(self.fetcher.get(url).await) {
                Ok(body) => return Ok(body),
                Err(failure) => failure,
            };

            if failure.is_retryable() && attempt < self.retry.max_retries {
                let delay = self.retry.delay_for(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max = self.retry.max_retries,
                    ?delay,
                    "request failed ({}), retrying",
                    failure
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            tracing::error!("request failed: {}", failure);
            return Err(failure.into());
        }
    }
}

/// Resets the in-flight flag when dropped, including when the fetch
/// future is cancelled.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

enum Failure {
    Transport(FetchError),
    Status(u16),
}

impl Failure {
    fn check(
        outcome: std::result::Result<HttpResponse, FetchError>,
    ) -> std::result::Result<Vec<u8>, Self> {
        match outcome {
            Ok(HttpResponse { status: 200, body }) => Ok(body),
            Ok(HttpResponse { status, .. }) => Err(Failure::Status(status)),
            Err(e) => Err(Failure::Transport(e)),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Failure::Transport(_) | Failure::Status(500))
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Transport(e) => write!(f, "{}", e),
            Failure::Status(status) => write!(f, "HTTP {}", status),
        }
    }
}

impl From<Failure> for NewsError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Transport(_) => NewsError::AccessError,
            Failure::Status(status) => NewsError::from_status(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::fetcher::scripted::{page_json, ScriptedFetcher, PNG_BYTES};

    fn api_config() -> ApiConfig {
        ApiConfig {
            base_url: "https://news.example.com/api/1/latest".into(),
            api_key: "secret".into(),
            languages: vec!["en".into(), "ru".into()],
            timeout_secs: 5,
        }
    }

    fn client(fetcher: Arc<ScriptedFetcher>) -> NewsClient {
        NewsClient::new(fetcher, &api_config(), RetryPolicy::NONE).unwrap()
    }

    fn retrying_client(fetcher: Arc<ScriptedFetcher>, retries: u32) -> NewsClient {
        let policy = RetryPolicy::new(retries, Duration::from_millis(1));
        NewsClient::new(fetcher, &api_config(), policy).unwrap()
    }

    #[test]
    fn test_page_url() {
        let client = client(Arc::new(ScriptedFetcher::new()));

        let url = client.page_url(None, None);
        assert_eq!(
            url.as_str(),
            "https://news.example.com/api/1/latest?apikey=secret&language=en%2Cru"
        );

        let url = client.page_url(Some("rust lang"), Some("p2"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("q".into(), "rust lang".into())));
        assert!(pairs.contains(&("page".into(), "p2".into())));
        assert!(pairs.contains(&("language".into(), "en,ru".into())));
    }

    #[test]
    fn test_page_url_skips_empty_values() {
        let client = client(Arc::new(ScriptedFetcher::new()));
        let url = client.page_url(Some(""), Some(""));
        let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(keys, vec!["apikey", "language"]);
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = api_config();
        config.base_url = "not a url".into();
        let result = NewsClient::new(Arc::new(ScriptedFetcher::new()), &config, RetryPolicy::NONE);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_first_page() {
        let fetcher = Arc::new(
            ScriptedFetcher::new().respond(200, page_json(42, &["A", "B"], Some("p2"))),
        );
        let client = client(fetcher.clone());

        let page = client
            .fetch_page(&PageRequest::first(None))
            .await
            .unwrap()
            .into_page()
            .unwrap();

        assert_eq!(page.total_results, 42);
        assert_eq!(page.articles.len(), 2);
        assert_eq!(page.next_page.as_deref(), Some("p2"));
        assert_eq!(fetcher.calls(), 1);
        assert!(!client.is_fetching());
    }

    #[tokio::test]
    async fn test_status_codes_map_to_errors() {
        for (status, expected) in [
            (403, NewsError::AccessError),
            (404, NewsError::PageNotFound),
            (500, NewsError::ServerError),
            (418, NewsError::UnknownError),
        ] {
            let fetcher = Arc::new(ScriptedFetcher::new().respond(status, "nope"));
            let client = client(fetcher);

            let err = client
                .fetch_page(&PageRequest::next(None, "p2"))
                .await
                .unwrap_err();
            assert_eq!(err, expected, "status {}", status);
            assert!(!client.is_fetching());
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_access_error() {
        let fetcher = Arc::new(ScriptedFetcher::new().fail("connection refused"));
        let client = client(fetcher);

        let err = client
            .fetch_page(&PageRequest::next(None, "p2"))
            .await
            .unwrap_err();
        assert_eq!(err, NewsError::AccessError);
        assert!(!client.is_fetching());
    }

    #[tokio::test]
    async fn test_decode_failure_is_unknown_error() {
        let body = r#"{"totalResults": 1, "results": [{"link": "l", "pubDate": "d"}]}"#;
        let fetcher = Arc::new(ScriptedFetcher::new().respond(200, body));
        let client = client(fetcher);

        let err = client.fetch_page(&PageRequest::first(None)).await.unwrap_err();
        assert_eq!(err, NewsError::UnknownError);
    }

    #[tokio::test]
    async fn test_paginated_fetch_is_single_flight() {
        let (fetcher, entered, release) = ScriptedFetcher::gated();
        fetcher.push(Ok(HttpResponse::new(200, page_json(3, &["C"], None))));
        fetcher.push(Ok(HttpResponse::new(200, page_json(3, &["D"], None))));
        let fetcher = Arc::new(fetcher);
        let client = Arc::new(client(fetcher.clone()));

        let in_flight = {
            let client = client.clone();
            tokio::spawn(async move { client.fetch_page(&PageRequest::next(None, "p2")).await })
        };

        entered.notified().await;
        assert!(client.is_fetching());

        let dropped = client
            .fetch_page(&PageRequest::next(None, "p2"))
            .await
            .unwrap();
        assert!(matches!(dropped, PageFetch::Skipped));
        assert_eq!(fetcher.calls(), 1);

        release.notify_one();
        let page = in_flight.await.unwrap().unwrap().into_page().unwrap();
        assert_eq!(page.articles[0].title, "C");
        assert!(!client.is_fetching());

        // The guard is free again, so the next paginated request goes out.
        let next = {
            let client = client.clone();
            tokio::spawn(async move { client.fetch_page(&PageRequest::next(None, "p3")).await })
        };
        entered.notified().await;
        release.notify_one();
        let page = next.await.unwrap().unwrap().into_page().unwrap();
        assert_eq!(page.articles[0].title, "D");
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_initial_fetch_not_gated() {
        let (fetcher, entered, release) = ScriptedFetcher::gated();
        fetcher.push(Ok(HttpResponse::new(200, page_json(2, &["B"], None))));
        fetcher.push(Ok(HttpResponse::new(200, page_json(2, &["A"], Some("p2")))));
        let fetcher = Arc::new(fetcher);
        let client = Arc::new(client(fetcher.clone()));

        let paginated = {
            let client = client.clone();
            tokio::spawn(async move { client.fetch_page(&PageRequest::next(None, "p2")).await })
        };
        entered.notified().await;

        let initial = {
            let client = client.clone();
            tokio::spawn(async move { client.fetch_page(&PageRequest::first(None)).await })
        };
        entered.notified().await;
        assert_eq!(fetcher.calls(), 2);

        release.notify_one();
        release.notify_one();
        assert!(paginated.await.unwrap().is_ok());
        assert!(initial.await.unwrap().is_ok());
        assert!(!client.is_fetching());
    }

    #[tokio::test]
    async fn test_cancelled_fetch_releases_guard() {
        let (fetcher, entered, _release) = ScriptedFetcher::gated();
        let fetcher = Arc::new(fetcher);
        let client = Arc::new(client(fetcher));

        let task = {
            let client = client.clone();
            tokio::spawn(async move { client.fetch_page(&PageRequest::next(None, "p2")).await })
        };
        entered.notified().await;
        assert!(client.is_fetching());

        task.abort();
        let _ = task.await;
        assert!(!client.is_fetching());
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .respond(500, "busy")
                .fail("reset by peer")
                .respond(200, page_json(1, &["A"], None)),
        );
        let client = retrying_client(fetcher.clone(), 2);

        let page = client
            .fetch_page(&PageRequest::first(None))
            .await
            .unwrap()
            .into_page()
            .unwrap();
        assert_eq!(page.articles.len(), 1);
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .respond(500, "busy")
                .respond(500, "busy")
                .respond(500, "busy"),
        );
        let client = retrying_client(fetcher.clone(), 1);

        let err = client.fetch_page(&PageRequest::first(None)).await.unwrap_err();
        assert_eq!(err, NewsError::ServerError);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_errors_fail_fast() {
        for status in [403, 404] {
            let fetcher = Arc::new(
                ScriptedFetcher::new()
                    .respond(status, "")
                    .respond(200, page_json(1, &["A"], None)),
            );
            let client = retrying_client(fetcher.clone(), 3);

            assert!(client.fetch_page(&PageRequest::first(None)).await.is_err());
            assert_eq!(fetcher.calls(), 1);
        }
    }

    #[tokio::test]
    async fn test_fetch_image() {
        let fetcher = Arc::new(ScriptedFetcher::new().respond(200, PNG_BYTES));
        let client = client(fetcher);

        let image = client.fetch_image("https://example.com/a.png").await.unwrap();
        assert_eq!(image.as_slice(), PNG_BYTES);
    }

    #[tokio::test]
    async fn test_fetch_image_rejects_non_image() {
        let fetcher = Arc::new(ScriptedFetcher::new().respond(200, "<html></html>"));
        let client = client(fetcher);

        let err = client.fetch_image("https://example.com/a.png").await.unwrap_err();
        assert_eq!(err, NewsError::UnknownError);
    }

    #[tokio::test]
    async fn test_fetch_image_status_mapping() {
        let fetcher = Arc::new(ScriptedFetcher::new().respond(404, ""));
        let client = client(fetcher);

        let err = client.fetch_image("https://example.com/a.png").await.unwrap_err();
        assert_eq!(err, NewsError::PageNotFound);
    }

    #[tokio::test]
    async fn test_fetch_image_invalid_url() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let client = client(fetcher.clone());

        let err = client.fetch_image("::not a url::").await.unwrap_err();
        assert_eq!(err, NewsError::UnknownError);
        assert_eq!(fetcher.calls(), 0);
    }
}
