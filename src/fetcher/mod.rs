pub mod http_fetcher;
#[cfg(test)]
pub mod scripted;

use async_trait::async_trait;
use thiserror::Error;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// The request never produced a status code.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait Fetcher {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}
