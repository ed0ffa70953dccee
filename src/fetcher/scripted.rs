//! Scripted [`Fetcher`] double for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::fetcher::{FetchError, Fetcher, HttpResponse};

type Scripted = Result<HttpResponse, FetchError>;

#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<VecDeque<Scripted>>,
    urls: Mutex<Vec<String>>,
    calls: AtomicUsize,
    completed: AtomicUsize,
    delay: Option<Duration>,
    gate: Option<Gate>,
}

/// Holds every request until the test releases it.
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> (Self, Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let fetcher = Self {
            gate: Some(Gate {
                entered: entered.clone(),
                release: release.clone(),
            }),
            ..Self::default()
        };
        (fetcher, entered, release)
    }

    pub fn respond(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.push(Ok(HttpResponse::new(status, body)));
        self
    }

    /// Every request sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(Err(FetchError::Other(message.to_string())));
        self
    }

    pub fn push(&self, response: Scripted) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests that ran to the end and produced their response.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.completed.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Other("no scripted response".into())))
    }
}

pub fn page_json(total: i64, titles: &[&str], next_page: Option<&str>) -> String {
    let results: Vec<serde_json::Value> = titles
        .iter()
        .map(|t| {
            serde_json::json!({
                "title": t,
                "creator": ["Staff"],
                "link": format!("https://example.com/{}", t.to_lowercase().replace(' ', "-")),
                "description": format!("About {}", t),
                "pubDate": "2024-08-08 10:00:00",
                "image_url": null,
            })
        })
        .collect();

    serde_json::json!({
        "status": "success",
        "totalResults": total,
        "results": results,
        "nextPage": next_page,
    })
    .to_string()
}

pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
