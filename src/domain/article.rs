use serde::{Deserialize, Serialize};

/// A single news story as returned by the feed API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub creator: Option<Vec<String>>,
    pub link: String,
    pub description: Option<String>,
    /// Opaque date string, kept exactly as the API sent it.
    pub published_at: String,
    pub image_url: Option<String>,
    /// Upstream identifier, when the API provides one.
    pub article_id: Option<String>,
}

impl Article {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            creator: None,
            link: link.into(),
            description: None,
            published_at: String::new(),
            image_url: None,
            article_id: None,
        }
    }

    /// The first listed creator, if any.
    pub fn author(&self) -> Option<&str> {
        self.creator
            .as_ref()
            .and_then(|c| c.first())
            .map(String::as_str)
    }

    pub fn display_description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// One fetched batch of articles plus the cursor for the next batch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArticlePage {
    pub total_results: i64,
    pub articles: Vec<Article>,
    pub next_page: Option<String>,
}

impl ArticlePage {
    pub fn has_more(&self) -> bool {
        self.next_page.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// Raw image payload, validated by the client before it is handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBytes(pub Vec<u8>);

impl ImageBytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for ImageBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}
