use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Article, ImageBytes};

/// Which article field decides whether two articles are "the same" favorite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKey {
    #[default]
    Title,
    Link,
}

impl IdentityKey {
    pub fn of<'a>(&self, article: &'a Article) -> &'a str {
        match self {
            IdentityKey::Title => &article.title,
            IdentityKey::Link => &article.link,
        }
    }

    pub fn of_record<'a>(&self, record: &'a FavoriteRecord) -> &'a str {
        match self {
            IdentityKey::Title => &record.title,
            IdentityKey::Link => &record.link,
        }
    }

    /// Storage column holding the key, so lookups always follow the current mode.
    pub fn column(&self) -> &'static str {
        match self {
            IdentityKey::Title => "title",
            IdentityKey::Link => "link",
        }
    }
}

/// A persisted copy of an article the user marked as a favorite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteRecord {
    pub title: String,
    pub creator: Option<String>,
    pub link: String,
    pub description: Option<String>,
    pub published_at: String,
    pub image_url: Option<String>,
    pub article_id: Option<String>,
    pub image: Option<ImageBytes>,
    pub saved_at: DateTime<Utc>,
}

impl FavoriteRecord {
    pub fn from_article(article: &Article, image: Option<ImageBytes>) -> Self {
        Self {
            title: article.title.clone(),
            creator: article.author().map(String::from),
            link: article.link.clone(),
            description: article.description.clone(),
            published_at: article.published_at.clone(),
            image_url: article.image_url.clone(),
            article_id: article.article_id.clone(),
            image,
            saved_at: Utc::now(),
        }
    }

    /// Rebuild an article view of this record, e.g. for a detail screen.
    pub fn to_article(&self) -> Article {
        Article {
            title: self.title.clone(),
            creator: self.creator.clone().map(|c| vec![c]),
            link: self.link.clone(),
            description: self.description.clone(),
            published_at: self.published_at.clone(),
            image_url: self.image_url.clone(),
            article_id: self.article_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Article {
        let mut article = Article::new("Rust 2.0 announced", "https://example.com/rust");
        article.creator = Some(vec!["Ferris".into(), "Crab".into()]);
        article.published_at = "2024-08-08 10:00:00".into();
        article
    }

    #[test]
    fn test_identity_key_modes() {
        let article = sample();
        assert_eq!(IdentityKey::Title.of(&article), "Rust 2.0 announced");
        assert_eq!(IdentityKey::Link.of(&article), "https://example.com/rust");
    }

    #[test]
    fn test_record_copies_fields() {
        let article = sample();
        let record = FavoriteRecord::from_article(&article, None);

        assert_eq!(IdentityKey::Link.of_record(&record), "https://example.com/rust");
        assert_eq!(record.title, article.title);
        assert_eq!(record.creator.as_deref(), Some("Ferris"));
        assert_eq!(record.published_at, "2024-08-08 10:00:00");
        assert!(record.image.is_none());
    }

    #[test]
    fn test_record_round_trips_to_article() {
        let article = sample();
        let record = FavoriteRecord::from_article(&article, None);
        let back = record.to_article();

        assert_eq!(back.title, article.title);
        assert_eq!(back.author(), Some("Ferris"));
        assert_eq!(back.link, article.link);
    }

    #[test]
    fn test_identity_columns() {
        assert_eq!(IdentityKey::Title.column(), "title");
        assert_eq!(IdentityKey::Link.column(), "link");
    }

    #[test]
    fn test_identity_key_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            identity: IdentityKey,
        }
        let w: Wrapper = toml::from_str("identity = \"link\"").unwrap();
        assert_eq!(w.identity, IdentityKey::Link);
    }
}
