//! Decoding of news API payloads into [`ArticlePage`] values.
//!
//! Decoding is strict: one malformed article fails the whole page.

use html_escape::decode_html_entities;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{Article, ArticlePage};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Type mismatch for field: {0}")]
    TypeMismatch(String),

    #[error("Decode failed: {0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
    Bmp,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ArticleCodec;

impl ArticleCodec {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, body: &[u8]) -> Result<ArticlePage, DecodeError> {
        let root: Value = serde_json::from_slice(body).map_err(|e| {
            use serde_json::error::Category;
            match e.classify() {
                Category::Syntax | Category::Eof => DecodeError::MalformedPayload(e.to_string()),
                Category::Data | Category::Io => DecodeError::Other(e.to_string()),
            }
        })?;

        let envelope = root
            .as_object()
            .ok_or_else(|| DecodeError::MalformedPayload("expected a JSON object".into()))?;

        let total_results = match envelope.get("totalResults") {
            None | Some(Value::Null) => {
                return Err(DecodeError::MissingField("totalResults".into()));
            }
            Some(v) => v
                .as_i64()
                .ok_or_else(|| DecodeError::TypeMismatch("totalResults".into()))?,
        };

        let results = match envelope.get("results") {
            None | Some(Value::Null) => return Err(DecodeError::MissingField("results".into())),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(DecodeError::TypeMismatch("results".into())),
        };

        let next_page = optional_str(envelope, "nextPage", "nextPage")?
            .filter(|cursor| !cursor.is_empty())
            .map(String::from);

        let articles = results
            .iter()
            .enumerate()
            .map(|(i, value)| decode_article(i, value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ArticlePage {
            total_results,
            articles,
            next_page,
        })
    }

    /// Identify an image payload by its magic bytes.
    pub fn sniff_image(bytes: &[u8]) -> Option<ImageFormat> {
        match bytes {
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(ImageFormat::Png),
            [0xFF, 0xD8, 0xFF, ..] => Some(ImageFormat::Jpeg),
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(ImageFormat::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => {
                Some(ImageFormat::WebP)
            }
            [b'B', b'M', ..] if bytes.len() > 14 => Some(ImageFormat::Bmp),
            _ => None,
        }
    }
}

fn decode_article(index: usize, value: &Value) -> Result<Article, DecodeError> {
    let path = |field: &str| format!("results[{}].{}", index, field);

    let obj = value
        .as_object()
        .ok_or_else(|| DecodeError::TypeMismatch(format!("results[{}]", index)))?;

    let title = required_str(obj, "title", &path("title"))?;
    let link = required_str(obj, "link", &path("link"))?;
    let published_at = required_str(obj, "pubDate", &path("pubDate"))?;

    let creator = match obj.get("creator") {
        None | Some(Value::Null) => None,
        Some(Value::Array(names)) => Some(
            names
                .iter()
                .map(|n| {
                    n.as_str()
                        .map(String::from)
                        .ok_or_else(|| DecodeError::TypeMismatch(path("creator")))
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(_) => return Err(DecodeError::TypeMismatch(path("creator"))),
    };

    Ok(Article {
        title: decode_html_entities(title).to_string(),
        creator,
        link: link.to_string(),
        description: optional_str(obj, "description", &path("description"))?
            .map(|d| decode_html_entities(d).to_string()),
        published_at: published_at.to_string(),
        image_url: optional_str(obj, "image_url", &path("image_url"))?.map(String::from),
        article_id: optional_str(obj, "article_id", &path("article_id"))?.map(String::from),
    })
}

fn required_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a str, DecodeError> {
    match obj.get(key) {
        None | Some(Value::Null) => Err(DecodeError::MissingField(path.to_string())),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(DecodeError::TypeMismatch(path.to_string())),
    }
}

fn optional_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<&'a str>, DecodeError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(DecodeError::TypeMismatch(path.to_string())),
    }
}
