//! # Headliner
//!
//! Paginated news fetching with locally persisted favorites.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → NewsClient → ArticleCodec → FeedReconciler ← FavoritesStore → Store
//! ```
//!
//! - [`client`]: News API client with a single-flight pagination guard
//! - [`codec`]: Strict JSON decoding of API pages
//! - [`favorites`]: Deduplicated favorites with change notifications
//! - [`reconciler`]: Marks fetched articles as favorited
//!
//! ## Quick Start
//!
//! ```bash
//! # Latest headlines, two pages
//! headliner latest --pages 2
//!
//! # Save the third article of a search as a favorite
//! headliner save 3 --query rust
//!
//! # List favorites
//! headliner favorites
//! ```

/// Application context and error types.
///
/// The [`AppContext`](app::AppContext) struct wires together the client,
/// favorites store and reconciler.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// News API client.
///
/// - [`NewsClient`](client::NewsClient): page and image fetching
/// - [`NewsError`](client::NewsError): access/not-found/server/unknown taxonomy
/// - [`ImagePrefetcher`](client::images::ImagePrefetcher): bounded concurrent thumbnails
pub mod client;

/// Decoding of API payloads into [`ArticlePage`](domain::ArticlePage).
pub mod codec;

/// Configuration loaded from `~/.config/headliner/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Article`](domain::Article), [`ArticlePage`](domain::ArticlePage)
/// - [`FavoriteRecord`](domain::FavoriteRecord)
/// - [`IdentityKey`](domain::IdentityKey): how favorites are deduplicated
pub mod domain;

/// Favorites store over pluggable storage.
pub mod favorites;

/// HTTP transport.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait for GET requests
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Page presentation and favorite toggling.
pub mod reconciler;

/// Cancellation tied to a view's lifetime.
pub mod scope;

/// Multi-page feed state for one query.
pub mod session;

/// SQLite persistence for favorites.
pub mod store;
