//! Merges fetched pages with the favorites snapshot and routes
//! favorite/unfavorite intents.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::app::Result;
use crate::domain::{Article, ArticlePage, FavoriteRecord, IdentityKey, ImageBytes};
use crate::favorites::{FavoritesChanged, FavoritesStore};

/// An article ready for display, annotated with its favorite status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedArticle {
    pub article: Article,
    pub is_favorited: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
    /// The store already matched the requested state.
    Unchanged,
}

pub struct FeedReconciler {
    favorites: Arc<FavoritesStore>,
}

impl FeedReconciler {
    pub fn new(favorites: Arc<FavoritesStore>) -> Self {
        Self { favorites }
    }

    pub fn favorites(&self) -> &Arc<FavoritesStore> {
        &self.favorites
    }

    /// Annotate every article of `page`, preserving page order.
    pub fn present(
        identity: IdentityKey,
        page: &ArticlePage,
        favorites: &[FavoriteRecord],
    ) -> Vec<PresentedArticle> {
        let saved: HashSet<&str> = favorites.iter().map(|r| identity.of_record(r)).collect();

        page.articles
            .iter()
            .map(|article| PresentedArticle {
                is_favorited: saved.contains(identity.of(article)),
                article: article.clone(),
            })
            .collect()
    }

    /// [`present`](Self::present) against the live favorites snapshot.
    pub fn present_current(&self, page: &ArticlePage) -> Vec<PresentedArticle> {
        let snapshot = self.favorites.snapshot();
        Self::present(self.favorites.identity(), page, &snapshot)
    }

    /// Save when not favorited, remove when favorited. Subscribers are
    /// notified by the store once the write is durable.
    pub fn toggle_favorite(
        &self,
        article: &Article,
        currently_favorited: bool,
        image: Option<ImageBytes>,
    ) -> Result<Toggle> {
        let changed = if currently_favorited {
            self.favorites.remove(article)?
        } else {
            self.favorites.save(article, image)?
        };

        Ok(match (changed, currently_favorited) {
            (false, _) => Toggle::Unchanged,
            (true, false) => Toggle::Added,
            (true, true) => Toggle::Removed,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FavoritesChanged> {
        self.favorites.subscribe()
    }
}
