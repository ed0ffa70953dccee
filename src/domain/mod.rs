pub mod article;
pub mod favorite;

pub use article::{Article, ArticlePage, ImageBytes};
pub use favorite::{FavoriteRecord, IdentityKey};
