pub mod sqlite;

use crate::app::Result;
use crate::domain::{FavoriteRecord, IdentityKey};

pub use sqlite::SqliteStore;

/// Record CRUD over the persisted favorites collection.
///
/// Lookups take the identity mode so they always match on the live
/// `title`/`link` column, the same field reconciliation compares.
pub trait FavoriteStorage {
    /// All records in insertion order.
    fn load_all(&self) -> Result<Vec<FavoriteRecord>>;
    fn find(&self, identity: IdentityKey, key: &str) -> Result<Option<FavoriteRecord>>;
    /// Returns false if a record with the same key already exists.
    fn insert(&self, identity: IdentityKey, record: &FavoriteRecord) -> Result<bool>;
    /// Deletes every record with this key and returns how many went.
    fn delete(&self, identity: IdentityKey, key: &str) -> Result<usize>;
    fn clear(&self) -> Result<usize>;
}
