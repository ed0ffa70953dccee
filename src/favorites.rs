//! Deduplicated favorites with an always-current snapshot.
//!
//! Every mutation re-queries storage and swaps in a fresh snapshot while
//! holding the store's write lock, so a check, its write and the refresh
//! form one unit. If that reload fails after the write has committed, the
//! cached snapshot gets the same change applied instead.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tokio::sync::broadcast;

use crate::app::{HeadlinerError, Result};
use crate::domain::{Article, FavoriteRecord, IdentityKey, ImageBytes};
use crate::store::FavoriteStorage;

const CHANNEL_CAPACITY: usize = 32;

pub type Snapshot = Arc<[FavoriteRecord]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Added(String),
    Removed(String),
    Cleared,
}

/// Sent to subscribers after every mutation that changed storage.
#[derive(Debug, Clone)]
pub struct FavoritesChanged {
    pub change: Change,
    pub snapshot: Snapshot,
}

pub struct FavoritesStore {
    storage: Arc<dyn FavoriteStorage + Send + Sync>,
    identity: IdentityKey,
    write: Mutex<()>,
    snapshot: RwLock<Snapshot>,
    events: broadcast::Sender<FavoritesChanged>,
}

impl FavoritesStore {
    /// A failed initial load leaves the store usable with an empty snapshot.
    pub fn new(storage: Arc<dyn FavoriteStorage + Send + Sync>, identity: IdentityKey) -> Self {
        let initial: Snapshot = match storage.load_all() {
            Ok(records) => records.into(),
            Err(e) => {
                tracing::warn!(error = %e, "could not load favorites, starting empty");
                Arc::from(Vec::new())
            }
        };
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);

        Self {
            storage,
            identity,
            write: Mutex::new(()),
            snapshot: RwLock::new(initial),
            events,
        }
    }

    pub fn identity(&self) -> IdentityKey {
        self.identity
    }

    pub fn snapshot(&self) -> Snapshot {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn contains(&self, article: &Article) -> bool {
        let key = self.identity.of(article);
        self.snapshot()
            .iter()
            .any(|r| self.identity.of_record(r) == key)
    }

    /// Look up a saved record by its key under the current identity mode.
    pub fn find(&self, key: &str) -> Result<Option<FavoriteRecord>> {
        self.storage.find(self.identity, key)
    }

    /// Listen for changes. Dropping the receiver ends the subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<FavoritesChanged> {
        self.events.subscribe()
    }

    /// Persist `article` unless an entry with the same identity exists.
    /// Returns whether a record was added.
    pub fn save(&self, article: &Article, image: Option<ImageBytes>) -> Result<bool> {
        let _write = self.lock_write()?;
        let key = self.identity.of(article).to_string();

        let record = FavoriteRecord::from_article(article, image);
        if !self.storage.insert(self.identity, &record)? {
            tracing::debug!(key = %key, "already a favorite");
            return Ok(false);
        }

        let snapshot = self.refresh_or(|current| {
            let mut records = current.to_vec();
            records.push(record);
            records
        });

        tracing::info!(key = %key, "saved favorite");
        self.notify(Change::Added(key), snapshot);
        Ok(true)
    }

    /// Remove the favorite matching `article`. Returns whether one existed.
    pub fn remove(&self, article: &Article) -> Result<bool> {
        self.remove_key(self.identity.of(article))
    }

    pub fn remove_record(&self, record: &FavoriteRecord) -> Result<bool> {
        self.remove_key(self.identity.of_record(record))
    }

    pub fn clear(&self) -> Result<usize> {
        let _write = self.lock_write()?;
        let removed = self.storage.clear()?;
        if removed == 0 {
            return Ok(0);
        }

        let snapshot = self.refresh_or(|_| Vec::new());

        tracing::info!(removed, "cleared favorites");
        self.notify(Change::Cleared, snapshot);
        Ok(removed)
    }

    fn remove_key(&self, key: &str) -> Result<bool> {
        let _write = self.lock_write()?;

        if self.storage.delete(self.identity, key)? == 0 {
            tracing::debug!(key, "not a favorite, nothing to remove");
            return Ok(false);
        }

        let identity = self.identity;
        let snapshot = self.refresh_or(|current| {
            current
                .iter()
                .filter(|r| identity.of_record(r) != key)
                .cloned()
                .collect()
        });

        tracing::info!(key, "removed favorite");
        self.notify(Change::Removed(key.to_string()), snapshot);
        Ok(true)
    }

    /// Reload the snapshot after a committed write. If the reload fails,
    /// `patch` applies the same write to the cached snapshot instead.
    fn refresh_or<F>(&self, patch: F) -> Snapshot
    where
        F: FnOnce(&[FavoriteRecord]) -> Vec<FavoriteRecord>,
    {
        let fresh: Snapshot = match self.storage.load_all() {
            Ok(records) => records.into(),
            Err(e) => {
                tracing::warn!(error = %e, "could not reload favorites, patching snapshot");
                patch(&self.snapshot()).into()
            }
        };
        match self.snapshot.write() {
            Ok(mut guard) => *guard = fresh.clone(),
            Err(poisoned) => *poisoned.into_inner() = fresh.clone(),
        }
        fresh
    }

    fn notify(&self, change: Change, snapshot: Snapshot) {
        // No receivers is fine.
        let _ = self.events.send(FavoritesChanged { change, snapshot });
    }

    fn lock_write(&self) -> Result<MutexGuard<'_, ()>> {
        self.write
            .lock()
            .map_err(|e| HeadlinerError::Other(format!("favorites lock poisoned: {}", e)))
    }
}
