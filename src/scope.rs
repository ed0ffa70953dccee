//! Cancellation scoped to the lifetime of a consuming view.
//!
//! A view owns a [`FetchScope`] and runs its fetches through tokens taken
//! from it. Cancelling or dropping the scope abandons every outstanding
//! fetch; dropping a fetch future also releases the client's pagination
//! guard.

use std::future::Future;

use tokio::sync::watch;

pub struct FetchScope {
    cancel: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct ScopeToken {
    cancelled: watch::Receiver<bool>,
}

impl FetchScope {
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        Self { cancel }
    }

    pub fn token(&self) -> ScopeToken {
        ScopeToken {
            cancelled: self.cancel.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

impl Default for FetchScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FetchScope {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

impl ScopeToken {
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Resolves once the owning scope is cancelled or dropped.
    pub async fn cancelled(&mut self) {
        // An error means the sender is gone, which also counts as cancelled.
        let _ = self.cancelled.wait_for(|cancelled| *cancelled).await;
    }

    /// Run `fut` unless the scope is cancelled first, in which case the
    /// future is dropped and `None` is returned.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.is_cancelled() {
            return None;
        }

        let mut token = self.clone();
        tokio::select! {
            output = fut => Some(output),
            _ = token.cancelled() => {
                tracing::debug!("fetch cancelled by scope");
                None
            }
        }
    }
}
