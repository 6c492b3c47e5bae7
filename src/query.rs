//! Observer handle for cached queries.
//!
//! Inspired by TanStack Query: a view asks the [`QueryCache`] for a key and
//! gets back a `Query` that tracks the entry's loading, success and error
//! states. The cache decides whether a network call is needed; the `Query`
//! only observes and can request a forced refetch.
//!
//! # Example
//!
//! ```ignore
//! let mut query = cache.query(key, fetcher);
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! if query.is_loading() {
//!     render_skeleton();
//! } else if let Some(e) = query.error() {
//!     render_error(e);
//! } else if let Some(data) = query.data() {
//!     render_data(data);
//! }
//! ```

use tokio::sync::watch;

use crate::cache::{Fetcher, QueryCache, QueryKey, QuerySnapshot, RefetchHandle};

/// Subscription to one cache entry.
pub struct Query<K, T, E> {
  key: K,
  cache: QueryCache<K, T, E>,
  fetcher: Fetcher<T, E>,
  receiver: watch::Receiver<QuerySnapshot<T, E>>,
  snapshot: QuerySnapshot<T, E>,
}

impl<K, T, E> Query<K, T, E>
where
  K: QueryKey,
  T: Send + Sync + 'static,
  E: std::fmt::Display + Send + Sync + 'static,
{
  pub(crate) fn new(
    key: K,
    cache: QueryCache<K, T, E>,
    fetcher: Fetcher<T, E>,
    mut receiver: watch::Receiver<QuerySnapshot<T, E>>,
  ) -> Self {
    let snapshot = receiver.borrow_and_update().clone();
    Self {
      key,
      cache,
      fetcher,
      receiver,
      snapshot,
    }
  }

  pub fn key(&self) -> &K {
    &self.key
  }

  /// The state as of the last `poll()` or `changed()`.
  #[cfg(test)]
  pub fn snapshot(&self) -> &QuerySnapshot<T, E> {
    &self.snapshot
  }

  pub fn data(&self) -> Option<&T> {
    self.snapshot.data.as_deref()
  }

  pub fn error(&self) -> Option<&E> {
    if self.snapshot.is_error() {
      self.snapshot.error.as_deref()
    } else {
      None
    }
  }

  pub fn is_loading(&self) -> bool {
    self.snapshot.is_loading()
  }

  #[cfg(test)]
  pub fn is_success(&self) -> bool {
    self.snapshot.is_success()
  }

  #[cfg(test)]
  pub fn is_error(&self) -> bool {
    self.snapshot.is_error()
  }

  #[cfg(test)]
  pub fn is_fetching(&self) -> bool {
    self.snapshot.is_fetching
  }

  /// Pick up the latest entry state without blocking.
  ///
  /// Returns `true` if the state changed since the last poll.
  /// Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    match self.receiver.has_changed() {
      Ok(true) => {
        self.snapshot = self.receiver.borrow_and_update().clone();
        true
      }
      _ => false,
    }
  }

  /// Wait until the entry changes, then update the local snapshot.
  #[cfg(test)]
  pub async fn changed(&mut self) {
    if self.receiver.changed().await.is_ok() {
      self.snapshot = self.receiver.borrow_and_update().clone();
    }
  }

  /// Force a network call for this key.
  pub fn refetch(&self) -> RefetchHandle {
    self.cache.refetch(&self.key, &self.fetcher)
  }

  /// Refetch only if the data is stale and no fetch is running.
  pub fn refetch_if_stale(&self) -> Option<RefetchHandle> {
    self.cache.refetch_if_stale(&self.key, &self.fetcher)
  }
}

impl<K: std::fmt::Debug, T: std::fmt::Debug, E: std::fmt::Debug> std::fmt::Debug
  for Query<K, T, E>
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("key", &self.key)
      .field("snapshot", &self.snapshot)
      .finish_non_exhaustive()
  }
}
