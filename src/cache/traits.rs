//! Core traits and types for the query cache.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Trait for keys that identify a cached query.
///
/// Two requests share a cache entry exactly when their keys compare equal,
/// so the key must carry the operation and every parameter that affects the
/// result.
pub trait QueryKey: Clone + Debug + Hash + Eq + Send + Sync + 'static {
  /// Human readable description for logs (e.g., "characters page 2")
  fn description(&self) -> String;
}

/// Lifecycle status of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// No data yet, first fetch in progress (or about to start)
  Pending,
  /// Last completed fetch succeeded
  Success,
  /// Last completed fetch failed
  Error,
}

/// Observable state of one cache entry.
///
/// Data and errors are behind `Arc` so snapshots are cheap to clone and can be
/// broadcast to every observer of the key.
#[derive(Debug)]
pub struct QuerySnapshot<T, E> {
  pub status: QueryStatus,
  /// Last successfully fetched value, kept across later failures
  pub data: Option<Arc<T>>,
  /// Error from the last completed fetch, cleared on success
  pub error: Option<Arc<E>>,
  /// Whether any fetch for this key is in flight
  pub is_fetching: bool,
  /// When `data` was stored
  pub data_updated_at: Option<Instant>,
}

impl<T, E> QuerySnapshot<T, E> {
  pub fn pending() -> Self {
    Self {
      status: QueryStatus::Pending,
      data: None,
      error: None,
      is_fetching: false,
      data_updated_at: None,
    }
  }

  /// No data yet and a fetch is running.
  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Pending && self.is_fetching
  }

  #[cfg(test)]
  pub fn is_success(&self) -> bool {
    self.status == QueryStatus::Success
  }

  pub fn is_error(&self) -> bool {
    self.status == QueryStatus::Error
  }

  /// Check if the data is older than `stale_time`. Missing data counts as stale.
  pub fn is_stale(&self, stale_time: Duration) -> bool {
    match self.data_updated_at {
      Some(at) => at.elapsed() >= stale_time,
      None => true,
    }
  }
}

// Manual impl: derive would require T: Clone and E: Clone, which Arc makes unnecessary.
impl<T, E> Clone for QuerySnapshot<T, E> {
  fn clone(&self) -> Self {
    Self {
      status: self.status,
      data: self.data.clone(),
      error: self.error.clone(),
      is_fetching: self.is_fetching,
      data_updated_at: self.data_updated_at,
    }
  }
}

/// Staleness and refetch policy for a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
  /// How long fetched data is served without a background refetch
  pub stale_time: Duration,
  /// Whether regaining terminal focus refetches stale queries
  pub refetch_on_focus: bool,
}

impl Default for QueryConfig {
  fn default() -> Self {
    Self {
      stale_time: Duration::from_secs(5 * 60),
      refetch_on_focus: false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_pending_snapshot_is_not_loading_until_fetching() {
    let mut snapshot: QuerySnapshot<u32, String> = QuerySnapshot::pending();
    assert!(!snapshot.is_loading());

    snapshot.is_fetching = true;
    assert!(snapshot.is_loading());
  }

  #[test]
  fn test_missing_data_is_stale() {
    let snapshot: QuerySnapshot<u32, String> = QuerySnapshot::pending();
    assert!(snapshot.is_stale(Duration::from_secs(300)));
  }

  #[test]
  fn test_default_config() {
    let config = QueryConfig::default();
    assert_eq!(config.stale_time, Duration::from_secs(300));
    assert!(!config.refetch_on_focus);
  }
}
