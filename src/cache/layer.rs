//! In-memory query cache with request deduplication and stale-while-revalidate.

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::traits::{QueryConfig, QueryKey, QuerySnapshot, QueryStatus};
use crate::query::Query;

/// A shareable factory producing one network call per invocation.
pub type Fetcher<T, E> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Wrap an async closure into a [`Fetcher`].
pub fn fetcher<T, E, F, Fut>(f: F) -> Fetcher<T, E>
where
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: std::future::Future<Output = Result<T, E>> + Send + 'static,
{
  Arc::new(move || Box::pin(f()))
}

struct Entry<T, E> {
  tx: watch::Sender<QuerySnapshot<T, E>>,
  in_flight: usize,
}

impl<T, E> Entry<T, E> {
  fn new() -> Self {
    let (tx, _rx) = watch::channel(QuerySnapshot::pending());
    Self { tx, in_flight: 0 }
  }
}

struct Inner<K, T, E> {
  entries: Mutex<HashMap<K, Entry<T, E>>>,
  config: QueryConfig,
}

/// Process-lifetime cache of query results keyed by `K`.
///
/// This is a cheap `Clone` handle; all clones share the same entries. Entries
/// are never evicted. Observers get a [`Query`] that is notified through a
/// `watch` channel whenever the entry changes, so the cache knows nothing about
/// how results are rendered.
pub struct QueryCache<K, T, E> {
  inner: Arc<Inner<K, T, E>>,
}

impl<K, T, E> QueryCache<K, T, E>
where
  K: QueryKey,
  T: Send + Sync + 'static,
  E: std::fmt::Display + Send + Sync + 'static,
{
  pub fn new(config: QueryConfig) -> Self {
    Self {
      inner: Arc::new(Inner {
        entries: Mutex::new(HashMap::new()),
        config,
      }),
    }
  }

  pub fn config(&self) -> QueryConfig {
    self.inner.config
  }

  /// Observe `key`, fetching only when needed.
  ///
  /// - no data and nothing in flight: fetch
  /// - fetch already in flight: join it
  /// - fresh data: serve it, no fetch
  /// - stale data: serve it and refetch in the background
  pub fn query(&self, key: K, fetcher: Fetcher<T, E>) -> Query<K, T, E> {
    let receiver = {
      let mut entries = self.lock();
      let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
      let snapshot = entry.tx.borrow().clone();

      if entry.in_flight > 0 {
        debug!(query = %key.description(), "joining in-flight fetch");
      } else if snapshot.data.is_none() {
        self.start_fetch(entry, &key, &fetcher);
      } else if snapshot.is_stale(self.inner.config.stale_time) {
        debug!(query = %key.description(), "stale data, refetching in background");
        self.start_fetch(entry, &key, &fetcher);
      } else {
        debug!(query = %key.description(), "cache hit");
      }

      entry.tx.subscribe()
    };

    Query::new(key, self.clone(), fetcher, receiver)
  }

  /// Force a fetch for `key` regardless of staleness or in-flight requests.
  pub fn refetch(&self, key: &K, fetcher: &Fetcher<T, E>) -> RefetchHandle {
    let mut entries = self.lock();
    let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
    RefetchHandle {
      handle: self.start_fetch(entry, key, fetcher),
    }
  }

  /// Fetch `key` only if its data is stale and nothing is in flight.
  pub fn refetch_if_stale(&self, key: &K, fetcher: &Fetcher<T, E>) -> Option<RefetchHandle> {
    let mut entries = self.lock();
    let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
    let stale = entry.tx.borrow().is_stale(self.inner.config.stale_time);
    if entry.in_flight > 0 || !stale {
      return None;
    }
    Some(RefetchHandle {
      handle: self.start_fetch(entry, key, fetcher),
    })
  }

  /// Current snapshot for `key`, if the key has ever been requested.
  #[cfg(test)]
  pub fn snapshot(&self, key: &K) -> Option<QuerySnapshot<T, E>> {
    self.lock().get(key).map(|entry| entry.tx.borrow().clone())
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<T, E>>> {
    // Entry bookkeeping never panics while holding the lock, but recover anyway.
    self
      .inner
      .entries
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Mark the entry as fetching and spawn the network call.
  /// Must be called with the entries lock held.
  fn start_fetch(
    &self,
    entry: &mut Entry<T, E>,
    key: &K,
    fetcher: &Fetcher<T, E>,
  ) -> JoinHandle<()> {
    entry.in_flight += 1;
    entry.tx.send_modify(|snapshot| {
      snapshot.is_fetching = true;
      if snapshot.data.is_none() {
        snapshot.status = QueryStatus::Pending;
      }
    });
    info!(query = %key.description(), "fetching");

    let future = fetcher();
    let cache = self.clone();
    let key = key.clone();
    tokio::spawn(async move {
      let result = future.await;
      cache.complete(&key, result);
    })
  }

  /// Apply a finished fetch. Results land in completion order.
  fn complete(&self, key: &K, result: Result<T, E>) {
    let mut entries = self.lock();
    let Some(entry) = entries.get_mut(key) else {
      return;
    };
    entry.in_flight = entry.in_flight.saturating_sub(1);
    let still_fetching = entry.in_flight > 0;

    match result {
      Ok(data) => {
        debug!(query = %key.description(), "fetch succeeded");
        entry.tx.send_modify(|snapshot| {
          snapshot.status = QueryStatus::Success;
          snapshot.data = Some(Arc::new(data));
          snapshot.error = None;
          snapshot.data_updated_at = Some(Instant::now());
          snapshot.is_fetching = still_fetching;
        });
      }
      Err(error) => {
        warn!(query = %key.description(), error = %error, "fetch failed");
        entry.tx.send_modify(|snapshot| {
          snapshot.status = QueryStatus::Error;
          snapshot.error = Some(Arc::new(error));
          snapshot.is_fetching = still_fetching;
        });
      }
    }
  }
}

impl<K, T, E> Clone for QueryCache<K, T, E> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

/// Completion handle for a forced refetch.
///
/// Dropping it does not cancel the fetch.
#[derive(Debug)]
pub struct RefetchHandle {
  handle: JoinHandle<()>,
}

impl RefetchHandle {
  /// Whether the fetch has completed, successfully or not.
  pub fn is_finished(&self) -> bool {
    self.handle.is_finished()
  }

  /// Wait for the fetch to complete and its result to be applied.
  #[cfg(test)]
  pub async fn wait(self) {
    // A panicking fetcher is reported by tokio; the entry keeps its last state.
    let _ = self.handle.await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::time::Duration;

  #[derive(Debug, Clone, PartialEq, Eq, Hash)]
  struct TestKey(&'static str);

  impl QueryKey for TestKey {
    fn description(&self) -> String {
      self.0.to_string()
    }
  }

  type TestCache = QueryCache<TestKey, u32, String>;

  fn cache_with_stale_time(stale_time: Duration) -> TestCache {
    QueryCache::new(QueryConfig {
      stale_time,
      refetch_on_focus: false,
    })
  }

  /// Fetcher that counts calls and returns the call number after `delay`.
  fn counting_fetcher(calls: Arc<AtomicU32>, delay: Duration) -> Fetcher<u32, String> {
    fetcher(move || {
      let calls = calls.clone();
      async move {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(delay).await;
        Ok(n)
      }
    })
  }

  #[tokio::test]
  async fn test_first_query_fetches() {
    let cache = cache_with_stale_time(Duration::from_secs(300));
    let calls = Arc::new(AtomicU32::new(0));

    let mut query = cache.query(
      TestKey("a"),
      counting_fetcher(calls.clone(), Duration::ZERO),
    );
    assert!(query.is_loading());

    query.changed().await;
    assert!(query.is_success());
    assert_eq!(query.data(), Some(&1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_concurrent_queries_share_one_fetch() {
    let cache = cache_with_stale_time(Duration::from_secs(300));
    let calls = Arc::new(AtomicU32::new(0));
    let fetch = counting_fetcher(calls.clone(), Duration::from_millis(20));

    let mut first = cache.query(TestKey("a"), fetch.clone());
    let mut second = cache.query(TestKey("a"), fetch.clone());
    assert!(second.is_loading());

    first.changed().await;
    second.changed().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.data(), Some(&1));
    assert_eq!(second.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_distinct_keys_fetch_separately() {
    let cache = cache_with_stale_time(Duration::from_secs(300));
    let calls = Arc::new(AtomicU32::new(0));
    let fetch = counting_fetcher(calls.clone(), Duration::ZERO);

    let mut a = cache.query(TestKey("a"), fetch.clone());
    let mut b = cache.query(TestKey("b"), fetch.clone());
    a.changed().await;
    b.changed().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_fresh_entry_served_without_fetch() {
    let cache = cache_with_stale_time(Duration::from_secs(300));
    let calls = Arc::new(AtomicU32::new(0));
    let fetch = counting_fetcher(calls.clone(), Duration::ZERO);

    let mut first = cache.query(TestKey("a"), fetch.clone());
    first.changed().await;

    let second = cache.query(TestKey("a"), fetch.clone());
    assert!(second.is_success());
    assert!(!second.is_fetching());
    assert_eq!(second.data(), Some(&1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_stale_entry_served_immediately_and_refetched_once() {
    let cache = cache_with_stale_time(Duration::from_secs(300));
    let calls = Arc::new(AtomicU32::new(0));
    let fetch = counting_fetcher(calls.clone(), Duration::from_millis(10));

    let mut first = cache.query(TestKey("a"), fetch.clone());
    first.changed().await;
    assert_eq!(first.data(), Some(&1));

    tokio::time::advance(Duration::from_secs(301)).await;

    let mut second = cache.query(TestKey("a"), fetch.clone());
    let mut third = cache.query(TestKey("a"), fetch.clone());

    // Stale data is visible right away while the refetch runs
    assert_eq!(second.data(), Some(&1));
    assert!(second.is_fetching());
    assert!(!second.is_loading());
    assert_eq!(third.data(), Some(&1));

    second.changed().await;
    third.changed().await;
    assert_eq!(second.data(), Some(&2));
    assert_eq!(third.data(), Some(&2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_refetch_ignores_freshness() {
    let cache = cache_with_stale_time(Duration::from_secs(300));
    let calls = Arc::new(AtomicU32::new(0));
    let fetch = counting_fetcher(calls.clone(), Duration::ZERO);

    let mut query = cache.query(TestKey("a"), fetch.clone());
    query.changed().await;

    query.refetch().wait().await;
    query.poll();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(query.data(), Some(&2));
  }

  #[tokio::test]
  async fn test_refetch_while_in_flight_issues_second_call() {
    let cache = cache_with_stale_time(Duration::from_secs(300));
    let calls = Arc::new(AtomicU32::new(0));
    let fetch = counting_fetcher(calls.clone(), Duration::from_millis(20));

    let _query = cache.query(TestKey("a"), fetch.clone());
    cache.refetch(&TestKey("a"), &fetch).wait().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_last_completion_wins() {
    let cache: TestCache = cache_with_stale_time(Duration::from_secs(300));

    // Background fetch resolves late with 1, forced refetch resolves first with 2
    let slow = fetcher(|| async {
      tokio::time::sleep(Duration::from_millis(50)).await;
      Ok::<_, String>(1)
    });
    let fast = fetcher(|| async { Ok::<_, String>(2) });

    let mut query = cache.query(TestKey("a"), slow.clone());
    cache.refetch(&TestKey("a"), &fast).wait().await;
    query.poll();
    assert_eq!(query.data(), Some(&2));
    assert!(query.is_fetching());

    tokio::time::sleep(Duration::from_millis(100)).await;
    query.poll();
    assert_eq!(query.data(), Some(&1));
    assert!(!query.is_fetching());
  }

  #[tokio::test]
  async fn test_error_is_stored_and_exposed() {
    let cache: TestCache = cache_with_stale_time(Duration::from_secs(300));
    let failing = fetcher(|| async { Err::<u32, _>("boom".to_string()) });

    let mut query = cache.query(TestKey("a"), failing);
    query.changed().await;

    assert!(query.is_error());
    assert_eq!(query.error().map(String::as_str), Some("boom"));
    assert!(query.data().is_none());

    let snapshot = cache.snapshot(&TestKey("a")).expect("entry exists");
    assert_eq!(snapshot.status, QueryStatus::Error);
  }

  #[tokio::test]
  async fn test_failed_entry_is_fetched_again_on_next_query() {
    let cache: TestCache = cache_with_stale_time(Duration::from_secs(300));
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = calls.clone();
    let flaky = fetcher(move || {
      let calls = calls_clone.clone();
      async move {
        match calls.fetch_add(1, Ordering::SeqCst) {
          0 => Err("offline".to_string()),
          _ => Ok(7),
        }
      }
    });

    let mut first = cache.query(TestKey("a"), flaky.clone());
    first.changed().await;
    assert!(first.is_error());

    let mut retry = cache.query(TestKey("a"), flaky.clone());
    assert!(retry.is_loading());
    retry.changed().await;
    assert_eq!(retry.data(), Some(&7));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_failed_refetch_keeps_previous_data() {
    let cache: TestCache = cache_with_stale_time(Duration::from_secs(300));
    let ok = fetcher(|| async { Ok::<_, String>(1) });
    let failing = fetcher(|| async { Err::<u32, _>("gone".to_string()) });

    let mut query = cache.query(TestKey("a"), ok);
    query.changed().await;

    cache.refetch(&TestKey("a"), &failing).wait().await;
    query.poll();

    assert!(query.is_error());
    assert_eq!(query.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_refetch_if_stale_skips_fresh_data() {
    let cache = cache_with_stale_time(Duration::from_secs(300));
    let calls = Arc::new(AtomicU32::new(0));
    let fetch = counting_fetcher(calls.clone(), Duration::ZERO);

    let mut query = cache.query(TestKey("a"), fetch.clone());
    query.changed().await;

    assert!(cache.refetch_if_stale(&TestKey("a"), &fetch).is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_dropped_observer_still_updates_entry() {
    let cache = cache_with_stale_time(Duration::from_secs(300));
    let calls = Arc::new(AtomicU32::new(0));
    let fetch = counting_fetcher(calls.clone(), Duration::from_millis(10));

    drop(cache.query(TestKey("a"), fetch.clone()));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = cache.snapshot(&TestKey("a")).expect("entry exists");
    assert!(snapshot.is_success());
    assert_eq!(snapshot.data.as_deref(), Some(&1));
  }
}
