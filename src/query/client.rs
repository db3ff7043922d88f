//! The query cache: one entry per [`QueryKey`], shared by every observer of
//! that key.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

use super::key::QueryKey;
use super::observer::QueryObserver;
use super::options::QueryOptions;
use super::state::{QueryError, QueryState, QueryStatus};

/// Payload stored in the cache, type-erased so one map holds every query
type ErasedData = Arc<dyn Any + Send + Sync>;

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, QueryError>> + Send>>;

/// A fetcher whose output has been erased to [`ErasedData`]
type ErasedFetcher = Arc<dyn Fn() -> BoxFuture<ErasedData> + Send + Sync>;

/// The request currently running for an entry
struct InFlight {
  generation: u64,
  task: AbortHandle,
}

struct Entry {
  status: QueryStatus,
  data: Option<ErasedData>,
  error: Option<QueryError>,
  fetched_at: Option<Instant>,
  /// Latest expiry any successful fetch has granted; never moves backwards
  stale_after: Option<Instant>,
  invalidated: bool,
  /// Generation of the most recently issued fetch
  generation: u64,
  in_flight: Option<InFlight>,
  /// Fetcher from the most recent subscription, reused by background refetches
  fetcher: Option<ErasedFetcher>,
  options: QueryOptions,
  observers: usize,
  unobserved_since: Option<Instant>,
  interval: Option<JoinHandle<()>>,
  version: watch::Sender<u64>,
}

impl Entry {
  fn new(options: QueryOptions) -> Self {
    let (version, _) = watch::channel(0);
    Self {
      status: QueryStatus::Idle,
      data: None,
      error: None,
      fetched_at: None,
      stale_after: None,
      invalidated: false,
      generation: 0,
      in_flight: None,
      fetcher: None,
      options,
      observers: 0,
      unobserved_since: None,
      interval: None,
      version,
    }
  }

  /// Stale under the current options' `stale_time`, which the latest
  /// subscription just installed
  fn is_stale(&self, now: Instant) -> bool {
    self.invalidated
      || self
        .fetched_at
        .map_or(true, |at| now >= at + self.options.stale_time)
  }

  /// Whether a subscription arriving now should start a fetch
  fn needs_fetch(&self, now: Instant) -> bool {
    if !self.options.enabled || self.in_flight.is_some() {
      return false;
    }
    self.data.is_none() || self.is_stale(now)
  }

  fn notify(&self) {
    self.version.send_modify(|v| *v = v.wrapping_add(1));
  }

  fn snapshot<T: Send + Sync + 'static>(&self) -> QueryState<T> {
    QueryState {
      status: self.status,
      data: self
        .data
        .clone()
        .and_then(|data| data.downcast::<T>().ok()),
      error: self.error.clone(),
      is_fetching: self.in_flight.is_some(),
      fetched_at: self.fetched_at,
    }
  }
}

impl Drop for Entry {
  fn drop(&mut self) {
    if let Some(in_flight) = self.in_flight.take() {
      in_flight.task.abort();
    }
    if let Some(interval) = self.interval.take() {
      interval.abort();
    }
  }
}

#[derive(Default)]
struct Inner {
  entries: HashMap<QueryKey, Entry>,
  next_generation: u64,
}

/// Shared query cache and fetch coordinator.
///
/// Cloning is cheap; all clones share one cache. The client guarantees at
/// most one in-flight request per key, serves cached data while refetching
/// stale entries, retries failures with exponential backoff, and discards
/// responses from superseded requests.
#[derive(Clone, Default)]
pub struct QueryClient {
  inner: Arc<Mutex<Inner>>,
  defaults: Arc<QueryOptions>,
}

impl QueryClient {
  pub fn new(defaults: QueryOptions) -> Self {
    Self {
      inner: Arc::default(),
      defaults: Arc::new(defaults),
    }
  }

  /// Options every subscription starts from
  pub fn default_options(&self) -> QueryOptions {
    (*self.defaults).clone()
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    // A panic while holding the lock leaves the map itself consistent
    self.inner.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Subscribe to `key`, fetching through `fetcher` when needed.
  ///
  /// Returns immediately with the current cached state. Updates are
  /// delivered to the observer, which must be polled (see
  /// [`QueryObserver::poll`]). Dropping the observer unsubscribes.
  ///
  /// Must be called from within a tokio runtime.
  pub fn subscribe<T, F, Fut>(
    &self,
    key: QueryKey,
    fetcher: F,
    options: QueryOptions,
  ) -> QueryObserver<T>
  where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
  {
    let fetcher: ErasedFetcher = Arc::new(move || -> BoxFuture<ErasedData> {
      let fut = fetcher();
      Box::pin(async move { fut.await.map(|data| Arc::new(data) as ErasedData) })
    });

    let mut inner = self.lock();
    let now = Instant::now();
    let generation = inner.next_generation;
    let entry = inner
      .entries
      .entry(key.clone())
      .or_insert_with(|| Entry::new(options.clone()));

    entry.fetcher = Some(fetcher);
    entry.options = options;
    entry.observers += 1;
    entry.unobserved_since = None;

    let mut receiver = entry.version.subscribe();

    let mut issued = None;
    if entry.needs_fetch(now) {
      if entry.data.is_some() {
        debug!(%key, "serving stale data, refetching in background");
      }
      issued = self.start_fetch(&key, entry, generation + 1);
    } else if entry.data.is_some() {
      debug!(%key, "cache hit");
    }

    if entry.interval.is_none() && entry.options.enabled {
      if let Some(every) = entry.options.refetch_interval {
        entry.interval = Some(self.spawn_interval(key.clone(), every));
      }
    }

    receiver.borrow_and_update();
    let state = entry.snapshot::<T>();
    if let Some(generation) = issued {
      inner.next_generation = generation;
    }
    drop(inner);

    QueryObserver::new(self.clone(), key, receiver, state)
  }

  /// Start a fetch for `entry`, superseding any request already in flight.
  ///
  /// Returns the generation used, or `None` when the entry has no fetcher.
  fn start_fetch(&self, key: &QueryKey, entry: &mut Entry, generation: u64) -> Option<u64> {
    let fetcher = entry.fetcher.clone()?;

    if let Some(previous) = entry.in_flight.take() {
      debug!(%key, generation = previous.generation, "superseding in-flight request");
      previous.task.abort();
    }

    entry.generation = generation;
    entry.invalidated = false;
    // Cached data is served as a success while it revalidates
    entry.status = if entry.data.is_some() {
      QueryStatus::Success
    } else {
      QueryStatus::Loading
    };

    let options = entry.options.clone();
    let client = self.clone();
    let task_key = key.clone();
    let task = tokio::spawn(async move {
      let result = fetch_with_retry(&task_key, fetcher, &options).await;
      client.complete(&task_key, generation, result);
    });

    debug!(%key, generation, "fetch started");
    entry.in_flight = Some(InFlight {
      generation,
      task: task.abort_handle(),
    });
    entry.notify();
    Some(generation)
  }

  /// Apply the outcome of the fetch issued as `generation`.
  fn complete(&self, key: &QueryKey, generation: u64, result: Result<ErasedData, QueryError>) {
    let mut inner = self.lock();
    let Some(entry) = inner.entries.get_mut(key) else {
      debug!(%key, "entry gone before its fetch resolved");
      return;
    };
    if entry.generation != generation {
      debug!(
        %key,
        generation,
        current = entry.generation,
        "discarding response from superseded request"
      );
      return;
    }

    entry.in_flight = None;
    match result {
      Ok(data) => {
        let now = Instant::now();
        let next_stale = now + entry.options.stale_time;
        entry.data = Some(data);
        entry.error = None;
        entry.status = QueryStatus::Success;
        entry.fetched_at = Some(now);
        entry.stale_after = Some(entry.stale_after.map_or(next_stale, |t| t.max(next_stale)));
        debug!(%key, generation, "fetch succeeded");
      }
      Err(err) => {
        error!(%key, generation, error = %err, "query failed");
        entry.status = QueryStatus::Error;
        entry.error = Some(err);
      }
    }

    if entry.observers > 0 {
      entry.notify();
    } else {
      let gc_time = entry.options.gc_time;
      drop(inner);
      self.schedule_gc(gc_time);
    }
  }

  fn spawn_interval(&self, key: QueryKey, every: Duration) -> JoinHandle<()> {
    let client = self.clone();
    tokio::spawn(async move {
      let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
      loop {
        ticker.tick().await;
        if !client.interval_refetch(&key) {
          break;
        }
      }
    })
  }

  /// Refetch from the interval timer. Returns false once the key is no
  /// longer observed.
  fn interval_refetch(&self, key: &QueryKey) -> bool {
    let mut inner = self.lock();
    let generation = inner.next_generation + 1;
    let Some(entry) = inner.entries.get_mut(key) else {
      return false;
    };
    if entry.observers == 0 {
      return false;
    }
    if entry.in_flight.is_none() && entry.options.enabled {
      debug!(%key, "interval refetch");
      if self.start_fetch(key, entry, generation).is_some() {
        inner.next_generation = generation;
      }
    }
    true
  }

  pub(super) fn unsubscribe(&self, key: &QueryKey) {
    let mut inner = self.lock();
    let Some(entry) = inner.entries.get_mut(key) else {
      return;
    };
    entry.observers = entry.observers.saturating_sub(1);
    if entry.observers > 0 {
      return;
    }

    if let Some(interval) = entry.interval.take() {
      interval.abort();
    }
    entry.unobserved_since = Some(Instant::now());
    let gc_time = entry.options.gc_time;
    drop(inner);

    debug!(%key, ?gc_time, "last observer gone");
    self.schedule_gc(gc_time);
  }

  fn schedule_gc(&self, after: Duration) {
    // Observers may be dropped after the runtime shut down
    if tokio::runtime::Handle::try_current().is_err() {
      return;
    }
    let client = self.clone();
    tokio::spawn(async move {
      tokio::time::sleep(after).await;
      client.collect_garbage();
    });
  }

  /// Evict every entry that has been unobserved for at least its `gc_time`
  /// and has no request in flight.
  pub fn collect_garbage(&self) {
    let now = Instant::now();
    let mut inner = self.lock();
    inner.entries.retain(|key, entry| {
      let expired = entry.observers == 0
        && entry.in_flight.is_none()
        && entry
          .unobserved_since
          .is_some_and(|since| now.duration_since(since) >= entry.options.gc_time);
      if expired {
        debug!(%key, "evicting unobserved entry");
      }
      !expired
    });
  }

  /// Refetch `key` now, superseding any request already in flight.
  pub fn refetch(&self, key: &QueryKey) {
    let mut inner = self.lock();
    let generation = inner.next_generation + 1;
    let Some(entry) = inner.entries.get_mut(key) else {
      return;
    };
    if !entry.options.enabled {
      return;
    }
    if self.start_fetch(key, entry, generation).is_some() {
      inner.next_generation = generation;
    }
  }

  /// Mark `key` stale. Observed entries refetch immediately; unobserved ones
  /// refetch on their next subscription.
  pub fn invalidate(&self, key: &QueryKey) {
    self.invalidate_where(|k| k == key);
  }

  /// Invalidate every entry whose query name is `name`.
  pub fn invalidate_matching(&self, name: &str) {
    self.invalidate_where(|k| k.name() == name);
  }

  pub fn invalidate_all(&self) {
    self.invalidate_where(|_| true);
  }

  fn invalidate_where(&self, matches: impl Fn(&QueryKey) -> bool) {
    let mut inner = self.lock();
    let mut generation = inner.next_generation;
    for (key, entry) in inner.entries.iter_mut().filter(|(k, _)| matches(k)) {
      entry.invalidated = true;
      if entry.observers > 0 && entry.options.enabled {
        debug!(%key, "invalidated, refetching");
        if self.start_fetch(key, entry, generation + 1).is_some() {
          generation += 1;
        }
      }
    }
    inner.next_generation = generation;
  }

  /// Cached data for `key`, if any and of type `T`
  #[cfg(test)]
  pub fn get_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
    self
      .lock()
      .entries
      .get(key)
      .and_then(|entry| entry.data.clone())
      .and_then(|data| data.downcast::<T>().ok())
  }

  pub(super) fn snapshot<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryState<T> {
    self
      .lock()
      .entries
      .get(key)
      .map(|entry| entry.snapshot::<T>())
      .unwrap_or_default()
  }

  #[cfg(test)]
  pub fn contains(&self, key: &QueryKey) -> bool {
    self.lock().entries.contains_key(key)
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.lock().entries.len()
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Drop every entry, aborting their requests and interval timers.
  pub fn clear(&self) {
    let entries = std::mem::take(&mut self.lock().entries);
    debug!(count = entries.len(), "clearing query cache");
    drop(entries);
  }
}

async fn fetch_with_retry(
  key: &QueryKey,
  fetcher: ErasedFetcher,
  options: &QueryOptions,
) -> Result<ErasedData, QueryError> {
  let mut attempt = 0;
  loop {
    match fetcher().await {
      Ok(data) => return Ok(data),
      Err(err) if attempt < options.retry => {
        let delay = options.retry_backoff(attempt);
        warn!(%key, attempt = attempt + 1, ?delay, error = %err, "fetch failed, retrying");
        tokio::time::sleep(delay).await;
        attempt += 1;
      }
      Err(err) => return Err(err),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::state::QueryErrorKind;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use tokio::sync::Notify;

  fn fast_options() -> QueryOptions {
    QueryOptions::default()
      .with_retry(0)
      .with_retry_delay(Duration::from_millis(10))
  }

  /// Wait until the observer has no request in flight
  async fn settle<T: Send + Sync + 'static>(observer: &mut QueryObserver<T>) {
    observer.poll();
    while observer.state().is_fetching {
      if !observer.changed().await {
        break;
      }
    }
  }

  fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
  }

  #[tokio::test(start_paused = true)]
  async fn test_first_subscription_loads() {
    let client = QueryClient::default();
    let calls = counter();
    let c = calls.clone();
    let mut obs = client.subscribe(
      QueryKey::new("overview"),
      move || {
        c.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, QueryError>(42u32) }
      },
      fast_options(),
    );

    assert!(obs.state().is_loading());
    assert!(obs.data().is_none());

    settle(&mut obs).await;
    assert!(obs.state().is_success());
    assert_eq!(obs.data(), Some(&42));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_concurrent_subscriptions_share_one_request() {
    let client = QueryClient::default();
    let calls = counter();
    let key = QueryKey::with_params("jobs", &1);

    let mut observers: Vec<QueryObserver<u32>> = (0..5)
      .map(|_| {
        let c = calls.clone();
        client.subscribe(
          key.clone(),
          move || {
            c.fetch_add(1, Ordering::SeqCst);
            async {
              tokio::time::sleep(Duration::from_millis(50)).await;
              Ok(7u32)
            }
          },
          fast_options(),
        )
      })
      .collect();

    for obs in &mut observers {
      settle(obs).await;
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    for obs in &observers {
      assert_eq!(obs.data(), Some(&7));
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_fresh_entry_is_served_without_fetch() {
    let client = QueryClient::default();
    let calls = counter();
    let key = QueryKey::new("skills");
    let options = fast_options().with_stale_time(Duration::from_secs(60));

    let subscribe = |client: &QueryClient| {
      let c = calls.clone();
      client.subscribe(
        key.clone(),
        move || {
          c.fetch_add(1, Ordering::SeqCst);
          async { Ok::<_, QueryError>(vec!["rust".to_string()]) }
        },
        options.clone(),
      )
    };

    let mut first = subscribe(&client);
    settle(&mut first).await;

    let second = subscribe(&client);
    assert!(second.state().is_success());
    assert!(!second.state().is_fetching);
    assert!(Arc::ptr_eq(
      first.state().data.as_ref().unwrap(),
      second.state().data.as_ref().unwrap()
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_stale_entry_serves_data_and_refetches_once() {
    let client = QueryClient::default();
    let calls = counter();
    let key = QueryKey::new("remote_trends");

    let subscribe = |client: &QueryClient| {
      let c = calls.clone();
      client.subscribe(
        key.clone(),
        move || {
          let n = c.fetch_add(1, Ordering::SeqCst) as u32 + 1;
          async move { Ok::<_, QueryError>(n) }
        },
        fast_options(),
      )
    };

    let mut first = subscribe(&client);
    settle(&mut first).await;
    assert_eq!(first.data(), Some(&1));

    let mut second = subscribe(&client);
    assert!(second.state().is_success());
    assert!(second.state().is_fetching);
    assert_eq!(second.data(), Some(&1));

    settle(&mut second).await;
    assert_eq!(second.data(), Some(&2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_retry_then_success() {
    let client = QueryClient::default();
    let calls = counter();
    let c = calls.clone();
    let mut obs = client.subscribe(
      QueryKey::new("flaky"),
      move || {
        let n = c.fetch_add(1, Ordering::SeqCst);
        async move {
          if n == 0 {
            Err(QueryError::new(QueryErrorKind::Timeout, "timed out"))
          } else {
            Ok(5u32)
          }
        }
      },
      fast_options().with_retry(1),
    );

    settle(&mut obs).await;
    assert!(obs.state().is_success());
    assert_eq!(obs.data(), Some(&5));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_retries_exhausted_sets_error() {
    let client = QueryClient::default();
    let calls = counter();
    let c = calls.clone();
    let mut obs: QueryObserver<u32> = client.subscribe(
      QueryKey::new("down"),
      move || {
        c.fetch_add(1, Ordering::SeqCst);
        async { Err(QueryError::new(QueryErrorKind::Transport, "connection refused")) }
      },
      fast_options().with_retry(2),
    );

    settle(&mut obs).await;
    assert!(obs.state().is_error());
    assert_eq!(obs.state().error().map(|e| e.kind()), Some(QueryErrorKind::Transport));
    assert!(obs.data().is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_failed_refetch_keeps_previous_data() {
    let client = QueryClient::default();
    let calls = counter();
    let c = calls.clone();
    let mut obs = client.subscribe(
      QueryKey::new("overview"),
      move || {
        let n = c.fetch_add(1, Ordering::SeqCst);
        async move {
          if n == 0 {
            Ok(100u32)
          } else {
            Err(QueryError::new(QueryErrorKind::HttpStatus(500), "server error"))
          }
        }
      },
      fast_options(),
    );

    settle(&mut obs).await;
    assert_eq!(obs.data(), Some(&100));

    obs.refetch();
    settle(&mut obs).await;
    assert!(obs.state().is_error());
    assert_eq!(obs.data(), Some(&100));
    assert_eq!(
      obs.state().error().map(|e| e.kind()),
      Some(QueryErrorKind::HttpStatus(500))
    );
  }

  #[tokio::test(start_paused = true)]
  async fn test_later_request_wins_over_slow_earlier_one() {
    let client = QueryClient::default();
    let calls = counter();
    let release_first = Arc::new(Notify::new());

    let c = calls.clone();
    let gate = release_first.clone();
    let mut obs = client.subscribe(
      QueryKey::new("jobs"),
      move || {
        let n = c.fetch_add(1, Ordering::SeqCst);
        let gate = gate.clone();
        async move {
          if n == 0 {
            gate.notified().await;
            Ok::<_, QueryError>("first")
          } else {
            Ok("second")
          }
        }
      },
      fast_options(),
    );

    // let the first request start before superseding it
    tokio::time::sleep(Duration::from_millis(1)).await;
    obs.refetch();
    settle(&mut obs).await;
    assert_eq!(obs.data(), Some(&"second"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    release_first.notify_waiters();
    tokio::time::sleep(Duration::from_millis(10)).await;
    obs.poll();
    assert_eq!(obs.data(), Some(&"second"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_superseded_generation_is_discarded() {
    let client = QueryClient::default();
    let key = QueryKey::new("hiring_trends");
    let mut obs: QueryObserver<u32> = client.subscribe(
      key.clone(),
      || futures::future::pending(),
      fast_options(),
    );

    let first = client.lock().entries[&key].generation;
    obs.refetch();
    let second = client.lock().entries[&key].generation;
    assert!(second > first);

    client.complete(&key, first, Ok(Arc::new(1u32)));
    obs.poll();
    assert!(obs.data().is_none());
    assert!(obs.state().is_loading());

    client.complete(&key, second, Ok(Arc::new(2u32)));
    obs.poll();
    assert_eq!(obs.data(), Some(&2));
    assert!(!obs.state().is_fetching);
  }

  #[tokio::test(start_paused = true)]
  async fn test_stale_time_is_judged_per_subscription() {
    let client = QueryClient::default();
    let calls = counter();
    let key = QueryKey::new("overview");

    let subscribe = |client: &QueryClient, stale_time: Duration| {
      let c = calls.clone();
      client.subscribe(
        key.clone(),
        move || {
          let n = c.fetch_add(1, Ordering::SeqCst) as u8 + 1;
          async move { Ok::<_, QueryError>(n) }
        },
        fast_options().with_stale_time(stale_time),
      )
    };

    let mut obs = subscribe(&client, Duration::from_secs(600));
    settle(&mut obs).await;
    let before = client.lock().entries[&key].stale_after;
    drop(obs);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let mut obs = subscribe(&client, Duration::ZERO);
    assert!(obs.state().is_success());
    assert!(obs.state().is_fetching);
    assert_eq!(obs.data(), Some(&1));

    settle(&mut obs).await;
    assert_eq!(obs.data(), Some(&2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // The short stale time does not pull the recorded expiry back
    let after = client.lock().entries[&key].stale_after;
    assert!(after >= before);
  }

  #[tokio::test(start_paused = true)]
  async fn test_long_stale_time_reuses_data_from_short_one() {
    let client = QueryClient::default();
    let calls = counter();
    let key = QueryKey::new("top_skills");

    let subscribe = |client: &QueryClient, stale_time: Duration| {
      let c = calls.clone();
      client.subscribe(
        key.clone(),
        move || {
          c.fetch_add(1, Ordering::SeqCst);
          async { Ok::<_, QueryError>(1u8) }
        },
        fast_options().with_stale_time(stale_time),
      )
    };

    let mut short = subscribe(&client, Duration::ZERO);
    settle(&mut short).await;

    tokio::time::sleep(Duration::from_secs(1)).await;
    let long = subscribe(&client, Duration::from_secs(60));
    assert!(!long.state().is_fetching);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_resubscribe_after_failed_refetch_serves_data_as_success() {
    let client = QueryClient::default();
    let calls = counter();
    let key = QueryKey::new("market_overview");

    let subscribe = |client: &QueryClient| {
      let c = calls.clone();
      client.subscribe(
        key.clone(),
        move || {
          let n = c.fetch_add(1, Ordering::SeqCst);
          async move {
            match n {
              1 => Err(QueryError::new(QueryErrorKind::HttpStatus(502), "bad gateway")),
              _ => Ok::<_, QueryError>(n as u32),
            }
          }
        },
        fast_options(),
      )
    };

    let mut obs = subscribe(&client);
    settle(&mut obs).await;
    obs.refetch();
    settle(&mut obs).await;
    assert!(obs.state().is_error());
    assert_eq!(obs.data(), Some(&0));
    drop(obs);

    let mut obs = subscribe(&client);
    assert!(obs.state().is_success());
    assert!(obs.state().is_fetching);
    assert_eq!(obs.data(), Some(&0));

    settle(&mut obs).await;
    assert!(obs.state().is_success());
    assert_eq!(obs.data(), Some(&2));
  }

  #[tokio::test(start_paused = true)]
  async fn test_disabled_query_stays_idle() {
    let client = QueryClient::default();
    let calls = counter();
    let c = calls.clone();
    let mut obs = client.subscribe(
      QueryKey::new("job"),
      move || {
        c.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, QueryError>(1u32) }
      },
      fast_options().enabled(false),
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    obs.poll();
    assert!(obs.state().is_idle());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    obs.refetch();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_interval_refetch_stops_without_observers() {
    let client = QueryClient::default();
    let calls = counter();
    let c = calls.clone();
    let mut obs = client.subscribe(
      QueryKey::new("overview"),
      move || {
        c.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, QueryError>(0u32) }
      },
      fast_options()
        .with_stale_time(Duration::from_secs(3600))
        .with_refetch_interval(Duration::from_secs(1)),
    );
    settle(&mut obs).await;

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    drop(obs);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 4);
  }

  #[tokio::test(start_paused = true)]
  async fn test_unobserved_entry_is_evicted_after_gc_time() {
    let client = QueryClient::default();
    let key = QueryKey::new("industries");
    let mut obs = client.subscribe(
      key.clone(),
      || async { Ok::<_, QueryError>(1u32) },
      fast_options().with_gc_time(Duration::from_secs(1)),
    );
    settle(&mut obs).await;

    drop(obs);
    assert!(client.contains(&key));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(!client.contains(&key));
  }

  #[tokio::test(start_paused = true)]
  async fn test_remount_before_gc_reuses_entry() {
    let client = QueryClient::default();
    let key = QueryKey::new("industries");
    let options = fast_options()
      .with_gc_time(Duration::from_secs(10))
      .with_stale_time(Duration::from_secs(60));
    let mut obs = client.subscribe(key.clone(), || async { Ok::<_, QueryError>(9u32) }, options.clone());
    settle(&mut obs).await;
    drop(obs);

    tokio::time::sleep(Duration::from_secs(5)).await;
    let again: QueryObserver<u32> = client.subscribe(
      key.clone(),
      || async { Ok(10u32) },
      options,
    );
    assert_eq!(again.data(), Some(&9));

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(client.contains(&key));
  }

  #[tokio::test(start_paused = true)]
  async fn test_in_flight_entry_is_never_evicted() {
    let client = QueryClient::default();
    let key = QueryKey::new("slow");
    let obs: QueryObserver<u32> = client.subscribe(
      key.clone(),
      || futures::future::pending(),
      fast_options().with_gc_time(Duration::from_secs(1)),
    );
    drop(obs);

    tokio::time::sleep(Duration::from_secs(5)).await;
    client.collect_garbage();
    assert!(client.contains(&key));
  }

  #[tokio::test(start_paused = true)]
  async fn test_invalidate_refetches_observed_entries() {
    let client = QueryClient::default();
    let calls = counter();
    let c = calls.clone();
    let mut obs = client.subscribe(
      QueryKey::new("market_overview"),
      move || {
        c.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, QueryError>(1u32) }
      },
      fast_options().with_stale_time(Duration::from_secs(3600)),
    );
    settle(&mut obs).await;

    client.invalidate_matching("market_overview");
    settle(&mut obs).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    client.invalidate_matching("top_skills");
    settle(&mut obs).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_invalidate_unobserved_entry_refetches_on_next_subscription() {
    let client = QueryClient::default();
    let calls = counter();
    let key = QueryKey::with_params("job", &"42");
    let options = fast_options().with_stale_time(Duration::from_secs(3600));

    let subscribe = |client: &QueryClient| {
      let c = calls.clone();
      client.subscribe(
        key.clone(),
        move || {
          c.fetch_add(1, Ordering::SeqCst);
          async { Ok::<_, QueryError>(1u32) }
        },
        options.clone(),
      )
    };

    let mut obs = subscribe(&client);
    settle(&mut obs).await;
    drop(obs);

    client.invalidate(&key);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let mut obs = subscribe(&client);
    assert!(obs.state().is_fetching);
    assert_eq!(obs.data(), Some(&1));
    settle(&mut obs).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_clear_drops_entries() {
    let client = QueryClient::default();
    let key = QueryKey::new("jobs");
    let mut obs = client.subscribe(key.clone(), || async { Ok::<_, QueryError>(1u32) }, fast_options());
    settle(&mut obs).await;
    assert_eq!(client.get_query_data::<u32>(&key).as_deref(), Some(&1));

    client.clear();
    assert!(client.is_empty());
    assert!(client.get_query_data::<u32>(&key).is_none());
  }
}
