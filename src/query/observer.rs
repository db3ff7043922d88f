use tokio::sync::watch;

use super::client::QueryClient;
use super::key::QueryKey;
use super::state::QueryState;

/// A view's subscription to one cache entry.
///
/// Holds a snapshot of the entry that is refreshed by [`poll`](Self::poll)
/// (call it on every tick) or [`changed`](Self::changed). Dropping the
/// observer unsubscribes from the entry.
pub struct QueryObserver<T> {
  client: QueryClient,
  key: QueryKey,
  receiver: watch::Receiver<u64>,
  state: QueryState<T>,
}

impl<T: Send + Sync + 'static> QueryObserver<T> {
  pub(super) fn new(
    client: QueryClient,
    key: QueryKey,
    receiver: watch::Receiver<u64>,
    state: QueryState<T>,
  ) -> Self {
    Self {
      client,
      key,
      receiver,
      state,
    }
  }

  pub fn key(&self) -> &QueryKey {
    &self.key
  }

  /// Current snapshot of the entry.
  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn is_fetching(&self) -> bool {
    self.state.is_fetching
  }

  /// Pick up any change to the entry without blocking.
  ///
  /// Returns `true` if the snapshot changed.
  pub fn poll(&mut self) -> bool {
    match self.receiver.has_changed() {
      Ok(true) => {
        self.receiver.borrow_and_update();
        self.refresh();
        true
      }
      Ok(false) => false,
      // Entry was dropped from the cache
      Err(_) => false,
    }
  }

  /// Wait for the next change to the entry and refresh the snapshot.
  ///
  /// Returns `false` if the entry has been dropped from the cache.
  #[cfg(test)]
  pub async fn changed(&mut self) -> bool {
    if self.receiver.changed().await.is_err() {
      return false;
    }
    self.refresh();
    true
  }

  /// Refetch now, superseding any request in flight for this key.
  pub fn refetch(&mut self) {
    self.client.refetch(&self.key);
    self.receiver.borrow_and_update();
    self.refresh();
  }

  fn refresh(&mut self) {
    self.state = self.client.snapshot(&self.key);
  }
}

impl<T> Drop for QueryObserver<T> {
  fn drop(&mut self) {
    self.client.unsubscribe(&self.key);
  }
}

impl<T> std::fmt::Debug for QueryObserver<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("QueryObserver")
      .field("key", &self.key)
      .field("status", &self.state.status)
      .field("is_fetching", &self.state.is_fetching)
      .finish_non_exhaustive()
  }
}
