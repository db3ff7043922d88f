use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;

/// Lifecycle status of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Query has not been started (or is disabled)
  Idle,
  /// First fetch in progress, no data yet
  Loading,
  /// Last fetch succeeded
  Success,
  /// Last fetch failed after all retries
  Error,
}

/// Broad category of a query failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
  /// Network unreachable or connection dropped
  Transport,
  /// Request exceeded its timeout
  Timeout,
  /// Server answered with a non-2xx status
  HttpStatus(u16),
  /// Response body did not match the expected shape
  Decode,
  Other,
}

/// Error stored in a cache entry.
///
/// Cheap to clone so every observer of an entry can hold a copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
  kind: QueryErrorKind,
  message: Arc<str>,
}

impl QueryError {
  pub fn new(kind: QueryErrorKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: Arc::from(message.into()),
    }
  }

  /// Error without a more specific category
  pub fn other(message: impl Into<String>) -> Self {
    Self::new(QueryErrorKind::Other, message)
  }

  pub fn kind(&self) -> QueryErrorKind {
    self.kind
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

impl fmt::Display for QueryError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message)
  }
}

impl std::error::Error for QueryError {}

/// Read-only snapshot of a cache entry as seen by one observer.
///
/// `data` survives refetches and failures: a failing refetch sets
/// `status` to `Error` but leaves the previous data readable.
#[derive(Debug)]
pub struct QueryState<T> {
  pub status: QueryStatus,
  pub data: Option<Arc<T>>,
  pub error: Option<QueryError>,
  /// A request for this key is in flight (first load or background refetch)
  pub is_fetching: bool,
  pub fetched_at: Option<Instant>,
}

impl<T> Clone for QueryState<T> {
  fn clone(&self) -> Self {
    Self {
      status: self.status,
      data: self.data.clone(),
      error: self.error.clone(),
      is_fetching: self.is_fetching,
      fetched_at: self.fetched_at,
    }
  }
}

impl<T> Default for QueryState<T> {
  fn default() -> Self {
    Self::idle()
  }
}

impl<T> QueryState<T> {
  pub fn idle() -> Self {
    Self {
      status: QueryStatus::Idle,
      data: None,
      error: None,
      is_fetching: false,
      fetched_at: None,
    }
  }

  pub fn data(&self) -> Option<&T> {
    self.data.as_deref()
  }

  pub fn error(&self) -> Option<&QueryError> {
    self.error.as_ref()
  }
}

#[cfg(test)]
impl<T> QueryState<T> {
  pub fn is_idle(&self) -> bool {
    self.status == QueryStatus::Idle
  }

  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  pub fn is_success(&self) -> bool {
    self.status == QueryStatus::Success
  }

  pub fn is_error(&self) -> bool {
    self.status == QueryStatus::Error
  }
}
