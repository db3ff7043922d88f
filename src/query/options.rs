use std::time::Duration;

/// Upper bound for the exponential retry backoff
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Per-subscription query behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
  /// How long fetched data counts as fresh
  pub stale_time: Duration,
  /// Extra attempts after the first failure
  pub retry: u32,
  /// Base delay of the exponential retry backoff
  pub retry_delay: Duration,
  /// Background refetch period while the key is observed
  pub refetch_interval: Option<Duration>,
  /// Disabled queries never fetch
  pub enabled: bool,
  /// How long an unobserved entry is kept before eviction
  pub gc_time: Duration,
}

impl Default for QueryOptions {
  fn default() -> Self {
    Self {
      stale_time: Duration::ZERO,
      retry: 1,
      retry_delay: Duration::from_secs(1),
      refetch_interval: None,
      enabled: true,
      gc_time: Duration::from_secs(5 * 60),
    }
  }
}

impl QueryOptions {
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  pub fn with_retry(mut self, retry: u32) -> Self {
    self.retry = retry;
    self
  }

  pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
    self.retry_delay = retry_delay;
    self
  }

  pub fn with_refetch_interval(mut self, interval: Duration) -> Self {
    self.refetch_interval = Some(interval);
    self
  }

  pub fn enabled(mut self, enabled: bool) -> Self {
    self.enabled = enabled;
    self
  }

  pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
    self.gc_time = gc_time;
    self
  }

  /// Delay before retry number `attempt` (zero-based): doubles each time,
  /// capped at [`MAX_RETRY_DELAY`].
  pub fn retry_backoff(&self, attempt: u32) -> Duration {
    self
      .retry_delay
      .saturating_mul(2u32.saturating_pow(attempt))
      .min(MAX_RETRY_DELAY)
  }
}
