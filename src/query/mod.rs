//! Async query cache for data fetching.
//!
//! Inspired by TanStack Query: views subscribe to a [`QueryKey`] with a
//! fetcher and get a [`QueryObserver`] back. The shared [`QueryClient`]
//! decides whether to serve cached data, fetch, or refetch in the background.
//!
//! # Example
//!
//! ```ignore
//! let api = api_client.clone();
//! let mut overview = queries.subscribe(
//!     QueryKey::new("market_overview"),
//!     move || {
//!         let api = api.clone();
//!         async move { api.get_market_overview().await.map_err(QueryError::from) }
//!     },
//!     queries.default_options().with_refetch_interval(Duration::from_secs(300)),
//! );
//!
//! // In event loop tick
//! if overview.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! match overview.state().status {
//!     QueryStatus::Loading => render_spinner(),
//!     QueryStatus::Success => render_data(overview.data()),
//!     QueryStatus::Error => render_error(overview.error()),
//!     QueryStatus::Idle => {}
//! }
//! ```

mod client;
mod key;
mod mutation;
mod observer;
mod options;
mod state;

use std::sync::OnceLock;

pub use client::QueryClient;
pub use key::QueryKey;
pub use mutation::Mutation;
pub use observer::QueryObserver;
pub use options::QueryOptions;
pub use state::{QueryError, QueryErrorKind, QueryState, QueryStatus};

static GLOBAL: OnceLock<QueryClient> = OnceLock::new();

/// Initialize the process-wide query client.
///
/// The first call wins; later calls return the existing client and ignore
/// `defaults`.
pub fn init(defaults: QueryOptions) -> QueryClient {
  GLOBAL.get_or_init(|| QueryClient::new(defaults)).clone()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_init_is_idempotent() {
    let first = init(QueryOptions::default().with_retry(1));
    let second = init(QueryOptions::default().with_retry(5));
    assert_eq!(second.default_options().retry, first.default_options().retry);
    assert_eq!(GLOBAL.get().map(|c| c.default_options()), Some(first.default_options()));
  }
}
