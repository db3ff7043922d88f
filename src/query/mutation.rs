//! One-shot async actions (writes) that are not cached.
//!
//! A `Mutation<T>` runs its action on demand and is polled from the event
//! loop tick, the same way views poll their query observers.

use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;

use super::state::QueryError;

/// The state of a mutation
#[derive(Debug, Clone)]
pub enum MutationState<T> {
  /// Not started yet
  Idle,
  /// Action is running
  Pending,
  /// Action completed successfully
  Success(T),
  /// Action failed
  Error(QueryError),
}

impl<T> MutationState<T> {
  pub fn is_pending(&self) -> bool {
    matches!(self, MutationState::Pending)
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      MutationState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&QueryError> {
    match self {
      MutationState::Error(e) => Some(e),
      _ => None,
    }
  }
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, QueryError>> + Send>>;

type ActionFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// An async action with pending/success/error tracking.
pub struct Mutation<T> {
  state: MutationState<T>,
  action: ActionFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, QueryError>>>,
}

impl<T: Send + 'static> Mutation<T> {
  pub fn new<F, Fut>(action: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
  {
    Self {
      state: MutationState::Idle,
      action: Box::new(move || -> BoxFuture<T> { Box::pin(action()) }),
      receiver: None,
    }
  }

  pub fn state(&self) -> &MutationState<T> {
    &self.state
  }

  pub fn is_pending(&self) -> bool {
    self.state.is_pending()
  }

  /// Run the action. No-op while a previous run is still pending.
  pub fn mutate(&mut self) {
    if self.state.is_pending() {
      return;
    }

    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = MutationState::Pending;

    let future = (self.action)();
    tokio::spawn(async move {
      // Receiver may have been dropped
      let _ = tx.send(future.await);
    });
  }

  /// Poll for the result of a pending run.
  ///
  /// Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let Some(receiver) = &mut self.receiver else {
      return false;
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = MutationState::Success(data);
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.state = MutationState::Error(error);
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.state = MutationState::Error(QueryError::other("mutation was cancelled"));
        self.receiver = None;
        true
      }
    }
  }

  /// Forget the last result.
  pub fn reset(&mut self) {
    self.receiver = None;
    self.state = MutationState::Idle;
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Mutation<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Mutation")
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn test_mutation_success() {
    let mut mutation = Mutation::new(|| async { Ok::<_, QueryError>("started") });
    assert!(matches!(mutation.state(), MutationState::Idle));

    mutation.mutate();
    assert!(mutation.is_pending());

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(mutation.poll());
    assert_eq!(mutation.state().data(), Some(&"started"));
  }

  #[tokio::test]
  async fn test_mutation_error() {
    let mut mutation: Mutation<()> = Mutation::new(|| async { Err(QueryError::other("forbidden")) });

    mutation.mutate();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(mutation.poll());
    assert_eq!(mutation.state().error().map(|e| e.message()), Some("forbidden"));
  }

  #[tokio::test]
  async fn test_mutate_while_pending_is_noop() {
    let calls = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
    let c = calls.clone();
    let mut mutation = Mutation::new(move || {
      c.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
      async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, QueryError>(())
      }
    });

    mutation.mutate();
    mutation.mutate();
    assert!(mutation.is_pending());
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_reset_allows_another_run() {
    let calls = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
    let c = calls.clone();
    let mut mutation = Mutation::new(move || {
      let n = c.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
      async move { Ok::<_, QueryError>(n) }
    });

    mutation.mutate();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(mutation.poll());
    assert_eq!(mutation.state().data(), Some(&0));

    mutation.reset();
    assert!(matches!(mutation.state(), MutationState::Idle));
    assert!(!mutation.poll());

    mutation.mutate();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(mutation.poll());
    assert_eq!(mutation.state().data(), Some(&1));
  }
}
