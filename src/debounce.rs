//! Trailing-edge debounce for values produced on the UI thread.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Delays a value until `delay` has passed without another [`call`](Self::call).
///
/// Each call cancels the pending timer and starts a new one, so only the
/// last value of a burst is emitted. Emitted values are picked up with
/// [`poll`](Self::poll) from the event loop tick.
pub struct Debouncer<T> {
  delay: Duration,
  pending: Option<JoinHandle<()>>,
  tx: mpsc::UnboundedSender<T>,
  rx: mpsc::UnboundedReceiver<T>,
}

impl<T: Send + 'static> Debouncer<T> {
  pub fn new(delay: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      delay,
      pending: None,
      tx,
      rx,
    }
  }

  /// Schedule `value`, replacing whatever was scheduled before.
  pub fn call(&mut self, value: T) {
    self.cancel();

    let tx = self.tx.clone();
    let delay = self.delay;
    self.pending = Some(tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      let _ = tx.send(value);
    }));
  }

  /// Emit `value` now and drop anything still scheduled.
  pub fn flush(&mut self, value: T) {
    self.cancel();
    let _ = self.tx.send(value);
  }

  pub fn cancel(&mut self) {
    if let Some(task) = self.pending.take() {
      task.abort();
    }
  }

  /// Whether a scheduled value has not fired yet
  pub fn is_pending(&self) -> bool {
    self.pending.as_ref().is_some_and(|task| !task.is_finished())
  }

  /// Next emitted value, if any.
  pub fn poll(&mut self) -> Option<T> {
    self.rx.try_recv().ok()
  }
}

impl<T> Drop for Debouncer<T> {
  fn drop(&mut self) {
    if let Some(task) = self.pending.take() {
      task.abort();
    }
  }
}
