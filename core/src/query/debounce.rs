// constructmate/src/query/debounce.rs

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{event, Level};

/// Trailing-edge debouncer: only the last value pushed within a quiet window
/// of `window` reaches `on_settled`.
///
/// Every push resets the window. Dropping the debouncer (or calling
/// [`Debouncer::cancel`]) discards any pending value, abandons an `on_settled`
/// call still in flight and stops the worker task.
pub struct Debouncer<T: Send + 'static> {
  tx: mpsc::UnboundedSender<T>,
  cancel: CancellationToken,
}

impl<T: Send + 'static> Debouncer<T> {
  /// Spawns the worker on the current tokio runtime.
  pub fn spawn<F, Fut>(window: Duration, on_settled: F) -> Self
  where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
  {
    let (tx, mut rx) = mpsc::unbounded_channel::<T>();
    let cancel = CancellationToken::new();
    let worker_cancel = cancel.clone();

    tokio::spawn(async move {
      let mut pending: Option<T> = None;
      let mut deadline: Option<Instant> = None;

      loop {
        let sleep_until = deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

        tokio::select! {
          biased;

          _ = worker_cancel.cancelled() => {
            event!(Level::TRACE, discarded = pending.is_some(), "Debouncer cancelled.");
            break;
          }

          received = rx.recv() => match received {
            Some(value) => {
              pending = Some(value);
              deadline = Some(Instant::now() + window);
            }
            None => break,
          },

          _ = tokio::time::sleep_until(sleep_until), if deadline.is_some() => {
            deadline = None;
            if let Some(value) = pending.take() {
              tokio::select! {
                biased;
                _ = worker_cancel.cancelled() => {
                  event!(Level::TRACE, "Debouncer cancelled while a settled value was being handled.");
                  break;
                }
                _ = on_settled(value) => {}
              }
            }
          }
        }
      }
    });

    Self { tx, cancel }
  }

  /// Records a new raw value and restarts the quiet window.
  pub fn push(&self, value: T) {
    if self.tx.send(value).is_err() {
      event!(Level::DEBUG, "Debouncer worker already stopped; value dropped.");
    }
  }

  pub fn cancel(&self) {
    self.cancel.cancel();
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancel.is_cancelled()
  }
}

impl<T: Send + 'static> Drop for Debouncer<T> {
  fn drop(&mut self) {
    self.cancel.cancel();
  }
}
