// constructmate/src/sync/realtime.rs

use crate::access::Caller;
use crate::config::MateConfig;
use crate::error::{MateError, MateResult};
use crate::gateway::{ChangeFeed, EventMask, RowFilter, Subscription, SubscriptionId};
use crate::query::listing::ListingHandle;
use crate::sync::RefreshTarget;
use async_trait::async_trait;
use futures_util::{FutureExt, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{event, instrument, Level};

#[async_trait]
impl RefreshTarget for ListingHandle {
  fn invalidate(&self) {
    ListingHandle::invalidate(self);
  }

  async fn refetch(&self) -> MateResult<()> {
    self.refresh().await.map(|_| ())
  }
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
  pub table: String,
  pub reconnect_delay: Duration,
}

impl From<&MateConfig> for SyncOptions {
  fn from(config: &MateConfig) -> Self {
    Self {
      table: config.orders_table.clone(),
      reconnect_delay: config.reconnect_delay,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
  pub events_received: u64,
  pub refetches: u64,
  pub reconnects: u64,
}

#[derive(Default)]
struct SyncCounters {
  events_received: AtomicU64,
  refetches: AtomicU64,
  reconnects: AtomicU64,
}

/// One live change-feed subscription bound to a refresh target.
///
/// Every insert/update/delete event invalidates the target and triggers a
/// refetch with whatever filter state is current. Events already delivered
/// when a refetch starts are folded into it; an event arriving while a
/// refetch is in flight gets its own refetch afterwards, so no change is
/// dropped. The scope is fixed at activation; use [`RealtimeSync::rescope`]
/// when the caller's identity or role changes.
pub struct RealtimeSync {
  caller: Caller,
  feed: Arc<dyn ChangeFeed>,
  target: Arc<dyn RefreshTarget>,
  options: SyncOptions,
  cancel: CancellationToken,
  task: Option<JoinHandle<()>>,
  counters: Arc<SyncCounters>,
}

impl RealtimeSync {
  /// Opens the subscription (scoped to the caller's rows unless privileged)
  /// and starts the worker task.
  #[instrument(
    name = "RealtimeSync::activate",
    skip_all,
    fields(user_id = %caller.user_id, privileged = caller.is_privileged(), table = %options.table),
    err(Display)
  )]
  pub async fn activate(
    feed: Arc<dyn ChangeFeed>,
    target: Arc<dyn RefreshTarget>,
    caller: Caller,
    options: SyncOptions,
  ) -> MateResult<Self> {
    let scope = caller.owner_scope().map(RowFilter::OwnedBy);
    let subscription = feed
      .subscribe(&options.table, EventMask::ALL, scope)
      .await
      .map_err(|source| MateError::SubscriptionFailed { source })?;
    event!(Level::INFO, subscription = subscription.id.0, "Realtime order feed active.");

    let cancel = CancellationToken::new();
    let counters = Arc::new(SyncCounters::default());
    let worker = SyncWorker {
      feed: feed.clone(),
      target: target.clone(),
      table: options.table.clone(),
      scope,
      reconnect_delay: options.reconnect_delay,
      cancel: cancel.clone(),
      counters: counters.clone(),
    };
    let task = tokio::spawn(worker.run(subscription));

    Ok(Self {
      caller,
      feed,
      target,
      options,
      cancel,
      task: Some(task),
      counters,
    })
  }

  pub fn caller(&self) -> Caller {
    self.caller
  }

  pub fn stats(&self) -> SyncStats {
    SyncStats {
      events_received: self.counters.events_received.load(Ordering::SeqCst),
      refetches: self.counters.refetches.load(Ordering::SeqCst),
      reconnects: self.counters.reconnects.load(Ordering::SeqCst),
    }
  }

  /// Releases the subscription. Returns once the worker has stopped, so no
  /// invalidation or refetch happens after this resolves.
  pub async fn deactivate(mut self) {
    self.shutdown().await;
  }

  /// Tears down the current subscription and opens a new one for `caller`.
  pub async fn rescope(mut self, caller: Caller) -> MateResult<Self> {
    self.shutdown().await;
    let feed = self.feed.clone();
    let target = self.target.clone();
    let options = self.options.clone();
    Self::activate(feed, target, caller, options).await
  }

  async fn shutdown(&mut self) {
    self.cancel.cancel();
    if let Some(task) = self.task.take() {
      if let Err(e) = task.await {
        event!(Level::ERROR, error = %e, "Realtime worker ended abnormally.");
      }
    }
  }
}

impl Drop for RealtimeSync {
  fn drop(&mut self) {
    // The worker sees the cancellation and releases its subscription on its own.
    self.cancel.cancel();
  }
}

struct SyncWorker {
  feed: Arc<dyn ChangeFeed>,
  target: Arc<dyn RefreshTarget>,
  table: String,
  scope: Option<RowFilter>,
  reconnect_delay: Duration,
  cancel: CancellationToken,
  counters: Arc<SyncCounters>,
}

impl SyncWorker {
  async fn run(self, mut subscription: Subscription) {
    loop {
      let next = tokio::select! {
        biased;
        _ = self.cancel.cancelled() => break,
        next = subscription.events.next() => next,
      };

      let mut feed_closed = next.is_none();
      if let Some(change) = next {
        self.counters.events_received.fetch_add(1, Ordering::SeqCst);
        event!(Level::DEBUG, kind = ?change.kind, row_id = %change.row_id, "Order change received.");
        self.target.invalidate();

        let mut coalesced = 0u64;
        loop {
          match subscription.events.next().now_or_never() {
            Some(Some(_)) => coalesced += 1,
            Some(None) => {
              feed_closed = true;
              break;
            }
            None => break,
          }
        }
        if coalesced > 0 {
          self.counters.events_received.fetch_add(coalesced, Ordering::SeqCst);
          event!(Level::DEBUG, coalesced, "Folded queued changes into one refetch.");
        }

        if !self.refetch().await {
          break;
        }
      }

      if feed_closed {
        event!(Level::WARN, subscription = subscription.id.0, "Order change feed closed; reconnecting.");
        self.release(subscription.id).await;
        match self.reconnect().await {
          Some(fresh) => {
            subscription = fresh;
            self.counters.reconnects.fetch_add(1, Ordering::SeqCst);
            // Changes made while disconnected were never delivered.
            self.target.invalidate();
            if !self.refetch().await {
              break;
            }
          }
          None => return,
        }
      }
    }

    self.release(subscription.id).await;
    event!(Level::DEBUG, subscription = subscription.id.0, "Realtime worker stopped.");
  }

  /// Returns `false` when cancelled before the refetch finished.
  async fn refetch(&self) -> bool {
    tokio::select! {
      biased;
      _ = self.cancel.cancelled() => false,
      result = self.target.refetch() => {
        self.counters.refetches.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = result {
          event!(Level::WARN, error = %e, "Refetch after order change failed.");
        }
        true
      }
    }
  }

  async fn reconnect(&self) -> Option<Subscription> {
    loop {
      tokio::select! {
        biased;
        _ = self.cancel.cancelled() => return None,
        _ = tokio::time::sleep(self.reconnect_delay) => {}
      }
      match self.feed.subscribe(&self.table, EventMask::ALL, self.scope).await {
        Ok(subscription) => {
          event!(Level::INFO, subscription = subscription.id.0, "Order change feed re-established.");
          return Some(subscription);
        }
        Err(e) => event!(Level::WARN, error = %e, "Resubscribe failed; retrying."),
      }
    }
  }

  async fn release(&self, id: SubscriptionId) {
    if let Err(e) = self.feed.unsubscribe(id).await {
      event!(Level::WARN, subscription = id.0, error = %e, "Failed to release order feed subscription.");
    }
  }
}
