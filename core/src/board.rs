// constructmate/src/board.rs

//! The orders screen as one unit: a listing, its realtime subscription and the
//! order workflow, all bound to the current caller.

use crate::access::Caller;
use crate::config::MateConfig;
use crate::error::MateResult;
use crate::gateway::Backend;
use crate::query::{OrderListing, OrderQueryEngine};
use crate::sync::{RealtimeSync, SyncOptions};
use crate::workflow::OrderWorkflow;
use std::sync::Arc;
use tracing::{event, instrument, Level};

pub struct OrderBoard {
  listing: OrderListing,
  sync: Option<RealtimeSync>,
  workflow: OrderWorkflow,
  backend: Backend,
  options: SyncOptions,
}

impl OrderBoard {
  /// Loads the first page and starts listening for changes in the caller's scope.
  #[instrument(
    name = "OrderBoard::open",
    skip_all,
    fields(user_id = %caller.user_id, privileged = caller.is_privileged()),
    err(Display)
  )]
  pub async fn open(backend: Backend, caller: Caller, config: &MateConfig) -> MateResult<Self> {
    let engine = OrderQueryEngine::new(backend.orders.clone(), config.page_size);
    let listing = OrderListing::new(engine, caller, config.search_debounce);
    let options = SyncOptions::from(config);

    listing.refresh().await?;
    let sync = RealtimeSync::activate(
      backend.feed.clone(),
      Arc::new(listing.handle()),
      caller,
      options.clone(),
    )
    .await?;

    event!(Level::INFO, "Order board opened.");
    Ok(Self {
      listing,
      sync: Some(sync),
      workflow: OrderWorkflow::new(&backend, config),
      backend,
      options,
    })
  }

  pub fn listing(&self) -> &OrderListing {
    &self.listing
  }

  pub fn workflow(&self) -> &OrderWorkflow {
    &self.workflow
  }

  pub fn caller(&self) -> Caller {
    self.listing.handle().caller()
  }

  pub fn sync(&self) -> Option<&RealtimeSync> {
    self.sync.as_ref()
  }

  /// Re-scopes both the listing and the subscription to a new identity.
  ///
  /// The subscription is re-opened under the new scope even when the first
  /// fetch for the new caller fails; that fetch error is returned afterwards.
  #[instrument(name = "OrderBoard::switch_caller", skip_all, fields(user_id = %caller.user_id), err(Display))]
  pub async fn switch_caller(&mut self, caller: Caller) -> MateResult<()> {
    if let Some(sync) = self.sync.take() {
      sync.deactivate().await;
    }
    let refreshed = self.listing.handle().set_caller(caller).await;
    if let Err(e) = &refreshed {
      event!(Level::WARN, error = %e, "First fetch for the new caller failed; subscribing anyway.");
    }
    let sync = RealtimeSync::activate(
      self.backend.feed.clone(),
      Arc::new(self.listing.handle()),
      caller,
      self.options.clone(),
    )
    .await?;
    self.sync = Some(sync);
    refreshed.map(|_| ())
  }

  /// Stops live updates and the search debouncer. No refetch runs after this returns.
  pub async fn close(mut self) {
    if let Some(sync) = self.sync.take() {
      sync.deactivate().await;
    }
    self.listing.close();
    event!(Level::INFO, "Order board closed.");
  }
}
