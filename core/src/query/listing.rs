// constructmate/src/query/listing.rs

//! The stateful order listing behind the orders screen.
//!
//! `OrderListing` owns the filter/search/page state for one caller, debounces
//! raw search input, and publishes the latest applied page through a
//! `tokio::sync::watch` channel. Each fetch is stamped with a generation
//! number; a response whose generation is no longer the newest is discarded,
//! so a slow earlier query can never overwrite a newer one.

use crate::access::Caller;
use crate::error::MateResult;
use crate::query::debounce::Debouncer;
use crate::query::engine::{OrderPage, OrderQueryEngine};
use crate::query::params::ListingParams;
use crate::shared::Shared;
use crate::models::{OrderStatus, PaymentStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{event, Level};

/// What the screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingView {
  pub params: ListingParams,
  pub page: Option<OrderPage>,
  /// Set by a change notification until the next fresh page lands.
  pub stale: bool,
  pub loading: bool,
  pub error: Option<String>,
  /// Bumped whenever a fetch result (page or error) is applied.
  pub revision: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
  /// The response was the newest and is now displayed.
  Fresh(OrderPage),
  /// A newer fetch was issued while this one was in flight.
  Superseded,
  /// The requested state equals the current one; nothing was fetched.
  Unchanged,
}

struct ListingState {
  caller: Caller,
  params: ListingParams,
  issued: u64,
}

struct ListingInner {
  engine: OrderQueryEngine,
  state: Shared<ListingState>,
  view: watch::Sender<ListingView>,
}

/// Cloneable handle used by background tasks (debounce worker, realtime sync).
#[derive(Clone)]
pub struct ListingHandle {
  inner: Arc<ListingInner>,
}

impl ListingHandle {
  pub fn caller(&self) -> Caller {
    self.inner.state.read().caller
  }

  pub fn params(&self) -> ListingParams {
    self.inner.state.map_read(|s| &s.params).clone()
  }

  pub fn view(&self) -> ListingView {
    self.inner.view.borrow().clone()
  }

  pub fn watch(&self) -> watch::Receiver<ListingView> {
    self.inner.view.subscribe()
  }

  /// Marks the displayed page as out of date without fetching.
  pub fn invalidate(&self) {
    self.inner.view.send_modify(|view| view.stale = true);
  }

  /// Fetches with the current state.
  pub async fn refresh(&self) -> MateResult<FetchOutcome> {
    let (caller, params, generation) = self.inner.state.update(|s| {
      s.issued += 1;
      (s.caller, s.params.clone(), s.issued)
    });
    self.inner.view.send_modify(|view| {
      view.loading = true;
      view.params = params.clone();
    });

    let result = self.inner.engine.fetch_page(&caller, &params).await;

    let newest = self.inner.state.read().issued == generation;
    if !newest {
      event!(Level::DEBUG, generation, "Discarding superseded listing response.");
      return Ok(FetchOutcome::Superseded);
    }

    match result {
      Ok(page) => {
        self.inner.view.send_modify(|view| {
          view.page = Some(page.clone());
          view.stale = false;
          view.loading = false;
          view.error = None;
          view.revision += 1;
        });
        Ok(FetchOutcome::Fresh(page))
      }
      Err(err) => {
        event!(Level::WARN, error = %err, "Order listing fetch failed.");
        let message = err.user_message();
        self.inner.view.send_modify(|view| {
          view.loading = false;
          view.error = Some(message);
          view.revision += 1;
        });
        Err(err)
      }
    }
  }

  /// Applies a settled search term. Resets to page 1 when it differs from the
  /// current one.
  pub async fn apply_search(&self, search: &str) -> MateResult<FetchOutcome> {
    let changed = self.inner.state.update(|s| {
      if s.params.search == search {
        return false;
      }
      s.params.search = search.to_string();
      s.params.page = 1;
      true
    });
    if !changed {
      return Ok(FetchOutcome::Unchanged);
    }
    event!(Level::DEBUG, search, "Search term settled.");
    self.refresh().await
  }

  pub async fn set_status_filter(&self, status: Option<OrderStatus>) -> MateResult<FetchOutcome> {
    let changed = self.inner.state.update(|s| {
      if s.params.status == status {
        return false;
      }
      s.params.status = status;
      s.params.page = 1;
      true
    });
    if !changed {
      return Ok(FetchOutcome::Unchanged);
    }
    self.refresh().await
  }

  pub async fn set_payment_filter(&self, payment: Option<PaymentStatus>) -> MateResult<FetchOutcome> {
    let changed = self.inner.state.update(|s| {
      if s.params.payment == payment {
        return false;
      }
      s.params.payment = payment;
      s.params.page = 1;
      true
    });
    if !changed {
      return Ok(FetchOutcome::Unchanged);
    }
    self.refresh().await
  }

  pub async fn set_page(&self, page: u32) -> MateResult<FetchOutcome> {
    ListingParams::default().with_page(page).validate()?;
    let changed = self.inner.state.update(|s| {
      if s.params.page == page {
        return false;
      }
      s.params.page = page;
      true
    });
    if !changed {
      return Ok(FetchOutcome::Unchanged);
    }
    self.refresh().await
  }

  /// Switches identity. Any in-flight fetch for the previous caller is
  /// superseded; the listing restarts at page 1.
  pub async fn set_caller(&self, caller: Caller) -> MateResult<FetchOutcome> {
    self.inner.state.update(|s| {
      s.caller = caller;
      s.params.page = 1;
    });
    self.refresh().await
  }
}

pub struct OrderListing {
  handle: ListingHandle,
  search: Debouncer<String>,
}

impl OrderListing {
  /// Must be called inside a tokio runtime: the search debouncer runs as a task.
  pub fn new(engine: OrderQueryEngine, caller: Caller, search_debounce: Duration) -> Self {
    let params = ListingParams::default();
    let (view, _) = watch::channel(ListingView {
      params: params.clone(),
      page: None,
      stale: false,
      loading: false,
      error: None,
      revision: 0,
    });
    let handle = ListingHandle {
      inner: Arc::new(ListingInner {
        engine,
        state: Shared::new(ListingState {
          caller,
          params,
          issued: 0,
        }),
        view,
      }),
    };

    let worker_handle = handle.clone();
    let search = Debouncer::spawn(search_debounce, move |term: String| {
      let handle = worker_handle.clone();
      async move {
        // The outcome is already published on the view; failures are logged there.
        if let Err(err) = handle.apply_search(&term).await {
          event!(Level::DEBUG, error = %err, "Debounced search fetch failed.");
        }
      }
    });

    Self { handle, search }
  }

  pub fn handle(&self) -> ListingHandle {
    self.handle.clone()
  }

  /// Raw keystroke input. Only the value left standing after the debounce
  /// window triggers a fetch.
  pub fn set_search_input(&self, text: &str) {
    self.search.push(text.to_string());
  }

  pub async fn refresh(&self) -> MateResult<FetchOutcome> {
    self.handle.refresh().await
  }

  pub async fn set_status_filter(&self, status: Option<OrderStatus>) -> MateResult<FetchOutcome> {
    self.handle.set_status_filter(status).await
  }

  pub async fn set_payment_filter(&self, payment: Option<PaymentStatus>) -> MateResult<FetchOutcome> {
    self.handle.set_payment_filter(payment).await
  }

  pub async fn set_page(&self, page: u32) -> MateResult<FetchOutcome> {
    self.handle.set_page(page).await
  }

  pub fn view(&self) -> ListingView {
    self.handle.view()
  }

  pub fn watch(&self) -> watch::Receiver<ListingView> {
    self.handle.watch()
  }

  /// Stops the search debouncer; pending keystrokes are discarded.
  pub fn close(&self) {
    self.search.cancel();
  }
}
