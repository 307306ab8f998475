// constructmate/src/query/engine.rs

//! Turns listing parameters into gateway calls and returns one page of orders
//! together with the filtered row count.

use crate::access::Caller;
use crate::error::{MateError, MateResult};
use crate::gateway::{OrderGateway, OrderQuery, PageRange, SortSpec};
use crate::models::Order;
use crate::query::params::ListingParams;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// One page of a filtered listing.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPage {
  pub rows: Vec<Order>,
  /// Rows matching the filter across all pages.
  pub total_count: u64,
  pub page: u32,
  pub page_size: u32,
}

impl OrderPage {
  /// `ceil(total_count / page_size)`; zero for an empty result.
  pub fn total_pages(&self) -> u32 {
    total_pages(self.total_count, self.page_size)
  }

  pub fn has_next(&self) -> bool {
    self.page < self.total_pages()
  }

  pub fn has_previous(&self) -> bool {
    self.page > 1
  }
}

pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
  if page_size == 0 {
    return 0;
  }
  u32::try_from(total_count.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
}

#[derive(Clone)]
pub struct OrderQueryEngine {
  gateway: Arc<dyn OrderGateway>,
  page_size: u32,
}

impl OrderQueryEngine {
  pub fn new(gateway: Arc<dyn OrderGateway>, page_size: u32) -> Self {
    Self {
      gateway,
      page_size: page_size.max(1),
    }
  }

  pub fn page_size(&self) -> u32 {
    self.page_size
  }

  /// The page-bounded, newest-first descriptor for `params` as seen by `caller`.
  pub fn build_query(&self, caller: &Caller, params: &ListingParams) -> OrderQuery {
    OrderQuery {
      filter: params.to_filter(caller),
      sort: SortSpec::newest_first(),
      range: Some(PageRange::for_page(params.page, self.page_size)),
    }
  }

  /// Issues a count-only call and a page-bounded data call. Either failing
  /// fails the whole fetch; nothing is retried.
  #[instrument(
    name = "OrderQueryEngine::fetch_page",
    skip_all,
    fields(
      user_id = %caller.user_id,
      privileged = caller.is_privileged(),
      page = params.page,
      status = ?params.status,
      payment = ?params.payment,
    ),
    err(Display)
  )]
  pub async fn fetch_page(&self, caller: &Caller, params: &ListingParams) -> MateResult<OrderPage> {
    params.validate()?;
    let query = self.build_query(caller, params);

    let (total_count, row_set) = tokio::try_join!(
      async {
        self
          .gateway
          .count_orders(&query.filter)
          .await
          .map_err(|source| MateError::QueryFailed { source })
      },
      async {
        self
          .gateway
          .query_orders(&query)
          .await
          .map_err(|source| MateError::QueryFailed { source })
      },
    )?;

    event!(
      Level::DEBUG,
      rows = row_set.rows.len(),
      total_count,
      "Order page fetched."
    );
    Ok(OrderPage {
      rows: row_set.rows,
      total_count,
      page: params.page,
      page_size: self.page_size,
    })
  }
}
