// constructmate/src/query/params.rs

//! Listing filter state as the UI holds it, and its mapping onto gateway filters.

use crate::access::Caller;
use crate::error::{MateError, MateResult};
use crate::gateway::OrderFilter;
use crate::models::{OrderStatus, PaymentStatus};

/// (search text, status filter, payment filter, page) as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingParams {
  pub search: String,
  pub status: Option<OrderStatus>,
  pub payment: Option<PaymentStatus>,
  /// 1-based.
  pub page: u32,
}

impl Default for ListingParams {
  fn default() -> Self {
    Self {
      search: String::new(),
      status: None,
      payment: None,
      page: 1,
    }
  }
}

impl ListingParams {
  pub fn with_search(mut self, search: &str) -> Self {
    self.search = search.to_string();
    self
  }

  pub fn with_status(mut self, status: Option<OrderStatus>) -> Self {
    self.status = status;
    self
  }

  pub fn with_payment(mut self, payment: Option<PaymentStatus>) -> Self {
    self.payment = payment;
    self
  }

  pub fn with_page(mut self, page: u32) -> Self {
    self.page = page;
    self
  }

  pub fn validate(&self) -> MateResult<()> {
    if self.page == 0 {
      return Err(MateError::validation("page", "page numbers start at 1"));
    }
    Ok(())
  }

  /// Gateway filter for `caller`. Ownership scoping is set first and cannot be
  /// overridden by any other parameter.
  pub fn to_filter(&self, caller: &Caller) -> OrderFilter {
    let search = self.search.trim();
    OrderFilter {
      owner: caller.owner_scope(),
      search: (!search.is_empty()).then(|| search.to_string()),
      status: self.status,
      payment: self.payment,
    }
  }
}

/// Parses a status dropdown value; empty means "any".
pub fn parse_status_filter(raw: &str) -> MateResult<Option<OrderStatus>> {
  let raw = raw.trim();
  if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
    return Ok(None);
  }
  raw.parse().map(Some)
}

/// Parses a payment-status dropdown value; empty means "any".
pub fn parse_payment_filter(raw: &str) -> MateResult<Option<PaymentStatus>> {
  let raw = raw.trim();
  if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
    return Ok(None);
  }
  raw.parse().map(Some)
}
