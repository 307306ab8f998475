// constructmate/src/workflow/commission.rs

//! Commission rule and the payable/paid derivations built on it.
//!
//! Amounts are `Decimal`, so `total * rate` keeps full currency precision.

use crate::models::{Order, OrderStatus};
use rust_decimal::Decimal;
use serde::Serialize;

/// `total_amount * rate`, unrounded.
pub fn commission_for(total_amount: Decimal, rate: Decimal) -> Decimal {
  total_amount * rate
}

/// True when completing the order should fill in the commission: it is unset
/// or zero. A manually entered non-zero commission is never overwritten.
pub fn needs_autofill(order: &Order) -> bool {
  order.commission.map_or(true, |c| c.is_zero())
}

/// The commission to persist when `order` transitions to completed, if any.
pub fn autofill(order: &Order, rate: Decimal) -> Option<Decimal> {
  needs_autofill(order).then(|| commission_for(order.total_amount, rate))
}

/// Gate for "mark commission paid": completed, positive commission, not yet paid.
pub fn commission_payable(order: &Order) -> bool {
  order.status == OrderStatus::Completed
    && !order.commission_paid
    && order.commission.is_some_and(|c| c > Decimal::ZERO)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommissionSummary {
  /// Completed orders whose commission is still owed.
  pub payable_count: u64,
  pub payable_total: Decimal,
  pub paid_count: u64,
  pub paid_total: Decimal,
  /// Commission recorded on orders that are not completed yet.
  pub pending_total: Decimal,
}

impl CommissionSummary {
  pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
    let mut summary = Self::default();
    for order in orders {
      let Some(commission) = order.commission.filter(|c| *c > Decimal::ZERO) else {
        continue;
      };
      if order.commission_paid {
        summary.paid_count += 1;
        summary.paid_total += commission;
      } else if order.status == OrderStatus::Completed {
        summary.payable_count += 1;
        summary.payable_total += commission;
      } else if order.status != OrderStatus::Cancelled {
        summary.pending_total += commission;
      }
    }
    summary
  }
}
