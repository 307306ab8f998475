// constructmate/src/workflow/status.rs

use crate::models::OrderStatus;

/// How a status change relates to the nominal lifecycle
/// `pending → confirmed → processing → delivered → completed`.
///
/// Administrators may set any status from any other; the classification is
/// only used for logging and for callers that want to warn before odd moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  Unchanged,
  Forward,
  Backward,
  Cancel,
  /// Leaves `completed` or `cancelled`.
  Reopen,
}

fn rank(status: OrderStatus) -> Option<u8> {
  match status {
    OrderStatus::Pending => Some(0),
    OrderStatus::Confirmed => Some(1),
    OrderStatus::Processing => Some(2),
    OrderStatus::Delivered => Some(3),
    OrderStatus::Completed => Some(4),
    OrderStatus::Cancelled => None,
  }
}

pub fn classify(from: OrderStatus, to: OrderStatus) -> Transition {
  if from == to {
    return Transition::Unchanged;
  }
  if from.is_terminal() {
    return Transition::Reopen;
  }
  if to == OrderStatus::Cancelled {
    return Transition::Cancel;
  }
  match (rank(from), rank(to)) {
    (Some(a), Some(b)) if b > a => Transition::Forward,
    _ => Transition::Backward,
  }
}

/// The next step on the nominal path, if there is one.
pub fn next_in_lifecycle(status: OrderStatus) -> Option<OrderStatus> {
  match status {
    OrderStatus::Pending => Some(OrderStatus::Confirmed),
    OrderStatus::Confirmed => Some(OrderStatus::Processing),
    OrderStatus::Processing => Some(OrderStatus::Delivered),
    OrderStatus::Delivered => Some(OrderStatus::Completed),
    OrderStatus::Completed | OrderStatus::Cancelled => None,
  }
}
