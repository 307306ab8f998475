// constructmate/src/gateway/types.rs

//! Query descriptors and change-feed events exchanged with the gateway.

use crate::models::{Order, OrderStatus, PaymentStatus};
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;
use uuid::Uuid;

/// Combined row predicate: ownership ∧ search ∧ status ∧ payment status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
  /// Applied before every other constraint when set.
  pub owner: Option<Uuid>,
  /// Case-insensitive "contains" against order number OR project name.
  pub search: Option<String>,
  pub status: Option<OrderStatus>,
  pub payment: Option<PaymentStatus>,
}

impl OrderFilter {
  pub fn matches(&self, order: &Order) -> bool {
    if let Some(owner) = self.owner {
      if order.user_id != owner {
        return false;
      }
    }
    if let Some(term) = &self.search {
      let needle = term.to_lowercase();
      let hit = order.order_number.to_lowercase().contains(&needle)
        || order.project_name.to_lowercase().contains(&needle);
      if !hit {
        return false;
      }
    }
    if let Some(status) = self.status {
      if order.status != status {
        return false;
      }
    }
    if let Some(payment) = self.payment {
      if !payment.admits(order.paid_amount, order.total_amount) {
        return false;
      }
    }
    true
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
  CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
  pub column: SortColumn,
  pub descending: bool,
}

impl SortSpec {
  pub fn newest_first() -> Self {
    Self {
      column: SortColumn::CreatedAt,
      descending: true,
    }
  }
}

/// Zero-based row window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
  pub offset: u64,
  pub limit: u64,
}

impl PageRange {
  /// Window for 1-based `page` of `page_size` rows.
  pub fn for_page(page: u32, page_size: u32) -> Self {
    let page = u64::from(page.max(1));
    let size = u64::from(page_size);
    Self {
      offset: (page - 1) * size,
      limit: size,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
  pub filter: OrderFilter,
  pub sort: SortSpec,
  pub range: Option<PageRange>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
  pub rows: Vec<Order>,
  pub total_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
  Insert,
  Update,
  Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
  pub kind: ChangeKind,
  pub table: String,
  pub row_id: Uuid,
  pub owner_id: Uuid,
  pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMask {
  pub insert: bool,
  pub update: bool,
  pub delete: bool,
}

impl EventMask {
  pub const ALL: EventMask = EventMask {
    insert: true,
    update: true,
    delete: true,
  };

  pub fn allows(&self, kind: ChangeKind) -> bool {
    match kind {
      ChangeKind::Insert => self.insert,
      ChangeKind::Update => self.update,
      ChangeKind::Delete => self.delete,
    }
  }
}

/// Server-side scope of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFilter {
  OwnedBy(Uuid),
}

impl RowFilter {
  pub fn admits(&self, event: &ChangeEvent) -> bool {
    match self {
      RowFilter::OwnedBy(user_id) => event.owner_id == *user_id,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// A live change feed. The stream ends when the gateway drops the channel or
/// the subscription is released.
pub struct Subscription {
  pub id: SubscriptionId,
  pub events: BoxStream<'static, ChangeEvent>,
}

impl std::fmt::Debug for Subscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription").field("id", &self.id).finish()
  }
}
