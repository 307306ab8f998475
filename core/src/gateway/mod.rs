// constructmate/src/gateway/mod.rs

//! The remote data service seam: row queries and mutations, receipt storage,
//! and the row-change feed. Implementations report failures as `anyhow::Error`;
//! callers convert them into the matching `MateError` variant.

pub mod memory;
pub mod types;

use crate::models::{Order, OrderPatch};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub use memory::{GatewayStats, InMemoryGateway};
pub use types::{
  ChangeEvent, ChangeKind, EventMask, OrderFilter, OrderQuery, PageRange, RowFilter, RowSet, SortColumn, SortSpec,
  Subscription, SubscriptionId,
};

#[async_trait]
pub trait OrderGateway: Send + Sync + 'static {
  /// Filtered, sorted, optionally ranged rows plus the filtered row count.
  async fn query_orders(&self, query: &OrderQuery) -> anyhow::Result<RowSet>;

  /// Exact count of rows matching `filter`, without fetching them.
  async fn count_orders(&self, filter: &OrderFilter) -> anyhow::Result<u64>;

  async fn fetch_order(&self, id: Uuid) -> anyhow::Result<Option<Order>>;

  async fn update_order(&self, id: Uuid, patch: &OrderPatch) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ReceiptStore: Send + Sync + 'static {
  /// Stores `bytes` under `bucket/path` and returns the stored path.
  async fn upload_file(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> anyhow::Result<String>;

  fn public_url(&self, bucket: &str, path: &str) -> String;
}

#[async_trait]
pub trait ChangeFeed: Send + Sync + 'static {
  async fn subscribe(&self, table: &str, mask: EventMask, filter: Option<RowFilter>) -> anyhow::Result<Subscription>;

  async fn unsubscribe(&self, id: SubscriptionId) -> anyhow::Result<()>;
}

/// The three gateway surfaces the core talks to.
#[derive(Clone)]
pub struct Backend {
  pub orders: Arc<dyn OrderGateway>,
  pub receipts: Arc<dyn ReceiptStore>,
  pub feed: Arc<dyn ChangeFeed>,
}

impl Backend {
  pub fn new(orders: Arc<dyn OrderGateway>, receipts: Arc<dyn ReceiptStore>, feed: Arc<dyn ChangeFeed>) -> Self {
    Self { orders, receipts, feed }
  }

  /// All three surfaces served by one in-process gateway.
  pub fn in_memory(gateway: Arc<InMemoryGateway>) -> Self {
    Self {
      orders: gateway.clone(),
      receipts: gateway.clone(),
      feed: gateway,
    }
  }
}
