// constructmate/src/gateway/memory.rs

//! In-process gateway backing tests, benchmarks and the demo desk.
//!
//! Holds one order table, a receipt bucket store and a set of change-feed
//! subscribers. Every mutation, whether made through [`OrderGateway`] or through
//! the "external writer" helpers, is broadcast to matching subscribers.
//! Failures, per-call latency and feed disconnects can be injected.

use crate::gateway::types::*;
use crate::gateway::{ChangeFeed, OrderGateway, ReceiptStore};
use crate::models::{Order, OrderPatch};
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{event, Level};
use uuid::Uuid;

const DEFAULT_TABLE: &str = "orders";
const DEFAULT_BASE_URL: &str = "https://storage.constructmate.local";

/// Call counters, copied out by [`InMemoryGateway::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayStats {
  pub query_calls: u64,
  pub count_calls: u64,
  pub fetch_calls: u64,
  pub update_calls: u64,
  pub upload_calls: u64,
  pub subscribe_calls: u64,
  pub unsubscribe_calls: u64,
}

#[derive(Default)]
struct Counters {
  query_calls: AtomicU64,
  count_calls: AtomicU64,
  fetch_calls: AtomicU64,
  update_calls: AtomicU64,
  upload_calls: AtomicU64,
  subscribe_calls: AtomicU64,
  unsubscribe_calls: AtomicU64,
}

#[derive(Default)]
struct Faults {
  query: Option<String>,
  update: Option<String>,
  /// Uploads whose path contains this fragment fail.
  upload_matching: Option<String>,
  subscribe: Option<String>,
}

struct Subscriber {
  table: String,
  mask: EventMask,
  filter: Option<RowFilter>,
  tx: mpsc::UnboundedSender<ChangeEvent>,
}

pub struct InMemoryGateway {
  table: String,
  base_url: String,
  orders: RwLock<Vec<Order>>,
  files: RwLock<HashMap<String, Vec<u8>>>,
  subscribers: Mutex<HashMap<SubscriptionId, Subscriber>>,
  next_subscription: AtomicU64,
  counters: Counters,
  faults: Mutex<Faults>,
  query_latencies: Mutex<VecDeque<Duration>>,
  last_query: Mutex<Option<OrderQuery>>,
}

impl Default for InMemoryGateway {
  fn default() -> Self {
    Self::new()
  }
}

impl InMemoryGateway {
  pub fn new() -> Self {
    Self::with_table(DEFAULT_TABLE)
  }

  pub fn with_table(table: &str) -> Self {
    Self {
      table: table.to_string(),
      base_url: DEFAULT_BASE_URL.to_string(),
      orders: RwLock::new(Vec::new()),
      files: RwLock::new(HashMap::new()),
      subscribers: Mutex::new(HashMap::new()),
      next_subscription: AtomicU64::new(1),
      counters: Counters::default(),
      faults: Mutex::new(Faults::default()),
      query_latencies: Mutex::new(VecDeque::new()),
      last_query: Mutex::new(None),
    }
  }

  /// Loads rows without emitting change events.
  pub fn seed(&self, orders: impl IntoIterator<Item = Order>) {
    self.orders.write().extend(orders);
  }

  pub fn order(&self, id: Uuid) -> Option<Order> {
    self.orders.read().iter().find(|o| o.id == id).cloned()
  }

  pub fn len(&self) -> usize {
    self.orders.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.orders.read().is_empty()
  }

  pub fn stats(&self) -> GatewayStats {
    let c = &self.counters;
    GatewayStats {
      query_calls: c.query_calls.load(Ordering::SeqCst),
      count_calls: c.count_calls.load(Ordering::SeqCst),
      fetch_calls: c.fetch_calls.load(Ordering::SeqCst),
      update_calls: c.update_calls.load(Ordering::SeqCst),
      upload_calls: c.upload_calls.load(Ordering::SeqCst),
      subscribe_calls: c.subscribe_calls.load(Ordering::SeqCst),
      unsubscribe_calls: c.unsubscribe_calls.load(Ordering::SeqCst),
    }
  }

  /// The most recent descriptor passed to `query_orders`.
  pub fn last_query(&self) -> Option<OrderQuery> {
    self.last_query.lock().clone()
  }

  pub fn uploaded(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
    self.files.read().get(&storage_key(bucket, path)).cloned()
  }

  pub fn uploaded_count(&self) -> usize {
    self.files.read().len()
  }

  pub fn active_subscriptions(&self) -> usize {
    self.subscribers.lock().len()
  }

  // --- Fault and latency injection ---

  pub fn fail_queries(&self, message: Option<&str>) {
    self.faults.lock().query = message.map(String::from);
  }

  pub fn fail_updates(&self, message: Option<&str>) {
    self.faults.lock().update = message.map(String::from);
  }

  pub fn fail_uploads_matching(&self, fragment: Option<&str>) {
    self.faults.lock().upload_matching = fragment.map(String::from);
  }

  pub fn fail_subscribe(&self, message: Option<&str>) {
    self.faults.lock().subscribe = message.map(String::from);
  }

  /// Queues a delay for the next `query_orders` call; one entry per call.
  pub fn push_query_latency(&self, delay: Duration) {
    self.query_latencies.lock().push_back(delay);
  }

  /// Drops every live feed, as a lost push connection would.
  pub fn disconnect_feeds(&self) {
    let dropped = {
      let mut subs = self.subscribers.lock();
      let n = subs.len();
      subs.clear();
      n
    };
    event!(Level::DEBUG, dropped, "In-memory feeds disconnected.");
  }

  // --- External writers (other users, admins on other devices) ---

  pub fn insert_order(&self, order: Order) {
    let change = self.change(ChangeKind::Insert, &order);
    self.orders.write().push(order);
    self.publish(change);
  }

  pub fn apply_external_update(&self, id: Uuid, patch: &OrderPatch) -> anyhow::Result<Order> {
    let updated = self.patch_row(id, patch)?;
    self.publish(self.change(ChangeKind::Update, &updated));
    Ok(updated)
  }

  pub fn delete_order(&self, id: Uuid) -> Option<Order> {
    let removed = {
      let mut rows = self.orders.write();
      let idx = rows.iter().position(|o| o.id == id)?;
      rows.remove(idx)
    };
    self.publish(self.change(ChangeKind::Delete, &removed));
    Some(removed)
  }

  fn patch_row(&self, id: Uuid, patch: &OrderPatch) -> anyhow::Result<Order> {
    let mut rows = self.orders.write();
    let row = rows
      .iter_mut()
      .find(|o| o.id == id)
      .ok_or_else(|| anyhow!("no order with id {}", id))?;
    patch.apply_to(row, Utc::now());
    Ok(row.clone())
  }

  fn change(&self, kind: ChangeKind, order: &Order) -> ChangeEvent {
    ChangeEvent {
      kind,
      table: self.table.clone(),
      row_id: order.id,
      owner_id: order.user_id,
      at: Utc::now(),
    }
  }

  fn publish(&self, change: ChangeEvent) {
    let mut subs = self.subscribers.lock();
    subs.retain(|id, sub| {
      let wanted = sub.table == change.table
        && sub.mask.allows(change.kind)
        && sub.filter.as_ref().map_or(true, |f| f.admits(&change));
      if !wanted {
        return true;
      }
      let delivered = sub.tx.send(change.clone()).is_ok();
      if !delivered {
        event!(Level::TRACE, subscription = id.0, "Dropping closed subscriber.");
      }
      delivered
    });
  }

  fn select(&self, filter: &OrderFilter) -> Vec<Order> {
    let rows = self.orders.read();
    let mut hits: Vec<Order> = rows.iter().filter(|o| filter.matches(o)).cloned().collect();
    // Newest first; id breaks ties so paging is stable.
    hits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    hits
  }
}

fn storage_key(bucket: &str, path: &str) -> String {
  format!("{}/{}", bucket, path)
}

#[async_trait]
impl OrderGateway for InMemoryGateway {
  async fn query_orders(&self, query: &OrderQuery) -> anyhow::Result<RowSet> {
    self.counters.query_calls.fetch_add(1, Ordering::SeqCst);
    *self.last_query.lock() = Some(query.clone());

    let delay = self.query_latencies.lock().pop_front();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    if let Some(message) = self.faults.lock().query.clone() {
      bail!(message);
    }

    let mut rows = self.select(&query.filter);
    if !query.sort.descending {
      rows.reverse();
    }
    let total_count = rows.len() as u64;
    if let Some(range) = query.range {
      rows = rows
        .into_iter()
        .skip(range.offset as usize)
        .take(range.limit as usize)
        .collect();
    }
    Ok(RowSet { rows, total_count })
  }

  async fn count_orders(&self, filter: &OrderFilter) -> anyhow::Result<u64> {
    self.counters.count_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(message) = self.faults.lock().query.clone() {
      bail!(message);
    }
    let rows = self.orders.read();
    Ok(rows.iter().filter(|o| filter.matches(o)).count() as u64)
  }

  async fn fetch_order(&self, id: Uuid) -> anyhow::Result<Option<Order>> {
    self.counters.fetch_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(message) = self.faults.lock().query.clone() {
      bail!(message);
    }
    Ok(self.order(id))
  }

  async fn update_order(&self, id: Uuid, patch: &OrderPatch) -> anyhow::Result<()> {
    self.counters.update_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(message) = self.faults.lock().update.clone() {
      bail!(message);
    }
    let updated = self.patch_row(id, patch)?;
    self.publish(self.change(ChangeKind::Update, &updated));
    Ok(())
  }
}

#[async_trait]
impl ReceiptStore for InMemoryGateway {
  async fn upload_file(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> anyhow::Result<String> {
    self.counters.upload_calls.fetch_add(1, Ordering::SeqCst);
    let rejected = self
      .faults
      .lock()
      .upload_matching
      .as_deref()
      .is_some_and(|fragment| path.contains(fragment));
    if rejected {
      bail!("storage rejected upload of '{}'", path);
    }

    let key = storage_key(bucket, path);
    let mut files = self.files.write();
    if files.contains_key(&key) {
      bail!("object '{}' already exists", key);
    }
    files.insert(key, bytes);
    Ok(path.to_string())
  }

  fn public_url(&self, bucket: &str, path: &str) -> String {
    format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
  }
}

#[async_trait]
impl ChangeFeed for InMemoryGateway {
  async fn subscribe(&self, table: &str, mask: EventMask, filter: Option<RowFilter>) -> anyhow::Result<Subscription> {
    self.counters.subscribe_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(message) = self.faults.lock().subscribe.clone() {
      bail!(message);
    }

    let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
    let (tx, rx) = mpsc::unbounded_channel();
    self.subscribers.lock().insert(
      id,
      Subscriber {
        table: table.to_string(),
        mask,
        filter,
        tx,
      },
    );
    event!(Level::DEBUG, subscription = id.0, table, scoped = filter.is_some(), "In-memory feed opened.");

    let events = stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|change| (change, rx)) }).boxed();
    Ok(Subscription { id, events })
  }

  async fn unsubscribe(&self, id: SubscriptionId) -> anyhow::Result<()> {
    self.counters.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
    self.subscribers.lock().remove(&id);
    Ok(())
  }
}
