// constructmate/src/sync/mod.rs

//! Keeps a listing fresh by listening to the gateway's row-change feed.

pub mod realtime;

use crate::error::MateResult;
use async_trait::async_trait;

pub use realtime::{RealtimeSync, SyncOptions, SyncStats};

/// Whatever holds a cached query result that change events must refresh.
#[async_trait]
pub trait RefreshTarget: Send + Sync + 'static {
  /// Marks the cached result as out of date.
  fn invalidate(&self);

  /// Re-runs the query with the currently active parameters.
  async fn refetch(&self) -> MateResult<()>;
}
