// tests/realtime_sync_tests.rs
mod common;

use common::*;
use constructmate::{Backend, MateError, OrderBoard, OrderPatch, OrderStatus};
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
#[serial]
async fn external_update_refetches_with_new_row_state() -> anyhow::Result<()> {
  setup_tracing();
  let gateway = Arc::new(seeded_gateway());
  let board = OrderBoard::open(Backend::in_memory(gateway.clone()), admin(), &test_config()).await?;
  let mut views = board.listing().watch();
  assert_eq!(gateway.stats().query_calls, 1);

  // ORD-0031 is the newest, first row on page 1.
  let patch = OrderPatch {
    status: Some(OrderStatus::Delivered),
    ..OrderPatch::default()
  };
  gateway.apply_external_update(order_id(31), &patch)?;

  let view = wait_for_revision(&mut views, 2).await;
  assert!(!view.stale);
  let first = &view.page.expect("page applied").rows[0];
  assert_eq!(first.id, order_id(31));
  assert_eq!(first.status, OrderStatus::Delivered);

  settle().await;
  assert_eq!(gateway.stats().query_calls, 2);
  board.close().await;
  Ok(())
}

#[tokio::test(start_paused = true)]
#[serial]
async fn back_to_back_events_fold_into_one_refetch() -> anyhow::Result<()> {
  setup_tracing();
  let gateway = Arc::new(seeded_gateway());
  let board = OrderBoard::open(Backend::in_memory(gateway.clone()), admin(), &test_config()).await?;
  let mut views = board.listing().watch();

  let paid = OrderPatch {
    commission_paid: Some(true),
    ..OrderPatch::default()
  };
  gateway.apply_external_update(order_id(30), &paid)?;
  gateway.apply_external_update(order_id(29), &paid)?;
  gateway.delete_order(order_id(28)).expect("fixture row exists");

  let view = wait_for_revision(&mut views, 2).await;
  settle().await;

  assert_eq!(gateway.stats().query_calls, 2, "one initial fetch plus one refetch");
  let stats = board.sync().expect("sync active").stats();
  assert_eq!(stats.events_received, 3);
  assert_eq!(stats.refetches, 1);
  assert_eq!(view.page.expect("page applied").total_count, u64::from(FIXTURE_ORDERS) - 1);
  board.close().await;
  Ok(())
}

#[tokio::test(start_paused = true)]
#[serial]
async fn changes_during_a_slow_refetch_trigger_one_trailing_refetch() -> anyhow::Result<()> {
  setup_tracing();
  let gateway = Arc::new(seeded_gateway());
  let board = OrderBoard::open(Backend::in_memory(gateway.clone()), admin(), &test_config()).await?;
  let mut views = board.listing().watch();
  assert_eq!(gateway.stats().query_calls, 1);

  gateway.push_query_latency(Duration::from_millis(200));
  let paid = OrderPatch {
    commission_paid: Some(true),
    ..OrderPatch::default()
  };
  gateway.apply_external_update(order_id(30), &paid)?;
  tokio::time::sleep(Duration::from_millis(50)).await;
  assert_eq!(gateway.stats().query_calls, 2, "first refetch is in flight");

  gateway.apply_external_update(order_id(29), &paid)?;
  gateway.apply_external_update(order_id(28), &paid)?;
  let processing = OrderPatch {
    status: Some(OrderStatus::Processing),
    ..OrderPatch::default()
  };
  gateway.apply_external_update(order_id(31), &processing)?;

  let view = wait_for_revision(&mut views, 3).await;
  settle().await;

  assert_eq!(gateway.stats().query_calls, 3, "initial fetch, in-flight refetch, one trailing refetch");
  let stats = board.sync().expect("sync active").stats();
  assert_eq!(stats.events_received, 4);
  assert_eq!(stats.refetches, 2);
  assert_eq!(board.listing().view().revision, 3);
  let first = &view.page.expect("page applied").rows[0];
  assert_eq!(first.id, order_id(31));
  assert_eq!(first.status, OrderStatus::Processing);
  board.close().await;
  Ok(())
}

#[tokio::test(start_paused = true)]
#[serial]
async fn customer_subscription_ignores_other_customers_changes() -> anyhow::Result<()> {
  setup_tracing();
  let gateway = Arc::new(seeded_gateway());
  let board = OrderBoard::open(Backend::in_memory(gateway.clone()), customer_b(), &test_config()).await?;
  let mut views = board.listing().watch();

  // Order 30 belongs to customer A.
  let patch = OrderPatch {
    status: Some(OrderStatus::Cancelled),
    ..OrderPatch::default()
  };
  gateway.apply_external_update(order_id(30), &patch)?;
  settle().await;
  assert_eq!(gateway.stats().query_calls, 1);
  assert_eq!(board.sync().expect("sync active").stats().events_received, 0);

  // Order 31 belongs to customer B.
  gateway.apply_external_update(order_id(31), &patch)?;
  let view = wait_for_revision(&mut views, 2).await;
  assert!(view
    .page
    .expect("page applied")
    .rows
    .iter()
    .all(|o| o.user_id == CUSTOMER_B));
  assert_eq!(gateway.stats().query_calls, 2);
  board.close().await;
  Ok(())
}

#[tokio::test(start_paused = true)]
#[serial]
async fn refetch_uses_filters_active_at_event_time() -> anyhow::Result<()> {
  setup_tracing();
  let gateway = Arc::new(seeded_gateway());
  let board = OrderBoard::open(Backend::in_memory(gateway.clone()), admin(), &test_config()).await?;
  board.listing().set_status_filter(Some(OrderStatus::Completed)).await?;
  let mut views = board.listing().watch();
  let revision = board.listing().view().revision;

  let mut inserted = order(100, CUSTOMER_A, 250_000);
  inserted.status = OrderStatus::Completed;
  gateway.insert_order(inserted);

  let view = wait_for_revision(&mut views, revision + 1).await;
  let query = gateway.last_query().expect("refetch issued");
  assert_eq!(query.filter.status, Some(OrderStatus::Completed));
  let page = view.page.expect("page applied");
  assert_eq!(page.rows[0].id, order_id(100));
  assert!(page.rows.iter().all(|o| o.status == OrderStatus::Completed));
  board.close().await;
  Ok(())
}

#[tokio::test(start_paused = true)]
#[serial]
async fn closing_releases_subscription_and_stops_refetches() -> anyhow::Result<()> {
  setup_tracing();
  let gateway = Arc::new(seeded_gateway());
  let board = OrderBoard::open(Backend::in_memory(gateway.clone()), admin(), &test_config()).await?;
  assert_eq!(gateway.active_subscriptions(), 1);

  board.close().await;
  assert_eq!(gateway.active_subscriptions(), 0);
  assert_eq!(gateway.stats().unsubscribe_calls, 1);

  let patch = OrderPatch {
    paid_amount: Some(dec(1)),
    ..OrderPatch::default()
  };
  gateway.apply_external_update(order_id(5), &patch)?;
  settle().await;
  assert_eq!(gateway.stats().query_calls, 1);
  Ok(())
}

#[tokio::test(start_paused = true)]
#[serial]
async fn dropped_feed_reconnects_and_refetches() -> anyhow::Result<()> {
  setup_tracing();
  let gateway = Arc::new(seeded_gateway());
  let board = OrderBoard::open(Backend::in_memory(gateway.clone()), admin(), &test_config()).await?;
  let mut views = board.listing().watch();

  gateway.disconnect_feeds();
  let view = wait_for_revision(&mut views, 2).await;
  assert!(view.page.is_some());

  let sync = board.sync().expect("sync active");
  assert_eq!(sync.stats().reconnects, 1);
  assert_eq!(gateway.active_subscriptions(), 1);
  assert_eq!(gateway.stats().subscribe_calls, 2);

  // The fresh subscription delivers later changes.
  let patch = OrderPatch {
    status: Some(OrderStatus::Processing),
    ..OrderPatch::default()
  };
  gateway.apply_external_update(order_id(31), &patch)?;
  let view = wait_for_revision(&mut views, 3).await;
  assert_eq!(view.page.expect("page applied").rows[0].status, OrderStatus::Processing);
  board.close().await;
  Ok(())
}

#[tokio::test(start_paused = true)]
#[serial]
async fn reconnect_keeps_retrying_until_subscribe_succeeds() -> anyhow::Result<()> {
  setup_tracing();
  let gateway = Arc::new(seeded_gateway());
  let board = OrderBoard::open(Backend::in_memory(gateway.clone()), admin(), &test_config()).await?;
  let mut views = board.listing().watch();

  gateway.fail_subscribe(Some("realtime offline"));
  gateway.disconnect_feeds();
  // Three reconnect attempts at 100ms apart.
  tokio::time::sleep(std::time::Duration::from_millis(350)).await;
  assert_eq!(gateway.active_subscriptions(), 0);
  assert!(gateway.stats().subscribe_calls >= 3);

  gateway.fail_subscribe(None);
  wait_for_revision(&mut views, 2).await;
  assert_eq!(gateway.active_subscriptions(), 1);
  assert_eq!(board.sync().expect("sync active").stats().reconnects, 1);
  board.close().await;
  Ok(())
}

#[tokio::test(start_paused = true)]
#[serial]
async fn switching_caller_rescopes_listing_and_feed() -> anyhow::Result<()> {
  setup_tracing();
  let gateway = Arc::new(seeded_gateway());
  let mut board = OrderBoard::open(Backend::in_memory(gateway.clone()), admin(), &test_config()).await?;

  board.switch_caller(customer_a()).await?;
  assert_eq!(board.caller(), customer_a());
  assert_eq!(board.sync().expect("sync active").caller(), customer_a());
  assert_eq!(gateway.active_subscriptions(), 1);
  let page = board.listing().view().page.expect("page applied");
  assert_eq!(page.total_count, 24);
  assert!(page.rows.iter().all(|o| o.user_id == CUSTOMER_A));

  // Customer B's rows no longer reach this board.
  let queries = gateway.stats().query_calls;
  let patch = OrderPatch {
    status: Some(OrderStatus::Confirmed),
    ..OrderPatch::default()
  };
  gateway.apply_external_update(order_id(31), &patch)?;
  settle().await;
  assert_eq!(gateway.stats().query_calls, queries);
  board.close().await;
  Ok(())
}

#[tokio::test(start_paused = true)]
#[serial]
async fn failed_fetch_on_caller_switch_still_resubscribes() -> anyhow::Result<()> {
  setup_tracing();
  let gateway = Arc::new(seeded_gateway());
  let mut board = OrderBoard::open(Backend::in_memory(gateway.clone()), admin(), &test_config()).await?;
  let mut views = board.listing().watch();

  gateway.fail_queries(Some("connection reset"));
  let err = board
    .switch_caller(customer_a())
    .await
    .err()
    .expect("first fetch for the new caller fails");
  assert!(matches!(err, MateError::QueryFailed { .. }));
  assert_eq!(board.caller(), customer_a());
  assert_eq!(board.sync().expect("sync re-activated").caller(), customer_a());
  assert_eq!(gateway.active_subscriptions(), 1);
  let view = wait_for_revision(&mut views, 2).await;
  assert!(view.error.is_some());

  // The next change in the new scope recovers the listing.
  gateway.fail_queries(None);
  let patch = OrderPatch {
    status: Some(OrderStatus::Confirmed),
    ..OrderPatch::default()
  };
  gateway.apply_external_update(order_id(30), &patch)?;

  let view = wait_for_revision(&mut views, 3).await;
  assert!(view.error.is_none());
  let page = view.page.expect("page applied");
  assert_eq!(page.total_count, 24);
  assert!(page.rows.iter().all(|o| o.user_id == CUSTOMER_A));
  board.close().await;
  Ok(())
}

#[tokio::test(start_paused = true)]
#[serial]
async fn subscribe_failure_fails_open() {
  setup_tracing();
  let gateway = Arc::new(seeded_gateway());
  gateway.fail_subscribe(Some("realtime offline"));

  let err = OrderBoard::open(Backend::in_memory(gateway.clone()), admin(), &test_config())
    .await
    .err()
    .expect("open should fail");
  assert!(matches!(err, MateError::SubscriptionFailed { .. }));
  assert_eq!(err.user_message(), "Live updates are unavailable.");
}
