// tests/common/mod.rs
#![allow(dead_code)] // Not every test file uses every helper

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use constructmate::{Caller, InMemoryGateway, ListingView, MateConfig, Order, OrderStatus};
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::sync::watch;
use tracing::Level;
use uuid::Uuid;

pub const CUSTOMER_A: Uuid = Uuid::from_u128(0xA0A0_0000_0000_0000_0000_0000_0000_000A);
pub const CUSTOMER_B: Uuid = Uuid::from_u128(0xB0B0_0000_0000_0000_0000_0000_0000_000B);
pub const ADMIN: Uuid = Uuid::from_u128(0xADAD_0000_0000_0000_0000_0000_0000_00AD);

pub const PROJECTS: [&str; 4] = [
  "Bridge Retrofit",
  "Harbor Warehouse",
  "School Annex, Phase \"B\"",
  "Solar Canopy",
];

pub const FIXTURE_ORDERS: u32 = 32;

pub fn admin() -> Caller {
  Caller::admin(ADMIN)
}

pub fn customer_a() -> Caller {
  Caller::customer(CUSTOMER_A)
}

pub fn customer_b() -> Caller {
  Caller::customer(CUSTOMER_B)
}

pub fn base_time() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap()
}

pub fn dec(value: i64) -> Decimal {
  Decimal::from(value)
}

pub fn order_id(n: u32) -> Uuid {
  Uuid::from_u128(0x0D0D_0000_0000_0000_0000_0000_0000_0000 + u128::from(n))
}

/// A bare pending order for `user` with nothing paid.
pub fn order(n: u32, user: Uuid, total: i64) -> Order {
  let created = base_time() + ChronoDuration::minutes(i64::from(n));
  Order {
    id: order_id(n),
    order_number: format!("ORD-{:04}", n),
    project_name: PROJECTS[(n as usize) % PROJECTS.len()].to_string(),
    total_amount: dec(total),
    paid_amount: Decimal::ZERO,
    commission: None,
    commission_paid: false,
    status: OrderStatus::Pending,
    receipt_urls: Vec::new(),
    payment_reference: None,
    payment_date: None,
    user_id: user,
    inquiry_id: None,
    created_at: created,
    updated_at: created,
  }
}

/// Owner of fixture order `n`: every fourth belongs to customer B.
pub fn fixture_owner(n: u32) -> Uuid {
  if n % 4 == 3 {
    CUSTOMER_B
  } else {
    CUSTOMER_A
  }
}

/// Order `n` of the shared fixture set: rotating status, and a paid amount
/// of nothing, half or all of the total.
pub fn fixture_order(n: u32) -> Order {
  let mut o = order(n, fixture_owner(n), 100_000 + i64::from(n) * 1_000);
  o.status = OrderStatus::ALL[(n as usize) % OrderStatus::ALL.len()];
  o.paid_amount = match n % 3 {
    0 => Decimal::ZERO,
    1 => o.total_amount / dec(2),
    _ => o.total_amount,
  };
  o
}

pub fn fixture_orders() -> Vec<Order> {
  (0..FIXTURE_ORDERS).map(fixture_order).collect()
}

pub fn seeded_gateway() -> InMemoryGateway {
  let gateway = InMemoryGateway::new();
  gateway.seed(fixture_orders());
  gateway
}

pub fn test_config() -> MateConfig {
  MateConfig {
    reconnect_delay: Duration::from_millis(100),
    ..MateConfig::default()
  }
}

/// Waits until the listing has applied at least `target` results.
pub async fn wait_for_revision(rx: &mut watch::Receiver<ListingView>, target: u64) -> ListingView {
  tokio::time::timeout(Duration::from_secs(5), async {
    loop {
      {
        let view = rx.borrow_and_update();
        if view.revision >= target {
          return view.clone();
        }
      }
      rx.changed().await.expect("listing dropped");
    }
  })
  .await
  .expect("timed out waiting for listing revision")
}

/// Lets background tasks run to quiescence.
pub async fn settle() {
  tokio::time::sleep(Duration::from_millis(50)).await;
}

/// Minimal reader for the quoted CSV the exporter writes.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
  let mut records = Vec::new();
  let mut record = Vec::new();
  let mut field = String::new();
  let mut in_quotes = false;
  let mut chars = text.chars().peekable();

  while let Some(c) = chars.next() {
    match (c, in_quotes) {
      ('"', true) if chars.peek() == Some(&'"') => {
        field.push('"');
        chars.next();
      }
      ('"', true) => in_quotes = false,
      ('"', false) => in_quotes = true,
      (',', false) => record.push(std::mem::take(&mut field)),
      ('\n', false) => {
        record.push(std::mem::take(&mut field));
        records.push(std::mem::take(&mut record));
      }
      (other, _) => field.push(other),
    }
  }
  record.push(field);
  records.push(record);
  records
}

// --- Helper for Tracing Setup ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
