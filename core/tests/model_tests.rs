// tests/model_tests.rs
mod common;

use common::*;
use constructmate::models::NewInquiry;
use constructmate::workflow::receipts::{receipt_path, sanitize_file_name};
use constructmate::workflow::status::{classify, next_in_lifecycle, Transition};
use constructmate::{
  Caller, InquiryStatus, MateConfig, MateError, NewOrder, Order, OrderPatch, OrderStatus, Owned, PaymentStatus, Role,
  RoleAssignment,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

#[test]
fn order_status_parses_case_insensitively() {
  assert_eq!(OrderStatus::from_str("pending").unwrap(), OrderStatus::Pending);
  assert_eq!(OrderStatus::from_str("Pending").unwrap(), OrderStatus::Pending);
  assert_eq!(OrderStatus::from_str(" COMPLETED ").unwrap(), OrderStatus::Completed);
  assert!(matches!(
    OrderStatus::from_str("shipped"),
    Err(MateError::Validation { .. })
  ));
  for status in OrderStatus::ALL {
    assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
  }
}

#[test]
fn order_status_serializes_lowercase() {
  let json = serde_json::to_string(&OrderStatus::Delivered).unwrap();
  assert_eq!(json, "\"delivered\"");
  let back: PaymentStatus = serde_json::from_str("\"partially_paid\"").unwrap();
  assert_eq!(back, PaymentStatus::PartiallyPaid);
}

#[test]
fn payment_status_label_prefers_unpaid_for_zero_totals() {
  assert_eq!(PaymentStatus::classify(Decimal::ZERO, Decimal::ZERO), PaymentStatus::Unpaid);
  assert_eq!(PaymentStatus::classify(dec(10), dec(100)), PaymentStatus::PartiallyPaid);
  assert_eq!(PaymentStatus::classify(dec(100), dec(100)), PaymentStatus::Paid);
  assert!(PaymentStatus::Paid.admits(Decimal::ZERO, Decimal::ZERO));
  assert!(PaymentStatus::Unpaid.admits(Decimal::ZERO, Decimal::ZERO));
}

#[test]
fn new_order_is_validated_before_creation() {
  let input = NewOrder {
    order_number: " ORD-7001 ".to_string(),
    project_name: "Depot Roof".to_string(),
    total_amount: dec(42_000),
    user_id: CUSTOMER_A,
    inquiry_id: None,
  };
  let order = input.clone().into_order(order_id(7001), base_time()).unwrap();
  assert_eq!(order.order_number, "ORD-7001");
  assert_eq!(order.status, OrderStatus::Pending);
  assert_eq!(order.paid_amount, Decimal::ZERO);
  assert_eq!(order.commission, None);
  assert_eq!(order.payment_status(), PaymentStatus::Unpaid);

  let blank = NewOrder {
    project_name: "  ".to_string(),
    ..input.clone()
  };
  assert!(matches!(
    blank.into_order(order_id(1), base_time()),
    Err(MateError::Validation { ref field, .. }) if field == "project_name"
  ));

  let negative = NewOrder {
    total_amount: dec(-5),
    ..input
  };
  assert!(negative.validate().is_err());
}

#[test]
fn inquiry_starts_pending_and_only_accepted_promotes() {
  let inquiry = NewInquiry {
    inquiry_number: "INQ-1".to_string(),
    project_name: "Canal Lock".to_string(),
    user_id: CUSTOMER_B,
  }
  .into_inquiry(Uuid::nil(), base_time())
  .unwrap();
  assert_eq!(inquiry.status, InquiryStatus::Pending);
  assert!(inquiry.visible_to(&customer_b()));
  assert!(!inquiry.visible_to(&customer_a()));
  assert!(inquiry.visible_to(&admin()));

  assert!(InquiryStatus::from_str("accepted").unwrap().is_promotable());
  assert!(!InquiryStatus::Quoted.is_promotable());
}

#[test]
fn patch_touches_only_set_fields() {
  let mut order: Order = order(1, CUSTOMER_A, 1_000);
  let before = order.clone();
  let patch = OrderPatch {
    paid_amount: Some(dec(400)),
    ..OrderPatch::default()
  };
  assert!(!patch.is_empty());
  assert!(OrderPatch::default().is_empty());

  let later = base_time() + chrono::Duration::hours(2);
  patch.apply_to(&mut order, later);
  assert_eq!(order.paid_amount, dec(400));
  assert_eq!(order.status, before.status);
  assert_eq!(order.commission, before.commission);
  assert_eq!(order.updated_at, later);
  assert_eq!(order.outstanding_amount(), dec(600));

  let json = serde_json::to_value(&patch).unwrap();
  assert_eq!(json.as_object().map(|o| o.len()), Some(1));
}

#[test]
fn roles_resolve_from_assignments() {
  assert_eq!(Role::resolve(None), Role::User);
  let assignment = RoleAssignment {
    user_id: ADMIN,
    role: Role::Admin,
  };
  assert_eq!(Role::resolve(Some(&assignment)), Role::Admin);
  assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);

  let caller = Caller::new(ADMIN, Role::Admin);
  assert!(caller.is_privileged());
  assert_eq!(caller.owner_scope(), None);
  assert_eq!(customer_a().owner_scope(), Some(CUSTOMER_A));
  assert!(matches!(
    customer_a().require_admin("delete users"),
    Err(MateError::Forbidden { .. })
  ));
}

#[test]
fn status_moves_are_classified_but_never_blocked() {
  assert_eq!(classify(OrderStatus::Pending, OrderStatus::Pending), Transition::Unchanged);
  assert_eq!(classify(OrderStatus::Pending, OrderStatus::Delivered), Transition::Forward);
  assert_eq!(classify(OrderStatus::Delivered, OrderStatus::Confirmed), Transition::Backward);
  assert_eq!(classify(OrderStatus::Processing, OrderStatus::Cancelled), Transition::Cancel);
  assert_eq!(classify(OrderStatus::Completed, OrderStatus::Processing), Transition::Reopen);
  assert_eq!(classify(OrderStatus::Cancelled, OrderStatus::Completed), Transition::Reopen);

  assert_eq!(next_in_lifecycle(OrderStatus::Delivered), Some(OrderStatus::Completed));
  assert_eq!(next_in_lifecycle(OrderStatus::Cancelled), None);
}

#[test]
fn receipt_paths_are_safe_and_unique_per_file() {
  assert_eq!(sanitize_file_name("bank slip (1).pdf"), "bank_slip__1_.pdf");
  assert_eq!(sanitize_file_name("../../etc/passwd"), "_.._etc_passwd");
  assert_eq!(sanitize_file_name("..."), "receipt");
  assert_eq!(sanitize_file_name(&"a".repeat(200)).len(), 96);

  let first = receipt_path(order_id(1), base_time(), 0, "slip.pdf");
  let second = receipt_path(order_id(1), base_time(), 1, "slip.pdf");
  assert!(first.starts_with(&format!("{}/", order_id(1))));
  assert_ne!(first, second);
}

#[test]
fn config_defaults_and_overrides() {
  let defaults = MateConfig::from_lookup(|_| None).unwrap();
  assert_eq!(defaults.page_size, 10);
  assert_eq!(defaults.search_debounce, Duration::from_millis(500));
  assert_eq!(defaults.commission_rate, Decimal::from_str("0.10").unwrap());
  assert_eq!(defaults.receipt_bucket, "payment-receipts");
  assert_eq!(defaults.orders_table, "orders");

  let vars: HashMap<&str, &str> = HashMap::from([
    ("CONSTRUCTMATE_PAGE_SIZE", "25"),
    ("CONSTRUCTMATE_COMMISSION_RATE", "0.125"),
    ("CONSTRUCTMATE_RECEIPT_BUCKET", "receipts-staging"),
  ]);
  let config = MateConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
  assert_eq!(config.page_size, 25);
  assert_eq!(config.commission_rate, Decimal::from_str("0.125").unwrap());
  assert_eq!(config.receipt_bucket, "receipts-staging");
  assert_eq!(config.search_debounce, Duration::from_millis(500));
}

#[test]
fn invalid_config_values_are_rejected() {
  let zero_page = MateConfig::from_lookup(|key| (key == "CONSTRUCTMATE_PAGE_SIZE").then(|| "0".to_string()));
  assert!(matches!(zero_page, Err(MateError::Configuration { ref key, .. }) if key == "CONSTRUCTMATE_PAGE_SIZE"));

  let bad_rate = MateConfig::from_lookup(|key| (key == "CONSTRUCTMATE_COMMISSION_RATE").then(|| "1.5".to_string()));
  assert!(matches!(bad_rate, Err(MateError::Configuration { .. })));

  let garbage = MateConfig::from_lookup(|key| (key == "CONSTRUCTMATE_SEARCH_DEBOUNCE_MS").then(|| "soon".to_string()));
  assert!(matches!(garbage, Err(MateError::Configuration { .. })));
}

#[test]
fn anyhow_wrapped_errors_unwrap_to_their_variant() {
  let original = MateError::validation("page", "page numbers start at 1");
  let wrapped = anyhow::Error::new(original);
  assert!(matches!(MateError::from(wrapped), MateError::Validation { .. }));

  let foreign = anyhow::anyhow!("socket closed");
  assert!(matches!(MateError::from(foreign), MateError::External { .. }));
}
