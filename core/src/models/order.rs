// constructmate/src/models/order.rs

use crate::access::Owned;
use crate::error::{MateError, MateResult};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Order lifecycle. `Completed` and `Cancelled` are terminal, but administrators
/// may still set any status from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Processing,
  Delivered,
  Completed,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 6] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Processing,
    OrderStatus::Delivered,
    OrderStatus::Completed,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Processing => "processing",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Completed => "completed",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = MateError;

  /// Case-insensitive; stored rows use both `pending` and `Pending`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim().to_ascii_lowercase();
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == wanted)
      .ok_or_else(|| MateError::validation("status", format!("unknown order status '{}'", s.trim())))
  }
}

/// Payment state derived from `paid_amount` against `total_amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
  Unpaid,
  PartiallyPaid,
  Paid,
}

impl PaymentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Unpaid => "unpaid",
      PaymentStatus::PartiallyPaid => "partially_paid",
      PaymentStatus::Paid => "paid",
    }
  }

  /// Filter predicate. These overlap for a zero-total order, which is both
  /// `unpaid` and `paid`.
  pub fn admits(&self, paid_amount: Decimal, total_amount: Decimal) -> bool {
    match self {
      PaymentStatus::Unpaid => paid_amount.is_zero(),
      PaymentStatus::PartiallyPaid => paid_amount > Decimal::ZERO && paid_amount < total_amount,
      PaymentStatus::Paid => paid_amount >= total_amount,
    }
  }

  /// Single label for display; `Unpaid` wins when the predicates overlap.
  pub fn classify(paid_amount: Decimal, total_amount: Decimal) -> PaymentStatus {
    if paid_amount.is_zero() {
      PaymentStatus::Unpaid
    } else if paid_amount < total_amount {
      PaymentStatus::PartiallyPaid
    } else {
      PaymentStatus::Paid
    }
  }
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}

impl FromStr for PaymentStatus {
  type Err = MateError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "unpaid" => Ok(PaymentStatus::Unpaid),
      "partially_paid" => Ok(PaymentStatus::PartiallyPaid),
      "paid" => Ok(PaymentStatus::Paid),
      other => Err(MateError::validation(
        "payment_status",
        format!("unknown payment status '{}'", other),
      )),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub order_number: String,
  pub project_name: String,
  pub total_amount: Decimal,
  pub paid_amount: Decimal,
  pub commission: Option<Decimal>,
  pub commission_paid: bool,
  pub status: OrderStatus,
  pub receipt_urls: Vec<String>,
  pub payment_reference: Option<String>,
  pub payment_date: Option<NaiveDate>,
  pub user_id: Uuid,
  pub inquiry_id: Option<Uuid>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  pub fn payment_status(&self) -> PaymentStatus {
    PaymentStatus::classify(self.paid_amount, self.total_amount)
  }

  pub fn outstanding_amount(&self) -> Decimal {
    (self.total_amount - self.paid_amount).max(Decimal::ZERO)
  }

  pub fn has_receipts(&self) -> bool {
    !self.receipt_urls.is_empty()
  }
}

impl Owned for Order {
  fn owner(&self) -> Uuid {
    self.user_id
  }
}

/// Input for placing an order. Validated before it becomes an [`Order`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
  pub order_number: String,
  pub project_name: String,
  pub total_amount: Decimal,
  pub user_id: Uuid,
  pub inquiry_id: Option<Uuid>,
}

impl NewOrder {
  pub fn validate(&self) -> MateResult<()> {
    if self.order_number.trim().is_empty() {
      return Err(MateError::validation("order_number", "order number is required"));
    }
    if self.project_name.trim().is_empty() {
      return Err(MateError::validation("project_name", "project name is required"));
    }
    if self.total_amount.is_sign_negative() {
      return Err(MateError::validation("total_amount", "total amount cannot be negative"));
    }
    Ok(())
  }

  /// A freshly placed order: pending, nothing paid, no commission yet.
  pub fn into_order(self, id: Uuid, now: DateTime<Utc>) -> MateResult<Order> {
    self.validate()?;
    Ok(Order {
      id,
      order_number: self.order_number.trim().to_string(),
      project_name: self.project_name.trim().to_string(),
      total_amount: self.total_amount,
      paid_amount: Decimal::ZERO,
      commission: None,
      commission_paid: false,
      status: OrderStatus::Pending,
      receipt_urls: Vec::new(),
      payment_reference: None,
      payment_date: None,
      user_id: self.user_id,
      inquiry_id: self.inquiry_id,
      created_at: now,
      updated_at: now,
    })
  }
}

/// Partial update sent to the gateway. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<OrderStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub paid_amount: Option<Decimal>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub commission: Option<Decimal>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub commission_paid: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub receipt_urls: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub payment_reference: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub payment_date: Option<NaiveDate>,
}

impl OrderPatch {
  pub fn is_empty(&self) -> bool {
    *self == OrderPatch::default()
  }

  /// Applies the set fields and stamps `updated_at`.
  pub fn apply_to(&self, order: &mut Order, now: DateTime<Utc>) {
    if let Some(status) = self.status {
      order.status = status;
    }
    if let Some(paid) = self.paid_amount {
      order.paid_amount = paid;
    }
    if let Some(commission) = self.commission {
      order.commission = Some(commission);
    }
    if let Some(commission_paid) = self.commission_paid {
      order.commission_paid = commission_paid;
    }
    if let Some(urls) = &self.receipt_urls {
      order.receipt_urls = urls.clone();
    }
    if let Some(reference) = &self.payment_reference {
      order.payment_reference = Some(reference.clone());
    }
    if let Some(date) = self.payment_date {
      order.payment_date = Some(date);
    }
    order.updated_at = now;
  }
}
