// constructmate/src/workflow/orders.rs

//! Administrative order actions and customer payment submission.
//!
//! Each operation talks straight to the gateway: no local cache is updated,
//! the resulting change event refreshes any open listing. Writes are
//! last-writer-wins; a read followed by a write (status with commission
//! autofill, payment verification) is not atomic against concurrent edits.

use crate::access::{Caller, Owned};
use crate::config::MateConfig;
use crate::error::{MateError, MateResult};
use crate::gateway::{Backend, OrderGateway, ReceiptStore};
use crate::models::{Order, OrderPatch, OrderStatus};
use crate::workflow::commission;
use crate::workflow::receipts::{receipt_path, PaymentEvidence};
use crate::workflow::status::{self, Transition};
use anyhow::Context as AnyhowContext;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{event, instrument, Level};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
  pub order_id: Uuid,
  pub from: OrderStatus,
  pub to: OrderStatus,
  pub transition: Transition,
  /// Commission written as part of this change, when it was auto-filled.
  pub commission_filled: Option<Decimal>,
}

#[derive(Clone)]
pub struct OrderWorkflow {
  orders: Arc<dyn OrderGateway>,
  receipts: Arc<dyn ReceiptStore>,
  commission_rate: Decimal,
  receipt_bucket: String,
}

impl OrderWorkflow {
  pub fn new(backend: &Backend, config: &MateConfig) -> Self {
    Self {
      orders: backend.orders.clone(),
      receipts: backend.receipts.clone(),
      commission_rate: config.commission_rate,
      receipt_bucket: config.receipt_bucket.clone(),
    }
  }

  pub fn commission_rate(&self) -> Decimal {
    self.commission_rate
  }

  /// Sets `new_status`. Moving to `completed` also fills in the commission in
  /// the same write when none is set yet.
  #[instrument(
    name = "OrderWorkflow::update_status",
    skip_all,
    fields(user_id = %caller.user_id, order_id = %order_id, to = %new_status),
    err(Display)
  )]
  pub async fn update_status(&self, caller: &Caller, order_id: Uuid, new_status: OrderStatus) -> MateResult<StatusChange> {
    caller.require_admin("change order status")?;
    let order = self.load(order_id).await?;

    let transition = status::classify(order.status, new_status);
    if transition == Transition::Reopen {
      event!(Level::WARN, from = %order.status, "Reopening an order from a terminal status.");
    }

    let commission_filled = if new_status == OrderStatus::Completed {
      commission::autofill(&order, self.commission_rate)
    } else {
      None
    };
    let patch = OrderPatch {
      status: Some(new_status),
      commission: commission_filled,
      ..OrderPatch::default()
    };
    self.write(order_id, &patch).await?;

    event!(
      Level::INFO,
      from = %order.status,
      transition = ?transition,
      commission = ?commission_filled,
      "Order status updated."
    );
    Ok(StatusChange {
      order_id,
      from: order.status,
      to: new_status,
      transition,
      commission_filled,
    })
  }

  /// Full settle (`paid = total`) or full reject (`paid = 0`). Any partial
  /// amount recorded before is overwritten. Returns the new paid amount.
  #[instrument(
    name = "OrderWorkflow::verify_payment",
    skip_all,
    fields(user_id = %caller.user_id, order_id = %order_id, verified = verified),
    err(Display)
  )]
  pub async fn verify_payment(&self, caller: &Caller, order_id: Uuid, verified: bool) -> MateResult<Decimal> {
    caller.require_admin("verify payments")?;
    let order = self.load(order_id).await?;
    if !order.has_receipts() {
      event!(Level::WARN, "Verifying payment on an order without receipts.");
    }

    let paid_amount = if verified { order.total_amount } else { Decimal::ZERO };
    let patch = OrderPatch {
      paid_amount: Some(paid_amount),
      ..OrderPatch::default()
    };
    self.write(order_id, &patch).await?;
    event!(Level::INFO, %paid_amount, "Payment verification recorded.");
    Ok(paid_amount)
  }

  /// Records an explicit verified amount, keeping `0 <= amount <= total`.
  #[instrument(
    name = "OrderWorkflow::record_payment",
    skip_all,
    fields(user_id = %caller.user_id, order_id = %order_id, amount = %amount),
    err(Display)
  )]
  pub async fn record_payment(&self, caller: &Caller, order_id: Uuid, amount: Decimal) -> MateResult<Decimal> {
    caller.require_admin("record payments")?;
    if amount.is_sign_negative() {
      return Err(MateError::validation("amount", "paid amount cannot be negative"));
    }
    let order = self.load(order_id).await?;
    if amount > order.total_amount {
      return Err(MateError::validation(
        "amount",
        format!("paid amount {} exceeds order total {}", amount, order.total_amount),
      ));
    }
    let patch = OrderPatch {
      paid_amount: Some(amount),
      ..OrderPatch::default()
    };
    self.write(order_id, &patch).await?;
    Ok(amount)
  }

  /// Sets `commission_paid = true`. Idempotent. Does not re-check that a
  /// positive commission exists; gate with `commission::commission_payable`.
  #[instrument(
    name = "OrderWorkflow::mark_commission_paid",
    skip_all,
    fields(user_id = %caller.user_id, order_id = %order_id),
    err(Display)
  )]
  pub async fn mark_commission_paid(&self, caller: &Caller, order_id: Uuid) -> MateResult<()> {
    caller.require_admin("mark commissions paid")?;
    let patch = OrderPatch {
      commission_paid: Some(true),
      ..OrderPatch::default()
    };
    self.write(order_id, &patch).await?;
    event!(Level::INFO, "Commission marked paid.");
    Ok(())
  }

  /// Uploads every receipt, then writes receipt urls, reference and date in
  /// one update. Validation failures never reach the gateway. The first failed
  /// upload aborts the submission; receipts already stored stay orphaned.
  /// Returns the public receipt urls.
  #[instrument(
    name = "OrderWorkflow::submit_payment_evidence",
    skip_all,
    fields(user_id = %caller.user_id, order_id = %order_id, files = evidence.files.len()),
    err(Display)
  )]
  pub async fn submit_payment_evidence(
    &self,
    caller: &Caller,
    order_id: Uuid,
    evidence: PaymentEvidence,
  ) -> MateResult<Vec<String>> {
    let evidence = evidence.validate()?;

    let order = self.load(order_id).await?;
    if !order.visible_to(caller) {
      return Err(MateError::forbidden(caller.user_id, "submit payment for another customer's order"));
    }

    let submitted_at = Utc::now();
    let mut urls = Vec::with_capacity(evidence.files.len());
    for (index, file) in evidence.files.into_iter().enumerate() {
      let path = receipt_path(order_id, submitted_at, index, &file.file_name);
      let stored = self
        .receipts
        .upload_file(&self.receipt_bucket, &path, file.bytes)
        .await
        .map_err(|source| {
          event!(Level::ERROR, path = %path, error = %source, "Receipt upload failed; aborting submission.");
          MateError::UploadFailed {
            path: path.clone(),
            source,
          }
        })?;
      urls.push(self.receipts.public_url(&self.receipt_bucket, &stored));
    }

    let patch = OrderPatch {
      receipt_urls: Some(urls.clone()),
      payment_reference: Some(evidence.reference),
      payment_date: Some(evidence.date),
      ..OrderPatch::default()
    };
    self.write(order_id, &patch).await?;
    event!(Level::INFO, receipts = urls.len(), "Payment evidence submitted.");
    Ok(urls)
  }

  async fn load(&self, order_id: Uuid) -> MateResult<Order> {
    let found = self
      .orders
      .fetch_order(order_id)
      .await
      .context("loading order before update")
      .map_err(|source| MateError::MutationFailed { order_id, source })?;
    found.ok_or(MateError::OrderNotFound { order_id })
  }

  async fn write(&self, order_id: Uuid, patch: &OrderPatch) -> MateResult<()> {
    self
      .orders
      .update_order(order_id, patch)
      .await
      .map_err(|source| MateError::MutationFailed { order_id, source })
  }
}
