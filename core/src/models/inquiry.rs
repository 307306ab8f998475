// constructmate/src/models/inquiry.rs

use crate::access::Owned;
use crate::error::{MateError, MateResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InquiryStatus {
  Pending,
  Quoted,
  Accepted,
  Rejected,
}

impl InquiryStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      InquiryStatus::Pending => "Pending",
      InquiryStatus::Quoted => "Quoted",
      InquiryStatus::Accepted => "Accepted",
      InquiryStatus::Rejected => "Rejected",
    }
  }

  /// Only an accepted inquiry may be promoted into an order.
  pub fn is_promotable(&self) -> bool {
    *self == InquiryStatus::Accepted
  }
}

impl fmt::Display for InquiryStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}

impl FromStr for InquiryStatus {
  type Err = MateError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pending" => Ok(InquiryStatus::Pending),
      "quoted" => Ok(InquiryStatus::Quoted),
      "accepted" => Ok(InquiryStatus::Accepted),
      "rejected" => Ok(InquiryStatus::Rejected),
      other => Err(MateError::validation(
        "status",
        format!("unknown inquiry status '{}'", other),
      )),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inquiry {
  pub id: Uuid,
  pub inquiry_number: String,
  pub project_name: String,
  pub status: InquiryStatus,
  pub total_amount: Option<Decimal>,
  pub commission: Option<Decimal>,
  pub user_id: Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Owned for Inquiry {
  fn owner(&self) -> Uuid {
    self.user_id
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInquiry {
  pub inquiry_number: String,
  pub project_name: String,
  pub user_id: Uuid,
}

impl NewInquiry {
  pub fn into_inquiry(self, id: Uuid, now: DateTime<Utc>) -> MateResult<Inquiry> {
    if self.inquiry_number.trim().is_empty() {
      return Err(MateError::validation("inquiry_number", "inquiry number is required"));
    }
    if self.project_name.trim().is_empty() {
      return Err(MateError::validation("project_name", "project name is required"));
    }
    Ok(Inquiry {
      id,
      inquiry_number: self.inquiry_number.trim().to_string(),
      project_name: self.project_name.trim().to_string(),
      status: InquiryStatus::Pending,
      total_amount: None,
      commission: None,
      user_id: self.user_id,
      created_at: now,
      updated_at: now,
    })
  }
}
