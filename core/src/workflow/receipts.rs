// constructmate/src/workflow/receipts.rs

//! Payment evidence input, its local validation, and receipt storage paths.

use crate::error::{MateError, MateResult};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

const MAX_FILE_NAME_LEN: usize = 96;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptFile {
  pub file_name: String,
  pub bytes: Vec<u8>,
}

impl ReceiptFile {
  pub fn new(file_name: &str, bytes: impl Into<Vec<u8>>) -> Self {
    Self {
      file_name: file_name.to_string(),
      bytes: bytes.into(),
    }
  }
}

/// What a customer (or admin on their behalf) submits as proof of payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvidence {
  pub files: Vec<ReceiptFile>,
  pub reference: String,
  /// `YYYY-MM-DD`.
  pub date: String,
}

/// Evidence that passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEvidence {
  pub files: Vec<ReceiptFile>,
  pub reference: String,
  pub date: NaiveDate,
}

impl PaymentEvidence {
  /// Requires at least one file, a reference and a date. Runs before any
  /// gateway call.
  pub fn validate(self) -> MateResult<ValidatedEvidence> {
    if self.files.is_empty() {
      return Err(MateError::validation("files", "attach at least one receipt"));
    }
    if let Some(empty) = self.files.iter().find(|f| f.file_name.trim().is_empty()) {
      return Err(MateError::validation(
        "files",
        format!("receipt of {} bytes has no file name", empty.bytes.len()),
      ));
    }
    let reference = self.reference.trim();
    if reference.is_empty() {
      return Err(MateError::validation("reference", "payment reference is required"));
    }
    let date = self.date.trim();
    if date.is_empty() {
      return Err(MateError::validation("date", "payment date is required"));
    }
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
      .map_err(|e| MateError::validation("date", format!("'{}' is not a date: {}", date, e)))?;

    Ok(ValidatedEvidence {
      files: self.files,
      reference: reference.to_string(),
      date,
    })
  }
}

/// Keeps ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
  let cleaned: String = name
    .trim()
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
    .collect();
  let cleaned = cleaned.trim_start_matches('.');
  let cleaned = if cleaned.is_empty() { "receipt" } else { cleaned };
  cleaned.chars().take(MAX_FILE_NAME_LEN).collect()
}

/// `<order id>/<unix millis>-<index>-<sanitized name>`; the index keeps files
/// of one submission apart even when their names collide.
pub fn receipt_path(order_id: Uuid, at: DateTime<Utc>, index: usize, file_name: &str) -> String {
  format!(
    "{}/{}-{}-{}",
    order_id,
    at.timestamp_millis(),
    index,
    sanitize_file_name(file_name)
  )
}
