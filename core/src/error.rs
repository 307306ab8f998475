// constructmate/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MateError {
  /// Raised locally before any gateway call is made.
  #[error("Validation failed for '{field}': {message}")]
  Validation { field: String, message: String },

  #[error("Caller {user_id} is not allowed to {action}")]
  Forbidden { user_id: Uuid, action: String },

  #[error("Order not found: {order_id}")]
  OrderNotFound { order_id: Uuid },

  #[error("Order query failed. Source: {source}")]
  QueryFailed {
    #[source]
    source: AnyhowError,
  },

  #[error("Update of order {order_id} failed. Source: {source}")]
  MutationFailed {
    order_id: Uuid,
    #[source]
    source: AnyhowError,
  },

  #[error("Receipt upload failed for '{path}'. Source: {source}")]
  UploadFailed {
    path: String,
    #[source]
    source: AnyhowError,
  },

  #[error("Change feed subscription failed. Source: {source}")]
  SubscriptionFailed {
    #[source]
    source: AnyhowError,
  },

  #[error("Configuration error for '{key}': {message}")]
  Configuration { key: String, message: String },

  #[error("Error in external operation. Source: {source}")]
  External {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal error: {0}")]
  Internal(String),
}

impl MateError {
  pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
    MateError::Validation {
      field: field.into(),
      message: message.into(),
    }
  }

  pub fn forbidden(user_id: Uuid, action: impl Into<String>) -> Self {
    MateError::Forbidden {
      user_id,
      action: action.into(),
    }
  }

  /// Short text suitable for a toast-style notification.
  pub fn user_message(&self) -> String {
    match self {
      MateError::Validation { message, .. } => message.clone(),
      MateError::Forbidden { .. } => "You do not have permission to do that.".to_string(),
      MateError::OrderNotFound { .. } => "The order no longer exists.".to_string(),
      MateError::QueryFailed { .. } => "Failed to load orders.".to_string(),
      MateError::MutationFailed { .. } => "Update failed.".to_string(),
      MateError::UploadFailed { .. } => "Receipt upload failed.".to_string(),
      MateError::SubscriptionFailed { .. } => "Live updates are unavailable.".to_string(),
      MateError::Configuration { .. } | MateError::External { .. } | MateError::Internal(_) => {
        "Something went wrong.".to_string()
      }
    }
  }
}

impl From<AnyhowError> for MateError {
  fn from(err: AnyhowError) -> Self {
    // An anyhow error that already wraps a MateError is unwrapped rather than nested.
    match err.downcast::<MateError>() {
      Ok(mate_err) => mate_err,
      Err(err) => MateError::External { source: err },
    }
  }
}

pub type MateResult<T, E = MateError> = std::result::Result<T, E>;
