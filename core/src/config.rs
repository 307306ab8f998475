// constructmate/src/config.rs

//! Runtime settings shared by the listing, the realtime layer and the order workflow.

use crate::error::{MateError, MateResult};
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_RECEIPT_BUCKET: &str = "payment-receipts";
pub const DEFAULT_ORDERS_TABLE: &str = "orders";
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// 10% flat commission rate.
pub fn default_commission_rate() -> Decimal {
  Decimal::new(10, 2)
}

#[derive(Debug, Clone)]
pub struct MateConfig {
  pub page_size: u32,
  pub search_debounce: Duration,
  pub commission_rate: Decimal,
  pub receipt_bucket: String,
  pub orders_table: String,
  pub reconnect_delay: Duration,
}

impl Default for MateConfig {
  fn default() -> Self {
    Self {
      page_size: DEFAULT_PAGE_SIZE,
      search_debounce: DEFAULT_SEARCH_DEBOUNCE,
      commission_rate: default_commission_rate(),
      receipt_bucket: DEFAULT_RECEIPT_BUCKET.to_string(),
      orders_table: DEFAULT_ORDERS_TABLE.to_string(),
      reconnect_delay: DEFAULT_RECONNECT_DELAY,
    }
  }
}

impl MateConfig {
  /// Loads `.env` if present, then overrides the defaults with any `CONSTRUCTMATE_*`
  /// variables that are set.
  pub fn from_env() -> MateResult<Self> {
    dotenvy::dotenv().ok();
    Self::from_lookup(|key| env::var(key).ok())
  }

  /// Same as [`MateConfig::from_env`] but reads values through `lookup`.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> MateResult<Self> {
    let defaults = Self::default();

    let page_size = parse_or("CONSTRUCTMATE_PAGE_SIZE", &lookup, defaults.page_size)?;
    if page_size == 0 {
      return Err(config_error("CONSTRUCTMATE_PAGE_SIZE", "page size must be at least 1"));
    }

    let debounce_ms = parse_or(
      "CONSTRUCTMATE_SEARCH_DEBOUNCE_MS",
      &lookup,
      defaults.search_debounce.as_millis() as u64,
    )?;
    let reconnect_ms = parse_or(
      "CONSTRUCTMATE_RECONNECT_DELAY_MS",
      &lookup,
      defaults.reconnect_delay.as_millis() as u64,
    )?;

    let commission_rate = parse_or("CONSTRUCTMATE_COMMISSION_RATE", &lookup, defaults.commission_rate)?;
    if commission_rate.is_sign_negative() || commission_rate > Decimal::ONE {
      return Err(config_error(
        "CONSTRUCTMATE_COMMISSION_RATE",
        "commission rate must be between 0 and 1",
      ));
    }

    let receipt_bucket = lookup("CONSTRUCTMATE_RECEIPT_BUCKET").unwrap_or(defaults.receipt_bucket);
    let orders_table = lookup("CONSTRUCTMATE_ORDERS_TABLE").unwrap_or(defaults.orders_table);

    let config = Self {
      page_size,
      search_debounce: Duration::from_millis(debounce_ms),
      commission_rate,
      receipt_bucket,
      orders_table,
      reconnect_delay: Duration::from_millis(reconnect_ms),
    };
    tracing::debug!(config = ?config, "ConstructMate configuration loaded.");
    Ok(config)
  }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> MateResult<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match lookup(key) {
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| config_error(key, format!("invalid value '{}': {}", raw, e))),
    None => Ok(default),
  }
}

fn config_error(key: &str, message: impl Into<String>) -> MateError {
  MateError::Configuration {
    key: key.to_string(),
    message: message.into(),
  }
}
