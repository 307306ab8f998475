// constructmate/src/models/profile.rs

use crate::error::{MateError, MateResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub id: Uuid,
  pub email: String,
  pub display_name: Option<String>,
  pub company_name: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl Profile {
  pub fn new(id: Uuid, email: &str, created_at: DateTime<Utc>) -> MateResult<Self> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
      return Err(MateError::validation("email", format!("'{}' is not an email address", email)));
    }
    Ok(Self {
      id,
      email: email.to_string(),
      display_name: None,
      company_name: None,
      created_at,
    })
  }

  pub fn with_names(mut self, display_name: Option<&str>, company_name: Option<&str>) -> Self {
    self.display_name = display_name.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
    self.company_name = company_name.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
    self
  }
}
