// constructmate/src/access.rs

//! Caller identity and role, passed explicitly to every component instead of
//! being read from ambient session state.

use crate::error::{MateError, MateResult};
use crate::models::profile::Profile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  User,
}

impl Role {
  /// A user holds at most one admin assignment; no assignment means `User`.
  pub fn resolve(assignment: Option<&RoleAssignment>) -> Role {
    assignment.map(|a| a.role).unwrap_or(Role::User)
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Role::Admin => f.write_str("admin"),
      Role::User => f.write_str("user"),
    }
  }
}

impl FromStr for Role {
  type Err = MateError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "admin" => Ok(Role::Admin),
      "user" => Ok(Role::User),
      other => Err(MateError::validation("role", format!("unknown role '{}'", other))),
    }
  }
}

/// Stored separately from the profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
  pub user_id: Uuid,
  pub role: Role,
}

/// The authenticated identity on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Caller {
  pub user_id: Uuid,
  pub role: Role,
}

impl Caller {
  pub fn new(user_id: Uuid, role: Role) -> Self {
    Self { user_id, role }
  }

  pub fn admin(user_id: Uuid) -> Self {
    Self::new(user_id, Role::Admin)
  }

  pub fn customer(user_id: Uuid) -> Self {
    Self::new(user_id, Role::User)
  }

  pub fn for_profile(profile: &Profile, assignment: Option<&RoleAssignment>) -> Self {
    let assignment = assignment.filter(|a| a.user_id == profile.id);
    Self::new(profile.id, Role::resolve(assignment))
  }

  /// Admins are exempt from per-row ownership scoping.
  pub fn is_privileged(&self) -> bool {
    self.role == Role::Admin
  }

  pub fn require_admin(&self, action: &str) -> MateResult<()> {
    if self.is_privileged() {
      Ok(())
    } else {
      tracing::warn!(user_id = %self.user_id, action, "Rejected administrator-only action.");
      Err(MateError::forbidden(self.user_id, action))
    }
  }

  /// Ownership filter to apply to queries and subscriptions; `None` for admins.
  pub fn owner_scope(&self) -> Option<Uuid> {
    if self.is_privileged() {
      None
    } else {
      Some(self.user_id)
    }
  }
}

/// Rows that belong to exactly one user.
pub trait Owned {
  fn owner(&self) -> Uuid;

  fn visible_to(&self, caller: &Caller) -> bool {
    caller.is_privileged() || self.owner() == caller.user_id
  }
}
