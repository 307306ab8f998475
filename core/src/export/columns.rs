// constructmate/src/export/columns.rs

//! Column sets of the admin order and user tables.

use crate::access::{Role, RoleAssignment};
use crate::export::csv::Column;
use crate::models::{Order, Profile};

pub fn order_columns() -> Vec<Column<Order>> {
  vec![
    Column::display_only("Select"),
    Column::new("Order Number", |o: &Order| Some(o.order_number.clone())),
    Column::new("Project", |o: &Order| Some(o.project_name.clone())),
    Column::new("Status", |o: &Order| Some(o.status.to_string())),
    Column::new("Total Amount", |o: &Order| Some(o.total_amount.to_string())),
    Column::new("Paid Amount", |o: &Order| Some(o.paid_amount.to_string())),
    Column::new("Payment Status", |o: &Order| Some(o.payment_status().to_string())),
    Column::new("Commission", |o: &Order| o.commission.map(|c| c.to_string())),
    Column::new("Commission Paid", |o: &Order| {
      Some(if o.commission_paid { "yes" } else { "no" }.to_string())
    }),
    Column::new("Payment Reference", |o: &Order| o.payment_reference.clone()),
    Column::new("Payment Date", |o: &Order| o.payment_date.map(|d| d.to_string())),
    Column::new("Created At", |o: &Order| Some(o.created_at.to_rfc3339())),
    Column::display_only("Actions"),
  ]
}

/// A profile with its resolved role, as the users table lists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
  pub profile: Profile,
  pub role: Role,
}

impl UserRow {
  pub fn new(profile: Profile, assignment: Option<&RoleAssignment>) -> Self {
    let assignment = assignment.filter(|a| a.user_id == profile.id);
    Self {
      role: Role::resolve(assignment),
      profile,
    }
  }
}

pub fn profile_columns() -> Vec<Column<UserRow>> {
  vec![
    Column::display_only("Select"),
    Column::new("Email", |u: &UserRow| Some(u.profile.email.clone())),
    Column::new("Name", |u: &UserRow| u.profile.display_name.clone()),
    Column::new("Company", |u: &UserRow| u.profile.company_name.clone()),
    Column::new("Role", |u: &UserRow| Some(u.role.to_string())),
    Column::new("Joined", |u: &UserRow| Some(u.profile.created_at.to_rfc3339())),
    Column::display_only("Actions"),
  ]
}
