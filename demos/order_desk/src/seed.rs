// order_desk/src/seed.rs

use chrono::{Duration, Utc};
use constructmate::models::NewOrder;
use constructmate::{InMemoryGateway, MateResult, OrderPatch, OrderStatus, Profile, Role, RoleAssignment};
use rust_decimal::Decimal;
use uuid::Uuid;

pub struct Accounts {
  pub admin: Profile,
  pub customers: Vec<Profile>,
  pub assignments: Vec<RoleAssignment>,
}

impl Accounts {
  pub fn assignment_for(&self, profile: &Profile) -> Option<&RoleAssignment> {
    self.assignments.iter().find(|a| a.user_id == profile.id)
  }
}

pub fn accounts() -> MateResult<Accounts> {
  let now = Utc::now();
  let admin = Profile::new(Uuid::new_v4(), "desk@constructmate.test", now)?.with_names(Some("Order Desk"), None);
  let customers = vec![
    Profile::new(Uuid::new_v4(), "rina@harbourbuild.test", now)?
      .with_names(Some("Rina"), Some("Harbour Build")),
    Profile::new(Uuid::new_v4(), "tomas@northgrid.test", now)?
      .with_names(Some("Tomas"), Some("Northgrid, Inc.")),
  ];
  let assignments = vec![RoleAssignment {
    user_id: admin.id,
    role: Role::Admin,
  }];
  Ok(Accounts {
    admin,
    customers,
    assignments,
  })
}

const PROJECTS: [&str; 6] = [
  "Harbor Warehouse",
  "Bridge Retrofit",
  "Solar Canopy",
  "Depot Roof",
  "School Annex, Phase \"B\"",
  "Canal Lock Gates",
];

/// Places a spread of orders for every customer, then walks some of them
/// along the lifecycle. Seeding happens before any board subscribes.
pub fn populate(gateway: &InMemoryGateway, customers: &[Profile]) -> MateResult<usize> {
  let now = Utc::now();
  let mut orders = Vec::new();
  for (n, project) in PROJECTS.iter().cycle().take(18).enumerate() {
    let customer = &customers[n % customers.len()];
    let input = NewOrder {
      order_number: format!("CM-{:05}", 24_100 + n),
      project_name: project.to_string(),
      total_amount: Decimal::from(75_000 + (n as u64) * 12_500),
      user_id: customer.id,
      inquiry_id: None,
    };
    let created = now - Duration::hours(36 - n as i64);
    let mut order = input.into_order(Uuid::new_v4(), created)?;

    let progress = OrderPatch {
      status: Some(OrderStatus::ALL[n % OrderStatus::ALL.len()]),
      paid_amount: (n % 3 == 1).then(|| Decimal::from(25_000)),
      ..OrderPatch::default()
    };
    progress.apply_to(&mut order, created);
    orders.push(order);
  }

  let count = orders.len();
  gateway.seed(orders);
  Ok(count)
}
