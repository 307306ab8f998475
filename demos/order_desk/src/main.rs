// order_desk/src/main.rs

//! A scripted back-office session against the in-memory gateway: an admin
//! browses and settles orders while a customer uploads payment evidence, and
//! the admin's board refreshes from the change feed.

mod seed;

use constructmate::export::{order_columns, to_csv};
use constructmate::gateway::{OrderFilter, OrderGateway, OrderQuery, SortSpec};
use constructmate::workflow::commission_payable;
use constructmate::{
  Backend, Caller, CommissionSummary, InMemoryGateway, MateConfig, OrderBoard, OrderStatus, PaymentEvidence,
  PaymentStatus, ReceiptFile,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan; // For span events in tracing

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE)
    .init();

  let config = match MateConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      tracing::error!(error = %e, "Failed to load ConstructMate configuration.");
      return Err(e.into());
    }
  };

  let gateway = Arc::new(InMemoryGateway::with_table(&config.orders_table));
  let accounts = seed::accounts()?;
  let seeded = seed::populate(&gateway, &accounts.customers)?;
  tracing::info!(orders = seeded, "Seeded in-memory order table.");

  let backend = Backend::in_memory(gateway.clone());
  let admin = Caller::for_profile(&accounts.admin, accounts.assignment_for(&accounts.admin));
  let customer_profile = &accounts.customers[0];
  let customer = Caller::for_profile(customer_profile, accounts.assignment_for(customer_profile));

  let admin_board = OrderBoard::open(backend.clone(), admin, &config).await?;
  let customer_board = OrderBoard::open(backend.clone(), customer, &config).await?;
  print_page("Admin, all orders", &admin_board);
  print_page("Customer, own orders", &customer_board);

  // Keystrokes settle into one search after the debounce window.
  for text in ["h", "ha", "harb", "harbor"] {
    admin_board.listing().set_search_input(text);
    tokio::time::sleep(Duration::from_millis(60)).await;
  }
  tokio::time::sleep(config.search_debounce + Duration::from_millis(100)).await;
  print_page("Admin, search 'harbor'", &admin_board);
  admin_board.listing().set_search_input("");
  tokio::time::sleep(config.search_debounce + Duration::from_millis(100)).await;

  admin_board.listing().set_status_filter(Some(OrderStatus::Delivered)).await?;
  print_page("Admin, delivered", &admin_board);

  let delivered = admin_board
    .listing()
    .view()
    .page
    .map(|p| p.rows)
    .unwrap_or_default();
  for order in &delivered {
    let change = admin_board
      .workflow()
      .update_status(&admin, order.id, OrderStatus::Completed)
      .await?;
    tracing::info!(
      order = %order.order_number,
      commission = ?change.commission_filled,
      "Completed order."
    );
    admin_board.workflow().verify_payment(&admin, order.id, true).await?;
  }

  // The customer pays one of their open orders and uploads the slip.
  let customer_rows = customer_board
    .listing()
    .view()
    .page
    .map(|p| p.rows)
    .unwrap_or_default();
  if let Some(unpaid) = customer_rows
    .iter()
    .find(|o| o.payment_status() != PaymentStatus::Paid && !o.status.is_terminal())
  {
    let evidence = PaymentEvidence {
      files: vec![ReceiptFile::new("transfer slip.pdf", b"%PDF-1.7 demo".to_vec())],
      reference: format!("TRX-{}", unpaid.order_number),
      date: chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string(),
    };
    let urls = customer_board
      .workflow()
      .submit_payment_evidence(&customer, unpaid.id, evidence)
      .await?;
    tracing::info!(order = %unpaid.order_number, receipts = ?urls, "Customer submitted payment evidence.");
  }

  admin_board.listing().set_status_filter(None).await?;
  tokio::time::sleep(Duration::from_millis(100)).await;
  print_page("Admin, after updates", &admin_board);

  let all = gateway
    .query_orders(&OrderQuery {
      filter: OrderFilter::default(),
      sort: SortSpec::newest_first(),
      range: None,
    })
    .await?
    .rows;

  for order in all.iter().filter(|o| commission_payable(o)).take(2) {
    admin_board.workflow().mark_commission_paid(&admin, order.id).await?;
  }
  let all = gateway
    .query_orders(&OrderQuery {
      filter: OrderFilter::default(),
      sort: SortSpec::newest_first(),
      range: None,
    })
    .await?
    .rows;

  let summary = CommissionSummary::from_orders(&all);
  println!("\nCommission summary:\n{}", serde_json::to_string_pretty(&summary)?);
  println!("\nOrders export:\n{}", to_csv(&all, &order_columns()));

  if let Some(sync) = admin_board.sync() {
    tracing::info!(stats = ?sync.stats(), "Admin realtime stats.");
  }
  customer_board.close().await;
  admin_board.close().await;
  Ok(())
}

fn print_page(title: &str, board: &OrderBoard) {
  let view = board.listing().view();
  println!("\n== {} ==", title);
  match (&view.page, &view.error) {
    (_, Some(error)) => println!("  error: {}", error),
    (Some(page), None) => {
      println!(
        "  page {}/{} ({} matching)",
        page.page,
        page.total_pages(),
        page.total_count
      );
      for o in &page.rows {
        println!(
          "  {:<10} {:<28} {:<10} {:>10} {}",
          o.order_number,
          o.project_name,
          o.status,
          o.total_amount,
          o.payment_status()
        );
      }
    }
    (None, None) => println!("  (not loaded)"),
  }
}
