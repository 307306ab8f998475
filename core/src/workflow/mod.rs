// constructmate/src/workflow/mod.rs

//! Order status, payment verification and commission handling.

pub mod commission;
pub mod orders;
pub mod receipts;
pub mod status;

pub use commission::{commission_for, commission_payable, CommissionSummary};
pub use orders::{OrderWorkflow, StatusChange};
pub use receipts::{PaymentEvidence, ReceiptFile};
pub use status::Transition;
