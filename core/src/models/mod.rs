// constructmate/src/models/mod.rs

//! Typed rows for the entities stored behind the gateway.

pub mod inquiry;
pub mod order;
pub mod profile;

pub use inquiry::{Inquiry, InquiryStatus, NewInquiry};
pub use order::{NewOrder, Order, OrderPatch, OrderStatus, PaymentStatus};
pub use profile::Profile;
