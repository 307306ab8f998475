// constructmate/src/query/mod.rs

//! Filtered, paginated order retrieval and the listing state built on it.

pub mod debounce;
pub mod engine;
pub mod listing;
pub mod params;

pub use debounce::Debouncer;
pub use engine::{total_pages, OrderPage, OrderQueryEngine};
pub use listing::{FetchOutcome, ListingHandle, ListingView, OrderListing};
pub use params::{parse_payment_filter, parse_status_filter, ListingParams};
