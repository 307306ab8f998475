// constructmate/src/lib.rs

//! ConstructMate core: the order side of the commission-sales back office.
//!
//! The crate covers what sits between the screens and the hosted data service:
//!  - A query engine for search/status/payment filtered, paginated order listings
//!    with exact filtered counts, scoped to the caller's own rows unless admin.
//!  - A stateful listing with debounced search and stale-response discarding.
//!  - Realtime synchronization: row-change events invalidate the listing and
//!    trigger a coalesced refetch; the feed reconnects when it drops.
//!  - The order workflow: status changes (with commission autofill on
//!    completion), payment verification, commission payout marking and
//!    customer payment evidence upload.
//!  - CSV export of the admin tables.
//!
//! The data service itself is reached through the traits in [`gateway`];
//! [`gateway::InMemoryGateway`] implements them in-process.

pub mod access;
pub mod board;
pub mod config;
pub mod error;
pub mod export;
pub mod gateway;
pub mod models;
pub mod query;
pub mod shared;
pub mod sync;
pub mod workflow;

// --- Re-exports for the Public API ---

pub use crate::access::{Caller, Owned, Role, RoleAssignment};
pub use crate::board::OrderBoard;
pub use crate::config::MateConfig;
pub use crate::error::{MateError, MateResult};
pub use crate::gateway::{Backend, ChangeFeed, InMemoryGateway, OrderGateway, ReceiptStore};
pub use crate::models::{Inquiry, InquiryStatus, NewOrder, Order, OrderPatch, OrderStatus, PaymentStatus, Profile};
pub use crate::query::{FetchOutcome, ListingParams, ListingView, OrderListing, OrderPage, OrderQueryEngine};
pub use crate::shared::Shared;
pub use crate::sync::{RealtimeSync, RefreshTarget, SyncOptions};
pub use crate::workflow::{CommissionSummary, OrderWorkflow, PaymentEvidence, ReceiptFile, StatusChange};

/*
    Typical screen lifecycle:
    1. Resolve the `Caller` from the signed-in profile and its role assignment.
    2. `OrderBoard::open(backend, caller, &config)` loads page 1 and subscribes
       to order changes in the caller's scope.
    3. Keystrokes go to `listing().set_search_input`; dropdowns and pager call
       the `set_*` methods, which reset or move the page and refetch.
    4. Admin actions go through `workflow()`; the gateway's change event
       refreshes the listing, no local patching.
    5. On sign-out or role change call `switch_caller`; on leaving the screen `close`.
*/
