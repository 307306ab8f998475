// constructmate/src/export/mod.rs

pub mod columns;
pub mod csv;

pub use columns::{order_columns, profile_columns, UserRow};
pub use csv::{to_csv, Column};
