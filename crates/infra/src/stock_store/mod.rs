//! Stock storage boundary.
//!
//! This module defines an infrastructure-facing abstraction for loading and
//! committing stock item rows without making any storage assumptions. The
//! stock item row (with its owned reservations) is the unit of concurrency
//! control; adjustment audit rows are independent appends.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryStockStore;
pub use r#trait::{StockStore, StoreError};
