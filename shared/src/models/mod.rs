//! Data models
//!
//! Shared between the engine and its callers. All IDs are `i64`
//! (SQLite INTEGER PRIMARY KEY); timestamps are Unix milliseconds.

pub mod catalog;
pub mod ingredient;
pub mod order;
pub mod payment;
pub mod recipe;
pub mod stock_log;

// Re-exports
pub use catalog::*;
pub use ingredient::*;
pub use order::*;
pub use payment::*;
pub use recipe::*;
pub use stock_log::*;
