//! Shared types for the venue order engine
//!
//! Domain models, request/response types, order notifications and the
//! unified error-code system used by the engine and its callers.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use message::{NotificationKind, OrderNotification};
pub use serde::{Deserialize, Serialize};
