use crate::db::repository::RepoError;
use shared::models::OrderStatus;
use shared::{AppError, ErrorCode};
use std::fmt;
use thiserror::Error;

/// Which kind of record a lookup missed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Order,
    MenuItem,
    Ingredient,
}

impl Resource {
    fn error_code(self) -> ErrorCode {
        match self {
            Resource::Order => ErrorCode::OrderNotFound,
            Resource::MenuItem => ErrorCode::ProductNotFound,
            Resource::Ingredient => ErrorCode::IngredientNotFound,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Order => "Order",
            Resource::MenuItem => "Menu item",
            Resource::Ingredient => "Ingredient",
        })
    }
}

/// The first ingredient found short while validating an accept
#[derive(Debug, Clone, PartialEq)]
pub struct StockShortfall {
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub unit: String,
    pub required: f64,
    pub available: f64,
}

impl StockShortfall {
    /// How much more stock the accept would have needed
    pub fn shortfall(&self) -> f64 {
        crate::order_money::quantity_to_f64(
            crate::order_money::to_quantity(self.required)
                - crate::order_money::to_quantity(self.available),
        )
    }
}

/// Engine errors
///
/// Every operation fails with exactly one of these; nothing is persisted
/// when one is returned.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{message}")]
    Validation { code: ErrorCode, message: String },

    #[error("{resource} not found: {id}")]
    NotFound { resource: Resource, id: i64 },

    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error(
        "Insufficient stock for {}: required {} {}, available {} {}",
        .0.ingredient_name, .0.required, .0.unit, .0.available, .0.unit
    )]
    InsufficientStock(StockShortfall),

    #[error("Concurrent update conflict: {0}")]
    Concurrency(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        EngineError::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: Resource, id: i64) -> Self {
        EngineError::NotFound { resource, id }
    }

    /// Safe to retry the whole operation (nothing was committed)
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Concurrency(_))
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            EngineError::Validation { code, .. } => *code,
            EngineError::NotFound { resource, .. } => resource.error_code(),
            EngineError::InvalidTransition { from, .. } if from.is_terminal() => {
                ErrorCode::OrderTerminal
            }
            EngineError::InvalidTransition { .. } => ErrorCode::OrderInvalidTransition,
            EngineError::InsufficientStock(_) => ErrorCode::InsufficientStock,
            EngineError::Concurrency(_) => ErrorCode::SystemBusy,
            EngineError::Persistence(_) => ErrorCode::DatabaseError,
            EngineError::Config(_) => ErrorCode::ConfigError,
        }
    }
}

/// Caller-facing message for a unique-constraint violation.
/// The raw SQLite text names tables and columns, so it is mapped instead.
fn duplicate_message(detail: &str) -> &'static str {
    if detail.contains("ingredients.name") {
        "Ingredient name already exists"
    } else if detail.contains("recipe_requirements") {
        "Ingredient is already part of this recipe"
    } else {
        "Record already exists"
    }
}

impl From<RepoError> for EngineError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Busy(detail) => {
                // 锁等待超时等存储层细节只记录日志
                tracing::debug!(error = %detail, "Store busy");
                EngineError::Concurrency("another write is in progress".into())
            }
            RepoError::Duplicate(detail) => {
                tracing::debug!(error = %detail, "Unique constraint violated");
                EngineError::validation(ErrorCode::AlreadyExists, duplicate_message(&detail))
            }
            RepoError::Database(msg) | RepoError::Corrupt(msg) => EngineError::Persistence(msg),
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::from(err).into()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let code = err.error_code();
        match err {
            EngineError::NotFound { resource, id } => {
                AppError::with_message(code, format!("{resource} not found: {id}"))
                    .with_detail("id", id)
            }
            EngineError::InvalidTransition { order_id, from, to } => AppError::with_message(
                code,
                format!("Order {order_id} cannot move from {from} to {to}"),
            )
            .with_detail("order_id", order_id)
            .with_detail("from", from.as_str())
            .with_detail("to", to.as_str()),
            EngineError::InsufficientStock(shortfall) => {
                let message = EngineError::InsufficientStock(shortfall.clone()).to_string();
                let missing = shortfall.shortfall();
                AppError::with_message(code, message)
                    .with_detail("ingredient_id", shortfall.ingredient_id)
                    .with_detail("ingredient_name", shortfall.ingredient_name)
                    .with_detail("required", shortfall.required)
                    .with_detail("available", shortfall.available)
                    .with_detail("shortfall", missing)
            }
            EngineError::Persistence(detail) => {
                // 记录存储层细节，但不暴露给调用方
                tracing::error!(error = %detail, "Persistence failure");
                AppError::with_message(code, "A storage error occurred")
            }
            EngineError::Config(detail) => {
                tracing::error!(error = %detail, "Configuration error");
                AppError::with_message(code, "Engine is misconfigured")
            }
            EngineError::Concurrency(detail) => {
                tracing::warn!(error = %detail, "Concurrent update conflict");
                AppError::with_message(code, "Resource is busy, retry the operation")
            }
            EngineError::Validation { message, .. } => AppError::with_message(code, message),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
