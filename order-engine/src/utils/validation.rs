//! Input validation helpers
//!
//! Centralized limits and boundary checks. Everything here runs before a unit
//! of work is opened, so a rejected request never touches the database.

use crate::core::{EngineError, EngineResult};
use shared::ErrorCode;
use shared::models::{
    CreateOrderRequest, IngredientCreate, IngredientUpdate, MenuItemCreate, PaymentCreate,
    StockAdjustment,
};

// ── Limits ──────────────────────────────────────────────────────────

/// Entity names: menu item, ingredient
pub const MAX_NAME_LEN: usize = 200;

/// Notes and special instructions (order and line level)
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: destination (table / room), unit, payment method
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Maximum allowed quantity per line item
pub const MAX_QUANTITY: i32 = 9999;

/// Maximum line items per order
pub const MAX_ITEMS_PER_ORDER: usize = 100;

/// Maximum allowed price per item
pub const MAX_PRICE: f64 = 1_000_000.0;

/// Maximum allowed payment amount
pub const MAX_PAYMENT_AMOUNT: f64 = 1_000_000.0;

/// Maximum single stock movement or reorder threshold
pub const MAX_STOCK_QUANTITY: f64 = 100_000_000.0;

// ── Primitives ──────────────────────────────────────────────────────

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
pub fn require_finite(value: f64, field: &str, code: ErrorCode) -> EngineResult<()> {
    if !value.is_finite() {
        return Err(EngineError::validation(
            code,
            format!("{field} must be a finite number, got {value}"),
        ));
    }
    Ok(())
}

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> EngineResult<()> {
    if value.trim().is_empty() {
        return Err(EngineError::validation(
            ErrorCode::RequiredField,
            format!("{field} must not be empty"),
        ));
    }
    check_len(value, field, max_len)
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: Option<&str>,
    field: &str,
    max_len: usize,
) -> EngineResult<()> {
    match value {
        Some(v) => check_len(v, field, max_len),
        None => Ok(()),
    }
}

fn check_len(value: &str, field: &str, max_len: usize) -> EngineResult<()> {
    let len = value.chars().count();
    if len > max_len {
        return Err(EngineError::validation(
            ErrorCode::ValueOutOfRange,
            format!("{field} is too long ({len} chars, max {max_len})"),
        ));
    }
    Ok(())
}

/// Validate a strictly positive stock quantity (movement size)
pub fn validate_stock_quantity(value: f64, field: &str) -> EngineResult<()> {
    require_finite(value, field, ErrorCode::InvalidStockQuantity)?;
    if value <= 0.0 || value > MAX_STOCK_QUANTITY {
        return Err(EngineError::validation(
            ErrorCode::InvalidStockQuantity,
            format!("{field} must be within (0, {MAX_STOCK_QUANTITY}], got {value}"),
        ));
    }
    Ok(())
}

fn validate_non_negative_quantity(value: f64, field: &str) -> EngineResult<()> {
    require_finite(value, field, ErrorCode::InvalidStockQuantity)?;
    if !(0.0..=MAX_STOCK_QUANTITY).contains(&value) {
        return Err(EngineError::validation(
            ErrorCode::InvalidStockQuantity,
            format!("{field} must be within [0, {MAX_STOCK_QUANTITY}], got {value}"),
        ));
    }
    Ok(())
}

// ── Requests ────────────────────────────────────────────────────────

/// Validate an order creation request before any catalog lookup
pub fn validate_create_order(req: &CreateOrderRequest) -> EngineResult<()> {
    if req.destination.trim().is_empty() {
        return Err(EngineError::validation(
            ErrorCode::OrderDestinationRequired,
            "destination must not be empty",
        ));
    }
    check_len(&req.destination, "destination", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(req.instructions.as_deref(), "instructions", MAX_NOTE_LEN)?;

    if req.items.is_empty() {
        return Err(EngineError::validation(
            ErrorCode::OrderEmpty,
            "order must contain at least one line item",
        ));
    }
    if req.items.len() > MAX_ITEMS_PER_ORDER {
        return Err(EngineError::validation(
            ErrorCode::ValueOutOfRange,
            format!(
                "order has too many line items ({}, max {MAX_ITEMS_PER_ORDER})",
                req.items.len()
            ),
        ));
    }

    for (idx, item) in req.items.iter().enumerate() {
        if item.quantity < 1 || item.quantity > MAX_QUANTITY {
            return Err(EngineError::validation(
                ErrorCode::ValueOutOfRange,
                format!(
                    "items[{idx}].quantity must be within 1..={MAX_QUANTITY}, got {}",
                    item.quantity
                ),
            ));
        }
        validate_optional_text(
            item.instructions.as_deref(),
            &format!("items[{idx}].instructions"),
            MAX_NOTE_LEN,
        )?;
    }
    Ok(())
}

pub fn validate_payment(req: &PaymentCreate) -> EngineResult<()> {
    if req.method.trim().is_empty() {
        return Err(EngineError::validation(
            ErrorCode::PaymentInvalidMethod,
            "payment method must not be empty",
        ));
    }
    check_len(&req.method, "method", MAX_SHORT_TEXT_LEN)?;

    require_finite(req.amount, "amount", ErrorCode::ValueOutOfRange)?;
    if req.amount <= 0.0 || req.amount > MAX_PAYMENT_AMOUNT {
        return Err(EngineError::validation(
            ErrorCode::ValueOutOfRange,
            format!(
                "amount must be within (0, {MAX_PAYMENT_AMOUNT}], got {}",
                req.amount
            ),
        ));
    }
    if let Some(tendered) = req.tendered {
        require_finite(tendered, "tendered", ErrorCode::ValueOutOfRange)?;
        if tendered < req.amount {
            return Err(EngineError::validation(
                ErrorCode::PaymentInsufficientAmount,
                format!("tendered {tendered} is less than amount {}", req.amount),
            ));
        }
    }
    Ok(())
}

pub fn validate_ingredient_create(data: &IngredientCreate) -> EngineResult<()> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&data.unit, "unit", MAX_SHORT_TEXT_LEN)?;
    validate_non_negative_quantity(data.reorder_threshold, "reorder_threshold")?;
    validate_non_negative_quantity(data.opening_stock, "opening_stock")
}

pub fn validate_ingredient_update(data: &IngredientUpdate) -> EngineResult<()> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(unit) = &data.unit {
        validate_required_text(unit, "unit", MAX_SHORT_TEXT_LEN)?;
    }
    if let Some(threshold) = data.reorder_threshold {
        validate_non_negative_quantity(threshold, "reorder_threshold")?;
    }
    Ok(())
}

pub fn validate_menu_item_create(data: &MenuItemCreate) -> EngineResult<()> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    require_finite(data.price, "price", ErrorCode::ProductInvalidPrice)?;
    if data.price < 0.0 || data.price > MAX_PRICE {
        return Err(EngineError::validation(
            ErrorCode::ProductInvalidPrice,
            format!("price must be within 0..={MAX_PRICE}, got {}", data.price),
        ));
    }
    Ok(())
}

/// Manual adjustments may only restock or write off
pub fn validate_stock_adjustment(adj: &StockAdjustment) -> EngineResult<()> {
    if adj.action.is_order_driven() {
        return Err(EngineError::validation(
            ErrorCode::InvalidRequest,
            format!("{} is booked by order transitions only", adj.action),
        ));
    }
    validate_stock_quantity(adj.quantity, "quantity")?;
    validate_optional_text(adj.note.as_deref(), "note", MAX_NOTE_LEN)
}
