//! Stock Change Log Model (库存流水)
//!
//! Append-only. Replaying every entry of an ingredient from zero yields its
//! current stock level.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why a stock level changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockAction {
    /// Order accepted into preparation
    OrderDeduct,
    /// Accepted order cancelled before payment
    OrderRestore,
    /// Delivery or opening stock
    Restock,
    /// Spoilage, spillage, breakage
    Waste,
}

impl StockAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OrderDeduct => "ORDER_DEDUCT",
            Self::OrderRestore => "ORDER_RESTORE",
            Self::Restock => "RESTOCK",
            Self::Waste => "WASTE",
        }
    }

    /// Whether this action lowers stock
    pub const fn is_outflow(&self) -> bool {
        matches!(self, Self::OrderDeduct | Self::Waste)
    }

    /// Whether this action is booked by an order transition
    pub const fn is_order_driven(&self) -> bool {
        matches!(self, Self::OrderDeduct | Self::OrderRestore)
    }
}

impl fmt::Display for StockAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ORDER_DEDUCT" => Ok(Self::OrderDeduct),
            "ORDER_RESTORE" => Ok(Self::OrderRestore),
            "RESTOCK" => Ok(Self::Restock),
            "WASTE" => Ok(Self::Waste),
            other => Err(format!("unknown stock action: {other}")),
        }
    }
}

/// Immutable audit record of one stock change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockChangeLogEntry {
    pub id: i64,
    pub ingredient_id: i64,
    /// Order that caused the change (None for manual movements)
    pub order_id: Option<i64>,
    pub action: StockAction,
    /// Signed change (negative for outflows)
    pub quantity_change: f64,
    /// Stock level right after the change
    pub resulting_level: f64,
    pub staff_id: i64,
    pub note: Option<String>,
    pub created_at: i64,
}

/// Manual stock movement payload (restock / waste)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StockAdjustment {
    pub ingredient_id: i64,
    pub action: StockAction,
    /// Positive magnitude; the action decides the sign
    pub quantity: f64,
    pub staff_id: i64,
    #[serde(default)]
    pub note: Option<String>,
}

/// Stock log filter
#[derive(Debug, Clone, Deserialize)]
pub struct StockLogQuery {
    pub ingredient_id: Option<i64>,
    pub order_id: Option<i64>,
    pub action: Option<StockAction>,
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for StockLogQuery {
    fn default() -> Self {
        Self {
            ingredient_id: None,
            order_id: None,
            action: None,
            offset: 0,
            limit: default_limit(),
        }
    }
}

fn default_limit() -> i64 {
    50
}

/// Ingredient whose level disagrees with its replayed history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockDrift {
    pub ingredient_id: i64,
    pub name: String,
    pub stock_level: f64,
    pub replayed_level: f64,
}

/// Result of replaying the stock log against current levels
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReconciliationReport {
    pub ingredients_checked: usize,
    pub entries_replayed: usize,
    pub drifts: Vec<StockDrift>,
}

impl ReconciliationReport {
    pub fn is_consistent(&self) -> bool {
        self.drifts.is_empty()
    }
}
