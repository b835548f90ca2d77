//! Order Model (订单)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order status
///
/// `Pending → Preparing → Ready → Served | Completed`, with `Cancelled`
/// reachable from any non-terminal status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Served,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Served,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Statuses shown on the kitchen display
    pub const ACTIVE: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Preparing => "PREPARING",
            Self::Ready => "READY",
            Self::Served => "SERVED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// No transition leaves a terminal status
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Served | Self::Completed | Self::Cancelled)
    }

    /// Whether ingredient stock has been deducted for an order in this status
    pub const fn holds_stock(&self) -> bool {
        matches!(self, Self::Preparing | Self::Ready)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown status string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownOrderStatus(s.to_string()))
    }
}

/// How the order reaches the customer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderKind {
    DineIn,
    RoomService,
    WalkIn,
}

impl OrderKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DineIn => "DINE_IN",
            Self::RoomService => "ROOM_SERVICE",
            Self::WalkIn => "WALK_IN",
        }
    }
}

impl FromStr for OrderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DINE_IN" => Ok(Self::DineIn),
            "ROOM_SERVICE" => Ok(Self::RoomService),
            "WALK_IN" => Ok(Self::WalkIn),
            other => Err(format!("unknown order kind: {other}")),
        }
    }
}

/// Server-computed financial fields. Either all present or none.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OrderTotals {
    pub items_subtotal: f64,
    pub service_charge: f64,
    pub tax: f64,
    pub grand_total: f64,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    /// Ordering customer (None for walk-in)
    pub customer_id: Option<i64>,
    pub kind: OrderKind,
    /// Table, room or counter label
    pub destination: String,
    pub status: OrderStatus,
    pub instructions: Option<String>,
    /// None until the order has been priced
    pub totals: Option<OrderTotals>,
    /// Staff member who last moved the order
    pub staff_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line item (immutable after creation)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderLineItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    /// Menu item name at order time
    pub name: String,
    pub quantity: i32,
    /// Unit price snapshot at order time
    pub unit_price: f64,
    pub subtotal: f64,
    pub instructions: Option<String>,
}

/// Order with its line items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderLineItem>,
}

/// One requested line; prices are never accepted from the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineItemRequest {
    pub menu_item_id: i64,
    pub quantity: i32,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub customer_id: Option<i64>,
    pub kind: OrderKind,
    pub destination: String,
    #[serde(default)]
    pub instructions: Option<String>,
    pub items: Vec<LineItemRequest>,
}

/// Create order result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderCreated {
    pub order_id: i64,
    pub grand_total: f64,
    pub totals: OrderTotals,
}

/// Status transition payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionRequest {
    pub order_id: i64,
    pub target_status: OrderStatus,
    pub staff_id: i64,
}

/// Status transition result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionOutcome {
    pub order_id: i64,
    pub previous_status: OrderStatus,
    pub new_status: OrderStatus,
    /// Number of stock-change log entries written by this transition
    pub stock_entries: usize,
}

/// Order list filter
#[derive(Debug, Clone, Deserialize)]
pub struct OrderQuery {
    pub customer_id: Option<i64>,
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            customer_id: None,
            status: None,
            offset: 0,
            limit: default_limit(),
        }
    }
}

fn default_limit() -> i64 {
    50
}
