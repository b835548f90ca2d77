//! Order notifications
//!
//! Emitted after commit for out-of-process observers (kitchen display,
//! analytics). Delivery is up to the subscriber.

use crate::models::{OrderLineItem, OrderStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderCreated,
    OrderStatusChanged,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderNotification {
    /// Unique event id (UUID v4)
    pub event_id: String,
    pub kind: NotificationKind,
    pub order_id: i64,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<OrderStatus>,
    pub items: Vec<OrderLineItem>,
    pub timestamp: i64,
}

impl OrderNotification {
    pub fn created(order_id: i64, items: Vec<OrderLineItem>) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            kind: NotificationKind::OrderCreated,
            order_id,
            status: OrderStatus::Pending,
            previous_status: None,
            items,
            timestamp: crate::util::now_millis(),
        }
    }

    pub fn status_changed(
        order_id: i64,
        previous: OrderStatus,
        status: OrderStatus,
        items: Vec<OrderLineItem>,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            kind: NotificationKind::OrderStatusChanged,
            order_id,
            status,
            previous_status: Some(previous),
            items,
            timestamp: crate::util::now_millis(),
        }
    }
}
