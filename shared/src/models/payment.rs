//! Payment Model

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Payment outcome status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "REFUNDED" => Ok(Self::Refunded),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// Recorded payment outcome for an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    /// CASH, CARD, E_WALLET, ...
    pub method: String,
    pub amount: f64,
    pub tendered: Option<f64>,
    pub change_amount: f64,
    pub status: PaymentStatus,
    pub created_at: i64,
}

/// Cashier-side payment record payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentCreate {
    pub order_id: i64,
    pub method: String,
    pub amount: f64,
    /// Cash handed over (None for exact/non-cash)
    #[serde(default)]
    pub tendered: Option<f64>,
}
