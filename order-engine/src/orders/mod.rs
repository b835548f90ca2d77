//! 订单模块 - 订单创建与状态流转
//!
//! # 架构
//!
//! ```text
//! create_order      → 校验 → 读价格 → FinancialCalculator → order + items (一个事务)
//! transition_status → lock_order → 状态机 → StockLedger → AuditLog → status (一个事务)
//!                                                                   ↓ commit
//!                                                         OrderNotification 广播
//! ```

pub mod service;
pub mod state;

pub use service::OrderService;
pub use state::{StockEffect, TransitionPlan, can_transition, plan_transition};

#[cfg(test)]
mod tests;
