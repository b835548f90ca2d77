//! 库存审计日志 — 只追加的库存流水
//!
//! # 保证
//!
//! - **Append-only**: 只有插入接口；schema 触发器拒绝 UPDATE/DELETE
//! - **同事务写入**: 每条流水与对应的库存变更在同一个 unit of work 中提交
//! - **可重放**: 按 id 顺序累加某原料的全部 `quantity_change` 等于其当前库存，
//!   [`AuditLog::reconcile`] 随时校验

pub mod log;
pub mod reconcile;

pub use log::{AuditLog, StockMovement};
