//! Order lifecycle and inventory consistency engine
//!
//! Creates venue orders with server-computed totals, moves them through the
//! `PENDING → PREPARING → READY → SERVED | COMPLETED` state machine (with
//! `CANCELLED` from any non-terminal status), and keeps ingredient stock and
//! its append-only change log consistent with every accepted or cancelled
//! order.
//!
//! # 模块结构
//!
//! - [`core`] - 配置、错误、引擎状态
//! - [`db`] - SQLite 连接池、迁移、unit of work 与订单行锁
//! - [`order_money`] - 金额计算 (rust_decimal)
//! - [`inventory`] - 库存台账
//! - [`audit`] - 库存流水与对账
//! - [`orders`] - 订单服务与状态机
//! - [`catalog`] - 菜单与配方维护

pub mod audit;
pub mod catalog;
pub mod core;
pub mod db;
pub mod inventory;
pub mod order_money;
pub mod orders;
pub mod utils;

pub use audit::AuditLog;
pub use catalog::CatalogService;
pub use core::{EngineConfig, EngineError, EngineResult, EngineState};
pub use db::{DbService, TransactionManager};
pub use inventory::StockLedger;
pub use order_money::{FinancialCalculator, RateConfig};
pub use orders::OrderService;
