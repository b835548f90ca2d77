//! 库存台账 - 原料库存的校验与变更
//!
//! 订单流转时的扣减/回补在调用方的 unit of work 中执行；手工入库、报损、
//! 建档各自开启事务，并同步写入库存流水。

pub mod ledger;

pub use ledger::{AppliedChange, StockDirection, StockLedger, StockRequirement};
