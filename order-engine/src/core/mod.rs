//! 核心模块 - 引擎配置、状态和错误定义
//!
//! - [`EngineConfig`] - 引擎配置
//! - [`EngineState`] - 已初始化的服务集合
//! - [`EngineError`] - 引擎错误

pub mod config;
pub mod error;
pub mod state;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult, Resource, StockShortfall};
pub use state::EngineState;
