use super::error::{EngineError, EngineResult};
use crate::order_money::RateConfig;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// 引擎配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/venue/orders | 工作目录 (数据库、日志) |
/// | DATABASE_PATH | {WORK_DIR}/data/orders.db | SQLite 数据库文件 |
/// | SERVICE_CHARGE_RATE | 0.10 | 服务费率 |
/// | TAX_RATE | 0.12 | 税率 (对 小计+服务费 计税) |
/// | LOCK_TIMEOUT_MS | 5000 | 等待行锁/写锁的最长时间 |
/// | MAX_CONNECTIONS | 5 | 连接池大小 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (无) | 日志目录，设置后按天滚动写文件 |
/// | ENVIRONMENT | development | 运行环境 |
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 工作目录
    pub work_dir: PathBuf,
    /// 数据库文件路径
    pub database_path: PathBuf,
    /// 服务费率与税率
    pub rates: RateConfig,
    /// 锁等待超时 (毫秒)，超时后操作以并发冲突失败
    pub lock_timeout_ms: u64,
    pub max_connections: u32,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    /// 运行环境: development | staging | production
    pub environment: String,
}

const DEFAULT_WORK_DIR: &str = "/var/lib/venue/orders";
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

impl EngineConfig {
    /// 从环境变量加载配置
    ///
    /// 未设置的项使用默认值；费率格式错误或越界时返回错误而不是静默回退。
    pub fn from_env() -> EngineResult<Self> {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| DEFAULT_WORK_DIR.into());
        let mut config = Self::with_work_dir(work_dir);

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        let service_charge_rate = rate_from_env("SERVICE_CHARGE_RATE")?
            .unwrap_or(config.rates.service_charge_rate());
        let tax_rate = rate_from_env("TAX_RATE")?
            .unwrap_or(config.rates.tax_rate());
        config.rates = RateConfig::new(service_charge_rate, tax_rate)?;

        config.lock_timeout_ms = std::env::var("LOCK_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LOCK_TIMEOUT_MS);
        config.max_connections = std::env::var("MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        config.log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
        config.log_dir = std::env::var("LOG_DIR").ok().map(PathBuf::from);
        config.environment = std::env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".into());

        Ok(config)
    }

    /// 默认配置，数据库放在指定工作目录下
    ///
    /// 常用于测试场景
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        Self {
            database_path: work_dir.join("data").join("orders.db"),
            work_dir,
            rates: RateConfig::default(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            log_level: "info".into(),
            log_dir: None,
            environment: "development".into(),
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn rate_from_env(key: &str) -> EngineResult<Option<Decimal>> {
    match std::env::var(key) {
        Ok(raw) => Decimal::from_str(raw.trim())
            .map(Some)
            .map_err(|e| EngineError::Config(format!("{key}={raw:?} is not a decimal: {e}"))),
        Err(_) => Ok(None),
    }
}
