use super::{EngineConfig, EngineResult};
use crate::audit::AuditLog;
use crate::catalog::CatalogService;
use crate::db::{DbService, TransactionManager};
use crate::inventory::StockLedger;
use crate::order_money::FinancialCalculator;
use crate::orders::OrderService;

/// 引擎状态 - 持有连接池及所有服务
///
/// 所有服务共享同一个连接池，克隆开销很小。
#[derive(Clone)]
pub struct EngineState {
    pub config: EngineConfig,
    pub db: DbService,
    pub orders: OrderService,
    pub inventory: StockLedger,
    pub audit: AuditLog,
    pub catalog: CatalogService,
}

impl EngineState {
    /// 打开数据库、执行迁移并组装服务
    pub async fn initialize(config: &EngineConfig) -> EngineResult<Self> {
        let db = DbService::new(config).await?;
        let pool = db.pool.clone();
        let tx = TransactionManager::new(pool.clone());

        let orders = OrderService::new(
            pool.clone(),
            tx.clone(),
            FinancialCalculator::new(config.rates),
        );
        let inventory = StockLedger::new(pool.clone(), tx.clone());
        let audit = AuditLog::new(pool.clone());
        let catalog = CatalogService::new(pool, tx);

        tracing::info!(
            service_charge_rate = %config.rates.service_charge_rate(),
            tax_rate = %config.rates.tax_rate(),
            "Order engine initialized"
        );

        Ok(Self {
            config: config.clone(),
            db,
            orders,
            inventory,
            audit,
            catalog,
        })
    }

    pub async fn shutdown(&self) {
        self.db.close().await;
        tracing::info!("Order engine stopped");
    }
}
