use anyhow::Context;
use order_engine::utils::init_logger_with_file;
use order_engine::{EngineConfig, EngineState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 环境变量 (.env 可选)
    dotenv::dotenv().ok();

    // 2. 加载配置
    let config = EngineConfig::from_env().context("invalid configuration")?;

    // 3. 日志
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    tracing::info!(
        work_dir = %config.work_dir.display(),
        database = %config.database_path.display(),
        environment = %config.environment,
        "Order engine starting..."
    );

    // 4. 打开数据库并执行迁移
    let state = EngineState::initialize(&config)
        .await
        .context("failed to initialize order engine")?;

    // 5. 库存对账: 流水重放结果必须等于当前库存
    let report = state.audit.reconcile().await?;
    let low_stock = state.inventory.low_stock().await?;
    for ing in &low_stock {
        tracing::warn!(
            ingredient_id = ing.id,
            name = %ing.name,
            stock_level = ing.stock_level,
            reorder_threshold = ing.reorder_threshold,
            "Low stock"
        );
    }
    let active = state.orders.kitchen_queue().await?;
    tracing::info!(active_orders = active.len(), "Kitchen queue loaded");

    state.shutdown().await;

    if !report.is_consistent() {
        anyhow::bail!(
            "stock drift detected on {} ingredient(s)",
            report.drifts.len()
        );
    }
    Ok(())
}
