use crate::core::{EngineError, EngineResult};
use crate::db::repository::stock_log::{self, NewEntry};
use crate::order_money::quantity_to_f64;
use rust_decimal::Decimal;
use shared::ErrorCode;
use shared::models::{StockAction, StockChangeLogEntry, StockLogQuery};
use sqlx::{SqliteConnection, SqlitePool};

/// Maximum page size for log queries
const MAX_PAGE_SIZE: i64 = 500;

/// One stock movement to be recorded
#[derive(Debug, Clone)]
pub struct StockMovement<'a> {
    pub ingredient_id: i64,
    pub order_id: Option<i64>,
    pub action: StockAction,
    /// Signed: negative for outflows
    pub quantity_change: Decimal,
    /// Stock level after the movement
    pub resulting_level: Decimal,
    pub staff_id: i64,
    pub note: Option<&'a str>,
}

/// Stock change audit log
#[derive(Clone)]
pub struct AuditLog {
    pool: SqlitePool,
}

impl AuditLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a movement inside the caller's unit of work.
    ///
    /// The entry commits or rolls back with the stock change it describes.
    pub async fn append(
        conn: &mut SqliteConnection,
        movement: &StockMovement<'_>,
    ) -> EngineResult<StockChangeLogEntry> {
        let sign_ok = if movement.action.is_outflow() {
            movement.quantity_change < Decimal::ZERO
        } else {
            movement.quantity_change > Decimal::ZERO
        };
        if !sign_ok {
            return Err(EngineError::validation(
                ErrorCode::InvalidStockQuantity,
                format!(
                    "{} cannot record a change of {}",
                    movement.action, movement.quantity_change
                ),
            ));
        }
        if movement.action.is_order_driven() != movement.order_id.is_some() {
            return Err(EngineError::validation(
                ErrorCode::InvalidRequest,
                format!(
                    "{} entries {} an order reference",
                    movement.action,
                    if movement.action.is_order_driven() {
                        "require"
                    } else {
                        "must not carry"
                    }
                ),
            ));
        }

        let entry = stock_log::insert(
            conn,
            &NewEntry {
                ingredient_id: movement.ingredient_id,
                order_id: movement.order_id,
                action: movement.action,
                quantity_change: quantity_to_f64(movement.quantity_change),
                resulting_level: quantity_to_f64(movement.resulting_level),
                staff_id: movement.staff_id,
                note: movement.note,
            },
        )
        .await?;

        tracing::debug!(
            entry_id = entry.id,
            ingredient_id = entry.ingredient_id,
            order_id = ?entry.order_id,
            action = %entry.action,
            quantity_change = entry.quantity_change,
            "Stock movement recorded"
        );
        Ok(entry)
    }

    /// Newest first, with the total number of matching entries
    pub async fn query(
        &self,
        query: &StockLogQuery,
    ) -> EngineResult<(Vec<StockChangeLogEntry>, i64)> {
        let mut query = query.clone();
        query.limit = query.limit.clamp(1, MAX_PAGE_SIZE);
        query.offset = query.offset.max(0);

        let mut conn = self.pool.acquire().await?;
        let entries = stock_log::find_many(&mut conn, &query).await?;
        let total = stock_log::count(&mut conn, &query).await?;
        Ok((entries, total))
    }

    /// Every ORDER_DEDUCT / ORDER_RESTORE entry of one order, oldest first
    pub async fn entries_for_order(&self, order_id: i64) -> EngineResult<Vec<StockChangeLogEntry>> {
        let mut conn = self.pool.acquire().await?;
        Ok(stock_log::find_order_movements(&mut conn, order_id).await?)
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
