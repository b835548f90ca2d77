//! Units of work and order row locks
//!
//! A unit of work is a sqlx transaction: every statement on it commits
//! together or not at all, and dropping it without `commit` rolls back.
//!
//! SQLite has no row-level locks. `lock_order` makes a write against the
//! order row its first statement, which acquires the database-wide RESERVED
//! lock. Any other writer (another transition on the same order, or on any
//! order) waits on `busy_timeout`, then either proceeds against the committed
//! state or fails as a concurrency conflict.

use super::repository::order;
use crate::core::{EngineError, EngineResult, Resource};
use shared::models::Order;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

/// An open unit of work
pub type UnitOfWork = Transaction<'static, Sqlite>;

#[derive(Clone)]
pub struct TransactionManager {
    pool: SqlitePool,
}

impl TransactionManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Begin a plain unit of work
    pub async fn begin(&self) -> EngineResult<UnitOfWork> {
        Ok(self.pool.begin().await?)
    }

    /// Begin a unit of work holding the lock on one order row.
    ///
    /// The returned order is read under the lock and is authoritative for
    /// the rest of the unit of work. Fails with `NotFound` if the order does
    /// not exist, or `Concurrency` if the lock is not granted in time.
    pub async fn lock_order(&self, order_id: i64) -> EngineResult<LockedOrder> {
        let mut tx = self.begin().await?;
        let order = order::lock(&mut tx, order_id)
            .await?
            .ok_or_else(|| EngineError::not_found(Resource::Order, order_id))?;
        tracing::debug!(order_id, status = %order.status, "Order row locked");
        Ok(LockedOrder { tx, order })
    }
}

/// A unit of work that owns the lock on one order row
///
/// The lock is released on `commit`, `rollback`, or drop (which rolls back).
pub struct LockedOrder {
    tx: UnitOfWork,
    order: Order,
}

impl LockedOrder {
    /// The order as read under the lock
    pub fn order(&self) -> &Order {
        &self.order
    }

    /// Connection of the unit of work, for repository calls
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    /// Split into the open unit of work and the locked order
    pub fn into_parts(self) -> (UnitOfWork, Order) {
        (self.tx, self.order)
    }

    pub async fn commit(self) -> EngineResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> EngineResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
