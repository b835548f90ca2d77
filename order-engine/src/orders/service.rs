use super::state::{StockEffect, TransitionPlan, plan_transition};
use crate::audit::{AuditLog, StockMovement};
use crate::core::{EngineError, EngineResult, Resource};
use crate::db::TransactionManager;
use crate::db::repository::order::{self, NewLineItem, NewOrder};
use crate::db::repository::{catalog, ingredient, payment};
use crate::inventory::{AppliedChange, StockDirection, StockLedger};
use crate::order_money::{FinancialCalculator, to_decimal, to_f64};
use crate::utils::validation::{validate_create_order, validate_payment};
use shared::OrderNotification;
use shared::models::{
    CreateOrderRequest, Order, OrderCreated, OrderDetail, OrderLineItem, OrderQuery, OrderStatus,
    Payment, PaymentCreate, PaymentStatus, TransitionOutcome, TransitionRequest,
};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Notification channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Maximum page size for order listings
const MAX_PAGE_SIZE: i64 = 200;

/// Order lifecycle orchestration
///
/// Every write runs as one unit of work: the order row, line items, stock
/// levels and stock log entries commit together or not at all. Notifications
/// go out only after commit.
#[derive(Clone)]
pub struct OrderService {
    pool: SqlitePool,
    tx: TransactionManager,
    calculator: FinancialCalculator,
    event_tx: broadcast::Sender<OrderNotification>,
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService")
            .field("calculator", &self.calculator)
            .field("event_tx", &"<broadcast::Sender>")
            .finish()
    }
}

impl OrderService {
    pub fn new(pool: SqlitePool, tx: TransactionManager, calculator: FinancialCalculator) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            pool,
            tx,
            calculator,
            event_tx,
        }
    }

    /// Subscribe to committed order changes (kitchen display, notifications)
    pub fn subscribe(&self) -> broadcast::Receiver<OrderNotification> {
        self.event_tx.subscribe()
    }

    fn publish(&self, notification: OrderNotification) {
        if self.event_tx.send(notification).is_err() {
            tracing::debug!("No notification subscribers");
        }
    }

    // ========== Create ==========

    /// Create a PENDING order with server-computed totals.
    ///
    /// Prices are re-read from the catalog; nothing the client sends about
    /// money is trusted. Stock is not touched until the order is accepted.
    pub async fn create_order(&self, req: CreateOrderRequest) -> EngineResult<OrderCreated> {
        validate_create_order(&req)?;

        let mut tx = self.tx.begin().await?;
        let order_id = order::insert(
            &mut tx,
            &NewOrder {
                customer_id: req.customer_id,
                kind: req.kind,
                destination: req.destination.trim(),
                instructions: req.instructions.as_deref(),
            },
        )
        .await?;

        let mut items = Vec::with_capacity(req.items.len());
        let mut line_subtotals = Vec::with_capacity(req.items.len());
        for line in &req.items {
            let menu_item = catalog::find_by_id(&mut tx, line.menu_item_id)
                .await?
                .filter(|m| m.is_available)
                .ok_or_else(|| EngineError::not_found(Resource::MenuItem, line.menu_item_id))?;
            let subtotal = self
                .calculator
                .line_subtotal(menu_item.price, line.quantity)?;
            let item = order::insert_item(
                &mut tx,
                order_id,
                &NewLineItem {
                    menu_item_id: menu_item.id,
                    name: &menu_item.name,
                    quantity: line.quantity,
                    unit_price: to_f64(to_decimal(menu_item.price)),
                    subtotal: to_f64(subtotal),
                    instructions: line.instructions.as_deref(),
                },
            )
            .await?;
            line_subtotals.push(subtotal);
            items.push(item);
        }

        let totals = self
            .calculator
            .compute_for_lines(line_subtotals)
            .to_totals();
        order::set_totals(&mut tx, order_id, &totals).await?;
        tx.commit().await?;

        tracing::info!(
            order_id,
            kind = req.kind.as_str(),
            destination = %req.destination.trim(),
            items = items.len(),
            grand_total = totals.grand_total,
            "Order created"
        );
        self.publish(OrderNotification::created(order_id, items));

        Ok(OrderCreated {
            order_id,
            grand_total: totals.grand_total,
            totals,
        })
    }

    // ========== Transition ==========

    /// Move an order to `target_status` under the order row lock.
    ///
    /// The current status is the one read under the lock. Accepting deducts
    /// recipe stock; cancelling an accepted, unpaid order returns exactly what
    /// was deducted. Any failure leaves status, stock and log untouched.
    pub async fn transition_status(
        &self,
        req: TransitionRequest,
    ) -> EngineResult<TransitionOutcome> {
        let locked = self.tx.lock_order(req.order_id).await?;
        let plan = match plan_transition(req.order_id, locked.order().status, req.target_status) {
            Ok(plan) => plan,
            Err(e) => {
                locked.rollback().await?;
                tracing::warn!(order_id = req.order_id, error = %e, "Transition rejected");
                return Err(e);
            }
        };

        let (mut tx, current) = locked.into_parts();
        let stock_entries = match self
            .apply_stock_effect(&mut tx, &current, &plan, req.staff_id)
            .await
        {
            Ok(n) => n,
            Err(e) => {
                // rollback also happens on drop; explicit here to release the lock early
                if let Err(rb) = tx.rollback().await {
                    tracing::error!(order_id = req.order_id, error = %rb, "Rollback failed");
                }
                tracing::warn!(
                    order_id = req.order_id,
                    from = %plan.from,
                    to = %plan.to,
                    error = %e,
                    "Transition failed, rolled back"
                );
                return Err(e);
            }
        };

        order::update_status(&mut tx, req.order_id, plan.to, req.staff_id).await?;
        let items = order::items_for_order(&mut tx, req.order_id).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = req.order_id,
            from = %plan.from,
            to = %plan.to,
            staff_id = req.staff_id,
            stock_entries,
            "Order status changed"
        );
        self.publish(OrderNotification::status_changed(
            req.order_id,
            plan.from,
            plan.to,
            items,
        ));

        Ok(TransitionOutcome {
            order_id: req.order_id,
            previous_status: plan.from,
            new_status: plan.to,
            stock_entries,
        })
    }

    /// Apply the plan's stock effect inside the locked unit of work.
    /// Returns the number of stock log entries written.
    async fn apply_stock_effect(
        &self,
        conn: &mut SqliteConnection,
        current: &Order,
        plan: &TransitionPlan,
        staff_id: i64,
    ) -> EngineResult<usize> {
        match plan.effect {
            StockEffect::None => Ok(0),
            StockEffect::Deduct => {
                let items = order::items_for_order(conn, current.id).await?;
                let requirements = StockLedger::validate(conn, &items).await?;
                let applied =
                    StockLedger::adjust(conn, &requirements, StockDirection::Deduct).await?;
                self.record_movements(conn, current.id, &applied, StockDirection::Deduct, staff_id)
                    .await
            }
            StockEffect::RestoreUnlessPaid => {
                if payment::has_paid(conn, current.id).await? {
                    tracing::warn!(
                        order_id = current.id,
                        from = %plan.from,
                        "Paid order cancelled, stock not restored"
                    );
                    return Ok(0);
                }
                let held = StockLedger::deducted_for_order(conn, current.id).await?;
                let applied = StockLedger::adjust(conn, &held, StockDirection::Restore).await?;
                self.record_movements(
                    conn,
                    current.id,
                    &applied,
                    StockDirection::Restore,
                    staff_id,
                )
                .await
            }
        }
    }

    async fn record_movements(
        &self,
        conn: &mut SqliteConnection,
        order_id: i64,
        applied: &[AppliedChange],
        direction: StockDirection,
        staff_id: i64,
    ) -> EngineResult<usize> {
        for change in applied {
            AuditLog::append(
                conn,
                &StockMovement {
                    ingredient_id: change.ingredient_id,
                    order_id: Some(order_id),
                    action: direction.action(),
                    quantity_change: change.quantity_change,
                    resulting_level: change.resulting_level,
                    staff_id,
                    note: None,
                },
            )
            .await?;
        }

        if direction == StockDirection::Deduct {
            for change in applied {
                if let Some(ing) = ingredient::find_by_id(conn, change.ingredient_id).await?
                    && ing.is_low_stock()
                {
                    tracing::warn!(
                        ingredient_id = ing.id,
                        name = %ing.name,
                        stock_level = ing.stock_level,
                        reorder_threshold = ing.reorder_threshold,
                        "Ingredient at or below reorder threshold"
                    );
                }
            }
        }
        Ok(applied.len())
    }

    // ========== Payments ==========

    /// Record a captured payment.
    ///
    /// Takes the order lock, so it linearizes with cancellation: a payment
    /// recorded before a cancel suppresses stock restoration; one recorded
    /// after a cancel never changes stock.
    pub async fn record_payment(&self, req: PaymentCreate) -> EngineResult<Payment> {
        validate_payment(&req)?;

        let mut locked = self.tx.lock_order(req.order_id).await?;
        let change_amount = req
            .tendered
            .map(|t| to_f64(to_decimal(t) - to_decimal(req.amount)))
            .unwrap_or(0.0);
        let status = locked.order().status;
        let recorded = payment::insert(
            locked.conn(),
            &payment::NewPayment {
                order_id: req.order_id,
                method: req.method.trim(),
                amount: to_f64(to_decimal(req.amount)),
                tendered: req.tendered.map(|t| to_f64(to_decimal(t))),
                change_amount,
                status: PaymentStatus::Paid,
            },
        )
        .await?;
        locked.commit().await?;

        if status == OrderStatus::Cancelled {
            tracing::warn!(
                order_id = req.order_id,
                payment_id = recorded.id,
                "Payment recorded for a cancelled order; stock is not affected"
            );
        } else {
            tracing::info!(
                order_id = req.order_id,
                payment_id = recorded.id,
                method = %recorded.method,
                amount = recorded.amount,
                "Payment recorded"
            );
        }
        Ok(recorded)
    }

    pub async fn payments_for_order(&self, order_id: i64) -> EngineResult<Vec<Payment>> {
        let mut conn = self.pool.acquire().await?;
        if order::find_by_id(&mut conn, order_id).await?.is_none() {
            return Err(EngineError::not_found(Resource::Order, order_id));
        }
        Ok(payment::find_by_order(&mut conn, order_id).await?)
    }

    // ========== Reads ==========

    pub async fn get_order(&self, order_id: i64) -> EngineResult<OrderDetail> {
        let mut conn = self.pool.acquire().await?;
        let order = order::find_by_id(&mut conn, order_id)
            .await?
            .ok_or_else(|| EngineError::not_found(Resource::Order, order_id))?;
        let items = order::items_for_order(&mut conn, order_id).await?;
        Ok(OrderDetail { order, items })
    }

    /// Newest first, filtered by customer and/or status
    pub async fn list_orders(&self, query: &OrderQuery) -> EngineResult<Vec<Order>> {
        let mut query = query.clone();
        query.limit = query.limit.clamp(1, MAX_PAGE_SIZE);
        query.offset = query.offset.max(0);

        let mut conn = self.pool.acquire().await?;
        Ok(order::find_many(&mut conn, &query).await?)
    }

    /// Active orders (PENDING, PREPARING, READY) with their items, oldest first
    pub async fn kitchen_queue(&self) -> EngineResult<Vec<OrderDetail>> {
        let mut tx = self.pool.begin().await?;
        let orders = order::find_active(&mut tx).await?;
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let items = order::items_for_orders(&mut tx, &ids).await?;
        tx.commit().await?;

        let mut by_order: HashMap<i64, Vec<OrderLineItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }
        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderDetail { order, items }
            })
            .collect())
    }
}
