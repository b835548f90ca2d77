use crate::audit::{AuditLog, StockMovement};
use crate::core::{EngineError, EngineResult, Resource, StockShortfall};
use crate::db::TransactionManager;
use crate::db::repository::{ingredient, recipe, stock_log};
use crate::order_money::{quantity_to_f64, round_quantity, to_quantity};
use crate::utils::validation::{
    validate_ingredient_create, validate_ingredient_update, validate_stock_adjustment,
};
use rust_decimal::Decimal;
use shared::models::{
    Ingredient, IngredientCreate, IngredientUpdate, OrderLineItem, RecipeRequirement,
    StockAction, StockAdjustment, StockChangeLogEntry,
};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::{BTreeMap, HashMap};

/// Total quantity of one ingredient needed (or to be returned) by an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockRequirement {
    pub ingredient_id: i64,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDirection {
    Deduct,
    Restore,
}

impl StockDirection {
    pub fn action(self) -> StockAction {
        match self {
            StockDirection::Deduct => StockAction::OrderDeduct,
            StockDirection::Restore => StockAction::OrderRestore,
        }
    }
}

/// One applied stock change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedChange {
    pub ingredient_id: i64,
    /// Signed change that was applied
    pub quantity_change: Decimal,
    pub resulting_level: Decimal,
}

/// Ingredient stock levels
///
/// The associated functions (`validate`, `adjust`, ...) run inside the
/// caller's unit of work; the methods open their own.
#[derive(Clone)]
pub struct StockLedger {
    pool: SqlitePool,
    tx: TransactionManager,
}

impl StockLedger {
    pub fn new(pool: SqlitePool, tx: TransactionManager) -> Self {
        Self { pool, tx }
    }

    // ── Inside a unit of work ──────────────────────────────────────

    /// Aggregate recipe requirements across line items, per ingredient,
    /// in ascending ingredient id order. Items without a recipe contribute
    /// nothing.
    pub async fn requirements(
        conn: &mut SqliteConnection,
        items: &[OrderLineItem],
    ) -> EngineResult<Vec<StockRequirement>> {
        let mut menu_item_ids: Vec<i64> = items.iter().map(|i| i.menu_item_id).collect();
        menu_item_ids.sort_unstable();
        menu_item_ids.dedup();

        let recipes = recipe::find_by_menu_items(conn, &menu_item_ids).await?;
        let mut by_menu_item: HashMap<i64, Vec<&RecipeRequirement>> = HashMap::new();
        for req in &recipes {
            by_menu_item.entry(req.menu_item_id).or_default().push(req);
        }

        let mut totals: BTreeMap<i64, Decimal> = BTreeMap::new();
        for item in items {
            let Some(reqs) = by_menu_item.get(&item.menu_item_id) else {
                continue;
            };
            for req in reqs {
                *totals.entry(req.ingredient_id).or_default() +=
                    to_quantity(req.quantity_per_unit) * Decimal::from(item.quantity);
            }
        }

        Ok(totals
            .into_iter()
            .map(|(ingredient_id, quantity)| StockRequirement {
                ingredient_id,
                quantity: round_quantity(quantity),
            })
            .filter(|r| r.quantity > Decimal::ZERO)
            .collect())
    }

    /// Check that current stock covers the aggregated requirements of the
    /// line items. Returns the requirements on success, or the first short
    /// ingredient (by id) as `InsufficientStock`. Writes nothing.
    pub async fn validate(
        conn: &mut SqliteConnection,
        items: &[OrderLineItem],
    ) -> EngineResult<Vec<StockRequirement>> {
        let requirements = Self::requirements(conn, items).await?;
        for req in &requirements {
            let ing = ingredient::find_by_id(conn, req.ingredient_id)
                .await?
                .ok_or_else(|| EngineError::not_found(Resource::Ingredient, req.ingredient_id))?;
            let available = to_quantity(ing.stock_level);
            if req.quantity > available {
                return Err(EngineError::InsufficientStock(StockShortfall {
                    ingredient_id: ing.id,
                    ingredient_name: ing.name,
                    unit: ing.unit,
                    required: quantity_to_f64(req.quantity),
                    available: ing.stock_level,
                }));
            }
        }
        Ok(requirements)
    }

    /// Apply a set of requirements in one direction.
    ///
    /// Deducting must follow a successful [`validate`](Self::validate) in the
    /// same unit of work. A level that would go negative, or that changed
    /// underneath the update, fails the whole unit of work.
    pub async fn adjust(
        conn: &mut SqliteConnection,
        requirements: &[StockRequirement],
        direction: StockDirection,
    ) -> EngineResult<Vec<AppliedChange>> {
        let mut applied = Vec::with_capacity(requirements.len());
        for req in requirements {
            let delta = match direction {
                StockDirection::Deduct => -req.quantity,
                StockDirection::Restore => req.quantity,
            };
            applied.push(Self::apply_delta(conn, req.ingredient_id, delta).await?);
        }
        Ok(applied)
    }

    /// What an order still holds: net ORDER_DEDUCT minus ORDER_RESTORE per
    /// ingredient, from the log. Restoring exactly this is the inverse of the
    /// deduction, whatever the recipes look like now.
    pub async fn deducted_for_order(
        conn: &mut SqliteConnection,
        order_id: i64,
    ) -> EngineResult<Vec<StockRequirement>> {
        let entries = stock_log::find_order_movements(conn, order_id).await?;
        let mut held: BTreeMap<i64, Decimal> = BTreeMap::new();
        for entry in &entries {
            *held.entry(entry.ingredient_id).or_default() -= to_quantity(entry.quantity_change);
        }
        Ok(held
            .into_iter()
            .map(|(ingredient_id, quantity)| StockRequirement {
                ingredient_id,
                quantity: round_quantity(quantity),
            })
            .filter(|r| r.quantity > Decimal::ZERO)
            .collect())
    }

    async fn apply_delta(
        conn: &mut SqliteConnection,
        ingredient_id: i64,
        delta: Decimal,
    ) -> EngineResult<AppliedChange> {
        let ing = ingredient::find_by_id(conn, ingredient_id)
            .await?
            .ok_or_else(|| EngineError::not_found(Resource::Ingredient, ingredient_id))?;
        let current = to_quantity(ing.stock_level);
        let new_level = round_quantity(current + delta);
        if new_level < Decimal::ZERO {
            return Err(EngineError::InsufficientStock(StockShortfall {
                ingredient_id: ing.id,
                ingredient_name: ing.name,
                unit: ing.unit,
                required: quantity_to_f64(-delta),
                available: ing.stock_level,
            }));
        }

        let written = ingredient::compare_and_set_level(
            conn,
            ingredient_id,
            ing.stock_level,
            quantity_to_f64(new_level),
        )
        .await?;
        if !written {
            return Err(EngineError::Concurrency(format!(
                "stock level of ingredient {ingredient_id} changed during update"
            )));
        }

        Ok(AppliedChange {
            ingredient_id,
            quantity_change: delta,
            resulting_level: new_level,
        })
    }

    // ── Own unit of work ───────────────────────────────────────────

    /// Create an ingredient; opening stock is booked as a RESTOCK entry so
    /// the log replays to the stored level.
    pub async fn create_ingredient(
        &self,
        data: IngredientCreate,
        staff_id: i64,
    ) -> EngineResult<Ingredient> {
        validate_ingredient_create(&data)?;

        let mut tx = self.tx.begin().await?;
        let created = ingredient::insert(
            &mut tx,
            data.name.trim(),
            data.unit.trim(),
            quantity_to_f64(to_quantity(data.reorder_threshold)),
        )
        .await?;

        let opening = to_quantity(data.opening_stock);
        if opening > Decimal::ZERO {
            let applied = Self::apply_delta(&mut tx, created.id, opening).await?;
            AuditLog::append(
                &mut tx,
                &StockMovement {
                    ingredient_id: created.id,
                    order_id: None,
                    action: StockAction::Restock,
                    quantity_change: applied.quantity_change,
                    resulting_level: applied.resulting_level,
                    staff_id,
                    note: Some("opening stock"),
                },
            )
            .await?;
        }

        let created = ingredient::find_by_id(&mut tx, created.id)
            .await?
            .ok_or_else(|| EngineError::not_found(Resource::Ingredient, created.id))?;
        tx.commit().await?;

        tracing::info!(
            ingredient_id = created.id,
            name = %created.name,
            stock_level = created.stock_level,
            "Ingredient created"
        );
        Ok(created)
    }

    /// Rename, change the unit or tune the reorder threshold.
    ///
    /// Stock level is untouched; it only moves through logged adjustments.
    pub async fn update_ingredient(
        &self,
        id: i64,
        data: IngredientUpdate,
    ) -> EngineResult<Ingredient> {
        validate_ingredient_update(&data)?;

        let mut tx = self.tx.begin().await?;
        let updated = ingredient::update_details(
            &mut tx,
            id,
            data.name.as_deref().map(str::trim),
            data.unit.as_deref().map(str::trim),
            data.reorder_threshold
                .map(|t| quantity_to_f64(to_quantity(t))),
        )
        .await?
        .ok_or_else(|| EngineError::not_found(Resource::Ingredient, id))?;
        tx.commit().await?;

        tracing::info!(
            ingredient_id = id,
            name = %updated.name,
            unit = %updated.unit,
            reorder_threshold = updated.reorder_threshold,
            "Ingredient updated"
        );
        Ok(updated)
    }

    /// Restock or write off stock by hand
    pub async fn manual_adjust(&self, adj: StockAdjustment) -> EngineResult<StockChangeLogEntry> {
        validate_stock_adjustment(&adj)?;

        let mut tx = self.tx.begin().await?;
        ingredient::lock(&mut tx, adj.ingredient_id)
            .await?
            .ok_or_else(|| EngineError::not_found(Resource::Ingredient, adj.ingredient_id))?;

        let quantity = to_quantity(adj.quantity);
        let delta = if adj.action.is_outflow() {
            -quantity
        } else {
            quantity
        };
        let applied = Self::apply_delta(&mut tx, adj.ingredient_id, delta).await?;
        let entry = AuditLog::append(
            &mut tx,
            &StockMovement {
                ingredient_id: adj.ingredient_id,
                order_id: None,
                action: adj.action,
                quantity_change: applied.quantity_change,
                resulting_level: applied.resulting_level,
                staff_id: adj.staff_id,
                note: adj.note.as_deref(),
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            ingredient_id = adj.ingredient_id,
            action = %adj.action,
            quantity_change = entry.quantity_change,
            resulting_level = entry.resulting_level,
            staff_id = adj.staff_id,
            "Manual stock adjustment"
        );
        Ok(entry)
    }

    pub async fn get_ingredient(&self, id: i64) -> EngineResult<Ingredient> {
        let mut conn = self.pool.acquire().await?;
        ingredient::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| EngineError::not_found(Resource::Ingredient, id))
    }

    pub async fn list_ingredients(&self) -> EngineResult<Vec<Ingredient>> {
        let mut conn = self.pool.acquire().await?;
        Ok(ingredient::find_all(&mut conn).await?)
    }

    /// Ingredients at or below their reorder threshold, lowest first
    pub async fn low_stock(&self) -> EngineResult<Vec<Ingredient>> {
        let mut conn = self.pool.acquire().await?;
        Ok(ingredient::find_low_stock(&mut conn).await?)
    }
}
