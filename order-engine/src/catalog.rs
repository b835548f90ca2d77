//! Menu catalog and recipes
//!
//! The order engine only reads prices and recipes when it needs them; this
//! service is the write side used to seed and maintain them.

use crate::core::{EngineError, EngineResult, Resource};
use crate::db::TransactionManager;
use crate::db::repository::{catalog, ingredient, recipe};
use crate::order_money::{quantity_to_f64, to_quantity};
use crate::utils::validation::{
    MAX_PRICE, require_finite, validate_menu_item_create, validate_stock_quantity,
};
use rust_decimal::Decimal;
use shared::ErrorCode;
use shared::models::{MenuItem, MenuItemCreate, RecipeRequirement};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct CatalogService {
    pool: SqlitePool,
    tx: TransactionManager,
}

impl CatalogService {
    pub fn new(pool: SqlitePool, tx: TransactionManager) -> Self {
        Self { pool, tx }
    }

    pub async fn create_menu_item(&self, data: MenuItemCreate) -> EngineResult<MenuItem> {
        validate_menu_item_create(&data)?;
        let mut tx = self.tx.begin().await?;
        let item = catalog::create(&mut tx, &data).await?;
        tx.commit().await?;
        tracing::info!(
            menu_item_id = item.id,
            name = %item.name,
            price = item.price,
            "Menu item created"
        );
        Ok(item)
    }

    /// New orders pick up the new price; existing line items keep theirs
    pub async fn update_price(&self, id: i64, price: f64) -> EngineResult<()> {
        require_finite(price, "price", ErrorCode::ProductInvalidPrice)?;
        if !(0.0..=MAX_PRICE).contains(&price) {
            return Err(EngineError::validation(
                ErrorCode::ProductInvalidPrice,
                format!("price must be within 0..={MAX_PRICE}, got {price}"),
            ));
        }
        let mut tx = self.tx.begin().await?;
        if !catalog::update_price(&mut tx, id, price).await? {
            return Err(EngineError::not_found(Resource::MenuItem, id));
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn set_available(&self, id: i64, is_available: bool) -> EngineResult<()> {
        let mut tx = self.tx.begin().await?;
        if !catalog::set_available(&mut tx, id, is_available).await? {
            return Err(EngineError::not_found(Resource::MenuItem, id));
        }
        tx.commit().await?;
        Ok(())
    }

    /// Replace the recipe of a menu item with `(ingredient_id, quantity_per_unit)`
    /// pairs. Duplicate ingredients are summed.
    pub async fn set_recipe(
        &self,
        menu_item_id: i64,
        requirements: &[(i64, f64)],
    ) -> EngineResult<Vec<RecipeRequirement>> {
        let mut merged: Vec<(i64, Decimal)> = Vec::with_capacity(requirements.len());
        for (ingredient_id, quantity) in requirements {
            validate_stock_quantity(*quantity, "quantity_per_unit")?;
            match merged.iter_mut().find(|(id, _)| id == ingredient_id) {
                Some((_, total)) => *total += to_quantity(*quantity),
                None => merged.push((*ingredient_id, to_quantity(*quantity))),
            }
        }

        let mut tx = self.tx.begin().await?;
        if catalog::find_by_id(&mut tx, menu_item_id).await?.is_none() {
            return Err(EngineError::not_found(Resource::MenuItem, menu_item_id));
        }
        for (ingredient_id, _) in &merged {
            if ingredient::find_by_id(&mut tx, *ingredient_id)
                .await?
                .is_none()
            {
                return Err(EngineError::not_found(Resource::Ingredient, *ingredient_id));
            }
        }
        let rows: Vec<(i64, f64)> = merged
            .iter()
            .map(|(id, q)| (*id, quantity_to_f64(*q)))
            .collect();
        recipe::replace_for_menu_item(&mut tx, menu_item_id, &rows).await?;
        let stored = recipe::find_by_menu_item(&mut tx, menu_item_id).await?;
        tx.commit().await?;
        Ok(stored)
    }

    pub async fn get_menu_item(&self, id: i64) -> EngineResult<MenuItem> {
        let mut conn = self.pool.acquire().await?;
        catalog::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| EngineError::not_found(Resource::MenuItem, id))
    }

    pub async fn list_menu_items(&self) -> EngineResult<Vec<MenuItem>> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::find_all(&mut conn).await?)
    }

    pub async fn recipe_for(&self, menu_item_id: i64) -> EngineResult<Vec<RecipeRequirement>> {
        let mut conn = self.pool.acquire().await?;
        Ok(recipe::find_by_menu_item(&mut conn, menu_item_id).await?)
    }
}
